// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::errors::SinkError;
use crate::seed::{Id, Record};
use crate::traits::DataSink;

/// A sink that accepts nothing: every insert is rejected, every select
/// returns no ids.
pub struct RejectingSink {
    pub reason: String,
}

impl RejectingSink {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl DataSink for RejectingSink {
    async fn insert_batch(&self, kind: &str, _records: Vec<Record>) -> Result<(), SinkError> {
        Err(SinkError::InsertRejected {
            kind: kind.to_string(),
            reason: self.reason.clone(),
        })
    }

    async fn select_ids(&self, _kind: &str) -> Result<Vec<Id>, SinkError> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "rejecting"
    }
}

/// A sink whose backing store is gone. Every call fails.
pub struct UnavailableSink;

#[async_trait]
impl DataSink for UnavailableSink {
    async fn insert_batch(&self, _kind: &str, _records: Vec<Record>) -> Result<(), SinkError> {
        Err(SinkError::Unavailable {
            reason: "connection refused".to_string(),
        })
    }

    async fn select_ids(&self, _kind: &str) -> Result<Vec<Id>, SinkError> {
        Err(SinkError::Unavailable {
            reason: "connection refused".to_string(),
        })
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
