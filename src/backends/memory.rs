// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use crate::errors::SinkError;
use crate::seed::{Id, Record};
use crate::traits::DataSink;

/// In-memory sink: one table per record kind, ids assigned sequentially
/// across the whole sink starting at 1.
///
/// Inserts are atomic. A rejected batch leaves no rows behind and consumes no
/// ids. Failures can be injected per kind, either permanently or for a fixed
/// number of calls.
///
/// # Example
/// ```
/// use seedgraph::backends::MemorySink;
/// use seedgraph::seed::Record;
/// use seedgraph::traits::DataSink;
///
/// # #[tokio::main]
/// # async fn main() {
/// let sink = MemorySink::new();
/// sink.insert_batch("users", vec![Record::new("users"), Record::new("users")])
///     .await
///     .unwrap();
///
/// assert_eq!(sink.select_ids("users").await.unwrap(), vec![1, 2]);
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MemorySink {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    last_id: Id,
    tables: HashMap<String, Vec<(Id, Record)>>,
    insert_faults: HashMap<String, Fault>,
    select_faults: HashMap<String, Fault>,
    insert_calls: usize,
}

#[derive(Debug, Clone, Copy)]
enum Fault {
    Always,
    Times(u32),
}

/// Consume one injected failure for `kind`, if any is armed.
fn trip(faults: &mut HashMap<String, Fault>, kind: &str) -> bool {
    match faults.get_mut(kind) {
        Some(Fault::Always) => true,
        Some(Fault::Times(remaining)) => {
            *remaining -= 1;
            if *remaining == 0 {
                faults.remove(kind);
            }
            true
        }
        None => false,
    }
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every insert of `kind` from now on.
    pub async fn fail_inserts(&self, kind: &str) {
        self.arm(kind, Fault::Always, true).await;
    }

    /// Reject the next `times` inserts of `kind`, then accept again.
    pub async fn fail_next_inserts(&self, kind: &str, times: u32) {
        if times > 0 {
            self.arm(kind, Fault::Times(times), true).await;
        }
    }

    /// Fail every id selection of `kind` from now on.
    pub async fn fail_selects(&self, kind: &str) {
        self.arm(kind, Fault::Always, false).await;
    }

    async fn arm(&self, kind: &str, fault: Fault, insert: bool) {
        let mut state = self.state.lock().await;
        let faults = if insert {
            &mut state.insert_faults
        } else {
            &mut state.select_faults
        };
        faults.insert(kind.to_string(), fault);
    }

    /// Stored rows of `kind` with their ids, in insertion order.
    pub async fn rows(&self, kind: &str) -> Vec<(Id, Record)> {
        let state = self.state.lock().await;
        state.tables.get(kind).cloned().unwrap_or_default()
    }

    pub async fn row_count(&self, kind: &str) -> usize {
        let state = self.state.lock().await;
        state.tables.get(kind).map_or(0, Vec::len)
    }

    /// Every kind that has at least one stored row, sorted.
    pub async fn kinds(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let mut kinds: Vec<String> = state
            .tables
            .iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(kind, _)| kind.clone())
            .collect();
        kinds.sort();
        kinds
    }

    /// Number of `insert_batch` calls received, including rejected ones.
    pub async fn insert_calls(&self) -> usize {
        self.state.lock().await.insert_calls
    }
}

#[async_trait]
impl DataSink for MemorySink {
    async fn insert_batch(&self, kind: &str, records: Vec<Record>) -> Result<(), SinkError> {
        let mut state = self.state.lock().await;
        state.insert_calls += 1;

        if trip(&mut state.insert_faults, kind) {
            return Err(SinkError::InsertRejected {
                kind: kind.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        if let Some(record) = records.iter().find(|record| record.kind() != kind) {
            return Err(SinkError::InsertRejected {
                kind: kind.to_string(),
                reason: format!("batch contains a '{}' record", record.kind()),
            });
        }

        let first_id = state.last_id + 1;
        state.last_id += records.len() as Id;

        let table = state.tables.entry(kind.to_string()).or_default();
        table.extend((first_id..).zip(records));
        Ok(())
    }

    async fn select_ids(&self, kind: &str) -> Result<Vec<Id>, SinkError> {
        let mut state = self.state.lock().await;

        if trip(&mut state.select_faults, kind) {
            return Err(SinkError::SelectFailed {
                kind: kind.to_string(),
                reason: "injected failure".to_string(),
            });
        }

        Ok(state
            .tables
            .get(kind)
            .map(|rows| rows.iter().map(|(id, _)| *id).collect())
            .unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
