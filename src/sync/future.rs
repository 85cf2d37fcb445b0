// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! One-shot future: written at most once by a single producer, read by any
//! number of consumer tasks.
//!
//! The producer side is [`OneShotFuture`], which is deliberately not `Clone`.
//! Consumers get a [`FutureReader`] through [`OneShotFuture::reader`] and can
//! only wait on it. State lives in a `tokio::sync::watch` channel, so every
//! waiter is woken by the single transition out of [`FutureState::Pending`]
//! and late readers observe the terminal state immediately.
//!
//! # Example
//! ```
//! use seedgraph::sync::OneShotFuture;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let users = OneShotFuture::new("users");
//! let reader = users.reader();
//!
//! let consumer = tokio::spawn(async move { reader.get().await });
//! users.resolve(vec![1, 2, 3]).unwrap();
//!
//! assert_eq!(consumer.await.unwrap().unwrap(), vec![1, 2, 3]);
//! # }
//! ```

use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

use crate::errors::FutureError;
use crate::observability::messages::future::{FutureCompletedTwice, FutureDroppedPending};
use crate::observability::messages::StructuredLog;

/// Lifecycle of a one-shot future. Exactly one transition out of `Pending`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FutureState<T> {
    Pending,
    Resolved(T),
    Canceled,
}

impl<T> FutureState<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, FutureState::Pending)
    }

    pub fn label(&self) -> &'static str {
        match self {
            FutureState::Pending => "pending",
            FutureState::Resolved(_) => "resolved",
            FutureState::Canceled => "canceled",
        }
    }
}

/// Producer handle of a one-shot future.
///
/// `resolve` and `cancel` are mutually exclusive and may succeed at most once
/// in total; any later attempt is rejected with
/// [`FutureError::AlreadyCompleted`], logged, and leaves the first outcome in
/// place. Dropping the handle while still pending cancels the future, so a
/// producer that panics or returns early never strands its readers.
pub struct OneShotFuture<T> {
    name: Arc<str>,
    tx: watch::Sender<FutureState<T>>,
    rx: watch::Receiver<FutureState<T>>,
}

impl<T> OneShotFuture<T> {
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, rx) = watch::channel(FutureState::Pending);
        Self {
            name: Arc::from(name.into()),
            tx,
            rx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create a read-only handle. Readers may be created before or after
    /// the future completes.
    pub fn reader(&self) -> FutureReader<T> {
        FutureReader {
            name: Arc::clone(&self.name),
            rx: self.rx.clone(),
        }
    }

    /// Store `value` and wake every reader.
    pub fn resolve(&self, value: T) -> Result<(), FutureError> {
        self.complete(FutureState::Resolved(value), "resolve")
    }

    /// Mark the future canceled and wake every reader with
    /// [`FutureError::Canceled`].
    pub fn cancel(&self) -> Result<(), FutureError> {
        self.complete(FutureState::Canceled, "cancel")
    }

    pub fn is_terminal(&self) -> bool {
        !self.tx.borrow().is_pending()
    }

    fn complete(&self, next: FutureState<T>, attempted: &'static str) -> Result<(), FutureError> {
        let mut next = Some(next);
        let mut state = "pending";

        let applied = self.tx.send_if_modified(|current| {
            if current.is_pending() {
                if let Some(next) = next.take() {
                    *current = next;
                    return true;
                }
            }
            state = current.label();
            false
        });

        if applied {
            return Ok(());
        }

        FutureCompletedTwice {
            name: &self.name,
            attempted,
            state,
        }
        .log();

        Err(FutureError::AlreadyCompleted {
            name: self.name.to_string(),
            attempted,
            state,
        })
    }
}

impl<T> Drop for OneShotFuture<T> {
    fn drop(&mut self) {
        let canceled = self.tx.send_if_modified(|current| {
            if current.is_pending() {
                *current = FutureState::Canceled;
                true
            } else {
                false
            }
        });

        if canceled {
            FutureDroppedPending { name: &self.name }.log();
        }
    }
}

impl<T> fmt::Debug for OneShotFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OneShotFuture")
            .field("name", &self.name)
            .field("state", &self.tx.borrow().label())
            .finish()
    }
}

/// Consumer handle of a one-shot future. Cheap to clone; cannot write.
pub struct FutureReader<T> {
    name: Arc<str>,
    rx: watch::Receiver<FutureState<T>>,
}

impl<T> FutureReader<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_terminal(&self) -> bool {
        !self.rx.borrow().is_pending()
    }
}

impl<T: Clone> FutureReader<T> {
    /// Suspend until the producer resolves or cancels.
    ///
    /// Every reader, whether it started waiting before or after the
    /// transition, observes the same outcome. There is no timeout; wrap the
    /// call in `tokio::time::timeout` or a `select!` if one is needed.
    pub async fn get(&self) -> Result<T, FutureError> {
        let mut rx = self.rx.clone();
        let waited = rx.wait_for(|state| !state.is_pending()).await;

        match waited {
            Ok(state) => match &*state {
                FutureState::Resolved(value) => Ok(value.clone()),
                _ => Err(FutureError::Canceled),
            },
            // The producer handle is gone; its Drop already canceled.
            Err(_) => Err(FutureError::Canceled),
        }
    }

    /// Non-suspending variant of [`get`](Self::get): `None` while pending.
    pub fn try_get(&self) -> Option<Result<T, FutureError>> {
        match &*self.rx.borrow() {
            FutureState::Pending => None,
            FutureState::Resolved(value) => Some(Ok(value.clone())),
            FutureState::Canceled => Some(Err(FutureError::Canceled)),
        }
    }

    pub fn state(&self) -> FutureState<T> {
        self.rx.borrow().clone()
    }
}

impl<T> Clone for FutureReader<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            rx: self.rx.clone(),
        }
    }
}

impl<T> fmt::Debug for FutureReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FutureReader")
            .field("name", &self.name)
            .field("state", &self.rx.borrow().label())
            .finish()
    }
}
