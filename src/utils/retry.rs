// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Caller-side retries for calls to external collaborators.
//!
//! The core primitives never retry anything. Seeding nodes wrap their sink
//! calls in [`with_retries`] so a transient failure does not cancel a whole
//! branch of the graph.

use std::future::Future;
use std::time::Duration;

use crate::config::consts::{DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BACKOFF_MS};
use crate::observability::messages::sink::RetryScheduled;
use crate::observability::messages::StructuredLog;

/// How many times to try an operation and how long to pause in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first try included. Never less than one.
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// A single attempt with no pause.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_RETRY_ATTEMPTS,
            Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS),
        )
    }
}

/// Run `operation` until it succeeds or `policy.attempts` is used up.
///
/// `operation` is called again for every attempt. The error of the last
/// attempt is returned unchanged.
///
/// # Example
/// ```
/// use seedgraph::utils::{with_retries, RetryPolicy};
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
///
/// # #[tokio::main]
/// # async fn main() {
/// let calls = AtomicU32::new(0);
/// let policy = RetryPolicy::new(3, Duration::ZERO);
///
/// let result: Result<u32, String> = with_retries("select users", policy, || async {
///     match calls.fetch_add(1, Ordering::SeqCst) {
///         0 => Err("connection reset".to_string()),
///         n => Ok(n),
///     }
/// })
/// .await;
///
/// assert_eq!(result, Ok(1));
/// # }
/// ```
pub async fn with_retries<T, E, F, Fut>(operation: &str, policy: RetryPolicy, mut call: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let max_attempts = policy.attempts.max(1);
    let mut attempt = 1;

    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < max_attempts => {
                RetryScheduled {
                    operation,
                    attempt,
                    max_attempts,
                    error: &error.to_string(),
                }
                .log();

                if !policy.backoff.is_zero() {
                    tokio::time::sleep(policy.backoff).await;
                }
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
