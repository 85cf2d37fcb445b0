//! Message types for data sink calls made from seeding nodes.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A batch of records was accepted by the sink.
///
/// # Log Level
/// `info!`
///
/// # Example
/// ```
/// use seedgraph::observability::messages::sink::BatchInserted;
///
/// let msg = BatchInserted {
///     kind: "users",
///     rows: 50_000,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct BatchInserted<'a> {
    pub kind: &'a str,
    pub rows: usize,
}

impl Display for BatchInserted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Inserted {} {}", self.rows, self.kind)
    }
}

impl StructuredLog for BatchInserted<'_> {
    fn log(&self) {
        tracing::info!(kind = self.kind, rows = self.rows, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("batch_inserted", span_name = name, kind = self.kind, rows = self.rows)
    }
}

/// Ids of a record kind were read back from the sink.
///
/// # Log Level
/// `debug!`
pub struct IdsSelected<'a> {
    pub kind: &'a str,
    pub count: usize,
}

impl Display for IdsSelected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Selected {} {} ids", self.count, self.kind)
    }
}

impl StructuredLog for IdsSelected<'_> {
    fn log(&self) {
        tracing::debug!(kind = self.kind, count = self.count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("ids_selected", span_name = name, kind = self.kind, count = self.count)
    }
}

/// An operation failed and will be attempted again.
///
/// # Log Level
/// `warn!`
pub struct RetryScheduled<'a> {
    pub operation: &'a str,
    pub attempt: u32,
    pub max_attempts: u32,
    pub error: &'a str,
}

impl Display for RetryScheduled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} failed on attempt {}/{}: {}",
            self.operation, self.attempt, self.max_attempts, self.error
        )
    }
}

impl StructuredLog for RetryScheduled<'_> {
    fn log(&self) {
        tracing::warn!(
            operation = self.operation,
            attempt = self.attempt,
            max_attempts = self.max_attempts,
            error = self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "retry",
            span_name = name,
            operation = self.operation,
            attempt = self.attempt,
        )
    }
}
