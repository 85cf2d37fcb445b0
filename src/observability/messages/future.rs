//! Message types for one-shot future diagnostics.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A second `resolve` or `cancel` hit a future that was already terminal.
///
/// # Log Level
/// `warn!` - Programming error, the first outcome is kept
///
/// # Example
/// ```
/// use seedgraph::observability::messages::future::FutureCompletedTwice;
///
/// let msg = FutureCompletedTwice {
///     name: "users",
///     attempted: "cancel",
///     state: "resolved",
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct FutureCompletedTwice<'a> {
    pub name: &'a str,
    pub attempted: &'a str,
    pub state: &'a str,
}

impl Display for FutureCompletedTwice<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Ignored {} on future '{}': already {}",
            self.attempted, self.name, self.state
        )
    }
}

impl StructuredLog for FutureCompletedTwice<'_> {
    fn log(&self) {
        tracing::warn!(
            future = self.name,
            attempted = self.attempted,
            state = self.state,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "future_completed_twice",
            span_name = name,
            future = self.name,
            attempted = self.attempted,
        )
    }
}

/// Producer handle dropped while still pending; readers see a cancellation.
///
/// # Log Level
/// `debug!`
pub struct FutureDroppedPending<'a> {
    pub name: &'a str,
}

impl Display for FutureDroppedPending<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Future '{}' dropped unresolved, canceling", self.name)
    }
}

impl StructuredLog for FutureDroppedPending<'_> {
    fn log(&self) {
        tracing::debug!(future = self.name, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("future_dropped", span_name = name, future = self.name)
    }
}
