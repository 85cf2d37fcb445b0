//! Message types for task group events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Joiner started draining a task group.
///
/// # Log Level
/// `debug!`
pub struct TaskGroupJoining {
    pub task_count: usize,
}

impl Display for TaskGroupJoining {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Waiting for {} tasks", self.task_count)
    }
}

impl StructuredLog for TaskGroupJoining {
    fn log(&self) {
        tracing::debug!(task_count = self.task_count, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("task_group", span_name = name, task_count = self.task_count)
    }
}

/// Every task in the group reached a terminal state.
///
/// # Log Level
/// `debug!` when nothing failed, `warn!` otherwise
pub struct TaskGroupJoined {
    pub task_count: usize,
    pub failed_count: usize,
}

impl Display for TaskGroupJoined {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Task group joined: {} tasks, {} failed",
            self.task_count, self.failed_count
        )
    }
}

impl StructuredLog for TaskGroupJoined {
    fn log(&self) {
        if self.failed_count == 0 {
            tracing::debug!(task_count = self.task_count, failed_count = 0, "{}", self);
        } else {
            tracing::warn!(
                task_count = self.task_count,
                failed_count = self.failed_count,
                "{}", self
            );
        }
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "task_group_joined",
            span_name = name,
            task_count = self.task_count,
            failed_count = self.failed_count,
        )
    }
}

/// A unit of work panicked.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use seedgraph::observability::messages::task::TaskPanicked;
///
/// let msg = TaskPanicked {
///     task: "users",
///     message: "index out of bounds",
///     isolated: true,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct TaskPanicked<'a> {
    pub task: &'a str,
    pub message: &'a str,
    pub isolated: bool,
}

impl Display for TaskPanicked<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let effect = if self.isolated {
            "recorded as a failure"
        } else {
            "group poisoned"
        };
        write!(f, "Task '{}' panicked ({}): {}", self.task, effect, self.message)
    }
}

impl StructuredLog for TaskPanicked<'_> {
    fn log(&self) {
        tracing::error!(
            task = self.task,
            panic_message = self.message,
            isolated = self.isolated,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "task_panicked",
            span_name = name,
            task = self.task,
            isolated = self.isolated,
        )
    }
}

/// A failure collected before a poisoned group resumes its panic.
///
/// # Log Level
/// `error!`
pub struct CollectedFailure<'a> {
    pub task: &'a str,
    pub error: &'a str,
}

impl Display for CollectedFailure<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Task '{}' failed before panic propagation: {}", self.task, self.error)
    }
}

impl StructuredLog for CollectedFailure<'_> {
    fn log(&self) {
        tracing::error!(task = self.task, error = self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!("collected_failure", span_name = name, task = self.task)
    }
}
