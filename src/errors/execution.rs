// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

use crate::errors::{FutureError, ValidationError};

/// How a failing node affects the rest of the graph.
///
/// # Variants
/// * `ContinueIndependent` - A failing node cancels only the future it owns.
///   Its dependents fail fast, unrelated branches keep running to their own
///   completion or failure, and every failure is reported together at the end.
/// * `AbortAll` - The first failure also trips a graph-wide cancellation token.
///   Nodes still waiting on dependencies, or not yet started, stop with
///   [`NodeError::Aborted`]. Work already in flight is allowed to finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStrategy {
    #[default]
    ContinueIndependent,
    AbortAll,
}

/// What a [`crate::engine::TaskGroup`] does when one of its units panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanicPolicy {
    /// Drain every other unit, log what was collected, then resume the first
    /// panic on the joining task. The whole group is poisoned.
    #[default]
    Propagate,
    /// Record the panic as a [`TaskFailure::Panicked`] entry and keep going.
    Isolate,
}

/// Terminal failure of a single unit registered with a task group.
#[derive(Error, Debug)]
pub enum TaskFailure<E> {
    #[error("{task}: {source}")]
    Failed { task: String, source: E },

    #[error("{task}: panicked: {message}")]
    Panicked { task: String, message: String },

    /// The runtime dropped the task before it finished (runtime shutdown).
    #[error("{task}: cancelled by the runtime")]
    Cancelled { task: String },
}

impl<E> TaskFailure<E> {
    pub fn task(&self) -> &str {
        match self {
            TaskFailure::Failed { task, .. }
            | TaskFailure::Panicked { task, .. }
            | TaskFailure::Cancelled { task } => task,
        }
    }

    /// The error returned by the unit itself, if it returned one.
    pub fn error(&self) -> Option<&E> {
        match self {
            TaskFailure::Failed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Every failure collected by a task group, in registration order.
///
/// Nothing is dropped: a group where three units failed yields an aggregate
/// of length three whose `Display` lists all of them.
#[derive(Debug)]
pub struct AggregateError<E> {
    failures: Vec<TaskFailure<E>>,
}

impl<E> AggregateError<E> {
    pub(crate) fn new(failures: Vec<TaskFailure<E>>) -> Self {
        Self { failures }
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[TaskFailure<E>] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<TaskFailure<E>> {
        self.failures
    }

    pub fn iter(&self) -> impl Iterator<Item = &TaskFailure<E>> {
        self.failures.iter()
    }

    /// Errors returned by units, skipping panics and runtime cancellations.
    pub fn errors(&self) -> impl Iterator<Item = &E> {
        self.failures.iter().filter_map(TaskFailure::error)
    }

    pub fn contains_task(&self, task: &str) -> bool {
        self.failures.iter().any(|f| f.task() == task)
    }
}

impl<E> AggregateError<NodeError<E>> {
    /// Failures that originated in a node, as opposed to a node giving up
    /// because something upstream (or elsewhere, under `AbortAll`) failed.
    pub fn root_causes(&self) -> impl Iterator<Item = &TaskFailure<NodeError<E>>> {
        self.failures
            .iter()
            .filter(|f| !f.error().is_some_and(NodeError::is_consequential))
    }
}

impl<E: fmt::Display> fmt::Display for AggregateError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let noun = if self.failures.len() == 1 { "task" } else { "tasks" };
        write!(f, "{} {} failed:", self.failures.len(), noun)?;
        for failure in &self.failures {
            write!(f, "\n  - {}", failure)?;
        }
        Ok(())
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for AggregateError<E> {}

/// Terminal error of one node in a dependency graph run.
#[derive(Error, Debug)]
pub enum NodeError<E> {
    /// An upstream future was canceled, so the node never ran its work.
    #[error("node '{node}': dependency '{dependency}' not available")]
    DependencyUnavailable {
        node: String,
        dependency: String,
        source: FutureError,
    },

    /// The node's own unit of work failed.
    #[error("node '{node}': {source}")]
    Work { node: String, source: E },

    /// Stopped because another node failed under `FailureStrategy::AbortAll`.
    #[error("node '{node}': aborted after a failure elsewhere in the graph")]
    Aborted { node: String },

    #[error("node '{node}': could not publish result: {source}")]
    Publish { node: String, source: FutureError },
}

impl<E> NodeError<E> {
    pub fn node(&self) -> &str {
        match self {
            NodeError::DependencyUnavailable { node, .. }
            | NodeError::Work { node, .. }
            | NodeError::Aborted { node }
            | NodeError::Publish { node, .. } => node,
        }
    }

    /// True when this error only reports the fallout of another failure.
    pub fn is_consequential(&self) -> bool {
        matches!(
            self,
            NodeError::DependencyUnavailable { .. } | NodeError::Aborted { .. }
        )
    }
}

/// Result of running a whole dependency graph.
#[derive(Debug)]
pub enum GraphError<E> {
    /// The graph was rejected before any task started.
    Invalid(Vec<ValidationError>),
    /// At least one node failed; every node's failure is included.
    Failed(AggregateError<NodeError<E>>),
}

impl<E> GraphError<E> {
    pub fn aggregate(&self) -> Option<&AggregateError<NodeError<E>>> {
        match self {
            GraphError::Failed(aggregate) => Some(aggregate),
            GraphError::Invalid(_) => None,
        }
    }

    pub fn validation_errors(&self) -> Option<&[ValidationError]> {
        match self {
            GraphError::Invalid(errors) => Some(errors),
            GraphError::Failed(_) => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for GraphError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::Invalid(errors) => {
                write!(f, "invalid dependency graph:")?;
                for error in errors {
                    write!(f, "\n  - {}", error)?;
                }
                Ok(())
            }
            GraphError::Failed(aggregate) => write!(f, "graph run failed: {}", aggregate),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for GraphError<E> {}
