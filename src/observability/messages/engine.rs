// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for graph run lifecycle and per-node events.
//!
//! This module contains message types for logging events related to:
//! * Graph run start, completion, and failure
//! * Nodes starting their unit of work
//! * Nodes skipping their work because a dependency was canceled
//! * Nodes failing and canceling the future they own

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Graph run started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use seedgraph::observability::messages::engine::GraphRunStarted;
///
/// let msg = GraphRunStarted {
///     node_count: 12,
///     strategy: "continue_independent",
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct GraphRunStarted<'a> {
    pub node_count: usize,
    pub strategy: &'a str,
}

impl Display for GraphRunStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Starting graph run: {} nodes, failure strategy {}",
            self.node_count, self.strategy
        )
    }
}

impl StructuredLog for GraphRunStarted<'_> {
    fn log(&self) {
        tracing::info!(
            node_count = self.node_count,
            strategy = self.strategy,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "graph_run",
            span_name = name,
            node_count = self.node_count,
            strategy = self.strategy,
        )
    }
}

/// Graph run completed with every node succeeding.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use seedgraph::observability::messages::engine::GraphRunCompleted;
/// use std::time::Duration;
///
/// let msg = GraphRunCompleted {
///     node_count: 12,
///     duration: Duration::from_millis(250),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct GraphRunCompleted {
    pub node_count: usize,
    pub duration: std::time::Duration,
}

impl Display for GraphRunCompleted {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Graph run completed: {} nodes in {:?}",
            self.node_count, self.duration
        )
    }
}

impl StructuredLog for GraphRunCompleted {
    fn log(&self) {
        tracing::info!(
            node_count = self.node_count,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "graph_run_completed",
            span_name = name,
            node_count = self.node_count,
            duration = ?self.duration,
        )
    }
}

/// Graph run finished with one or more failed nodes.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct GraphRunFailed<'a> {
    pub failed_count: usize,
    pub root_cause_count: usize,
    pub error: &'a dyn std::error::Error,
}

impl Display for GraphRunFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Graph run failed: {} nodes failed ({} root causes): {}",
            self.failed_count, self.root_cause_count, self.error
        )
    }
}

impl StructuredLog for GraphRunFailed<'_> {
    fn log(&self) {
        tracing::error!(
            failed_count = self.failed_count,
            root_cause_count = self.root_cause_count,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "graph_run_failed",
            span_name = name,
            failed_count = self.failed_count,
            root_cause_count = self.root_cause_count,
        )
    }
}

/// All dependencies of a node are available and its work is starting.
///
/// # Log Level
/// `debug!` - Per-node detail
pub struct NodeStarted<'a> {
    pub node_id: &'a str,
    pub dependency_count: usize,
}

impl Display for NodeStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' starting with {} dependencies resolved",
            self.node_id, self.dependency_count
        )
    }
}

impl StructuredLog for NodeStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            dependency_count = self.dependency_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "node",
            span_name = name,
            node_id = self.node_id,
            dependency_count = self.dependency_count,
        )
    }
}

/// Node finished its work and published (or had nothing to publish).
///
/// # Log Level
/// `debug!` - Per-node detail
pub struct NodeCompleted<'a> {
    pub node_id: &'a str,
    pub published: bool,
    pub duration: std::time::Duration,
}

impl Display for NodeCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' completed in {:?} (published={})",
            self.node_id, self.duration, self.published
        )
    }
}

impl StructuredLog for NodeCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            node_id = self.node_id,
            published = self.published,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "node_completed",
            span_name = name,
            node_id = self.node_id,
            published = self.published,
        )
    }
}

/// Node did not run because a dependency was canceled.
///
/// # Log Level
/// `warn!` - Degraded behavior caused elsewhere
///
/// # Example
/// ```
/// use seedgraph::observability::messages::engine::NodeSkipped;
///
/// let msg = NodeSkipped {
///     node_id: "orders",
///     dependency: "payments",
/// };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct NodeSkipped<'a> {
    pub node_id: &'a str,
    pub dependency: &'a str,
}

impl Display for NodeSkipped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Node '{}' skipped: dependency '{}' not available",
            self.node_id, self.dependency
        )
    }
}

impl StructuredLog for NodeSkipped<'_> {
    fn log(&self) {
        tracing::warn!(
            node_id = self.node_id,
            dependency = self.dependency,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "node_skipped",
            span_name = name,
            node_id = self.node_id,
            dependency = self.dependency,
        )
    }
}

/// Node's own unit of work failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct NodeFailed<'a> {
    pub node_id: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for NodeFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' failed: {}", self.node_id, self.error)
    }
}

impl StructuredLog for NodeFailed<'_> {
    fn log(&self) {
        tracing::error!(
            node_id = self.node_id,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "node_failed",
            span_name = name,
            node_id = self.node_id,
            error = %self.error,
        )
    }
}

/// Node stopped because the run was aborted.
pub struct NodeAborted<'a> {
    pub node_id: &'a str,
}

impl Display for NodeAborted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Node '{}' aborted", self.node_id)
    }
}

impl StructuredLog for NodeAborted<'_> {
    fn log(&self) {
        tracing::warn!(node_id = self.node_id, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("node_aborted", span_name = name, node_id = self.node_id)
    }
}
