// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit the same event with typed `tracing` fields at
//! the level documented on the type.
//!
//! # Organization
//!
//! * `engine` - Graph run lifecycle and per-node events
//! * `task` - Task group join and panic events
//! * `future` - One-shot future misuse diagnostics
//! * `sink` - Data sink calls and retries
//! * `validation` - Dependency graph validation errors
//!
//! # Usage Pattern
//!
//! ```rust
//! use seedgraph::observability::messages::engine::GraphRunStarted;
//!
//! let msg = GraphRunStarted {
//!     node_count: 5,
//!     strategy: "continue_independent",
//! };
//!
//! tracing::info!("{}", msg);
//! ```

use tracing::Span;

pub mod engine;
pub mod future;
pub mod sink;
pub mod task;
pub mod validation;

/// Emit a message as a structured `tracing` event or open a span carrying
/// its fields.
pub trait StructuredLog {
    fn log(&self);

    fn span(&self, name: &str) -> Span;
}
