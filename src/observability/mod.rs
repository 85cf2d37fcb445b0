// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging throughout seedgraph. Message types follow a struct-based pattern
//! with `Display` trait implementation to:
//!
//! * Eliminate magic strings scattered throughout the codebase
//! * Keep field names consistent between the human-readable text and structured fields
//! * Provide consistent, structured logging output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - Graph run lifecycle and per-node events
//! * `messages::task` - Task group join and panic events
//! * `messages::future` - One-shot future misuse diagnostics
//! * `messages::sink` - Data sink calls and retries
//! * `messages::validation` - Dependency graph validation errors
//!
//! # Usage
//!
//! ```rust
//! use seedgraph::observability::messages::engine::NodeFailed;
//! use seedgraph::observability::messages::StructuredLog;
//!
//! let error = std::io::Error::new(std::io::ErrorKind::Other, "test error");
//! let msg = NodeFailed {
//!     node_id: "orders",
//!     error: &error,
//! };
//!
//! msg.log();
//! ```

pub mod messages;
