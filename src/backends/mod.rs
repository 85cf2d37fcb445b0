// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Data sink implementations.
//!
//! ## Memory Backend
//! [`MemorySink`] keeps every kind in its own in-process table and assigns ids
//! sequentially. It backs the `seedgraph` binary and most tests, and supports
//! injecting insert and select failures per kind.
//!
//! ## Stub Backend (Test-Only)
//! - **RejectingSink**: rejects every batch
//! - **UnavailableSink**: fails every call as if the store were unreachable
//! - **Note**: NOT available in production builds

pub mod memory;
#[cfg(test)]
pub mod stub;

pub use memory::MemorySink;
