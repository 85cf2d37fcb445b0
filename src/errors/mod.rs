// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod execution;
mod future;
mod sink;

pub use config::{ConfigError, ValidationError};
pub use execution::{
    AggregateError, FailureStrategy, GraphError, NodeError, PanicPolicy, TaskFailure,
};
pub use future::FutureError;
pub use sink::{SeedError, SinkError};
