// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod dependency_graph;
mod loader;
mod runtime;
mod validation;

pub mod consts;

pub use dependency_graph::DependencyGraph;
pub use loader::{
    load_and_validate_config, load_config, parse_config, validate_config, NodeConfig, PlanConfig,
    RetryConfig, RowCount, UniqueField,
};
pub use runtime::RuntimeBuilder;
pub use validation::{validate_dependency_graph, DependencySpec};
