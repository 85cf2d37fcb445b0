// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use thiserror::Error;

/// Errors that can occur during dependency graph validation
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A circular dependency was detected in the node graph
    CyclicDependency {
        /// The cycle path showing the circular dependency
        cycle: Vec<String>,
    },
    /// A node references a dependency that doesn't exist
    UnresolvedDependency {
        /// The node that has the unresolved dependency
        node_id: String,
        /// The dependency that couldn't be resolved
        missing_dependency: String,
    },
    /// A node has a duplicate ID
    DuplicateNodeId {
        /// The duplicate node ID
        node_id: String,
    },
    /// A node depends on a node that never publishes a result
    UnpublishedDependency {
        node_id: String,
        dependency: String,
    },
    /// A node lists the same dependency twice
    DuplicateDependency {
        node_id: String,
        dependency: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::CyclicDependency { cycle } => {
                write!(f, "Cyclic dependency detected: {}", cycle.join(" -> "))
            }
            ValidationError::UnresolvedDependency {
                node_id,
                missing_dependency,
            } => {
                write!(
                    f,
                    "Node '{}' depends on '{}' which does not exist",
                    node_id, missing_dependency
                )
            }
            ValidationError::DuplicateNodeId { node_id } => {
                write!(f, "Duplicate node ID: '{}'", node_id)
            }
            ValidationError::UnpublishedDependency {
                node_id,
                dependency,
            } => {
                write!(
                    f,
                    "Node '{}' depends on '{}' which does not publish a result",
                    node_id, dependency
                )
            }
            ValidationError::DuplicateDependency {
                node_id,
                dependency,
            } => {
                write!(
                    f,
                    "Node '{}' lists dependency '{}' more than once",
                    node_id, dependency
                )
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Errors raised while loading a plan file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read plan '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse plan: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("node '{node_id}': {reason}")]
    InvalidNode { node_id: String, reason: String },

    #[error("Configuration validation failed:\n{}", join_lines(.0))]
    Validation(Vec<ValidationError>),
}

fn join_lines(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
