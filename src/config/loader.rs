// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{
    DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BACKOFF_MS, MAX_RETRY_ATTEMPTS, MAX_RETRY_BACKOFF_MS,
};
use crate::config::{validate_dependency_graph, DependencySpec};
use crate::errors::{ConfigError, FailureStrategy, PanicPolicy};
use crate::utils::RetryPolicy;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// A seeding plan: which record kinds to create, how many, and in what
/// dependency order.
///
/// # Fields
/// * `failure_strategy` - What a failing node does to the rest of the run (defaults to `continue_independent`)
/// * `panic_policy` - How a panicking node is reported (defaults to `propagate`)
/// * `retry` - Attempts and backoff for every sink call
/// * `nodes` - The graph itself
///
/// # Example
/// ```yaml
/// failure_strategy: continue_independent
/// retry:
///   attempts: 3
///   backoff_ms: 50
/// nodes:
///   - id: users
///     count: 100
///   - id: cards
///     per_parent: 2
///     depends_on: [users]
/// ```
#[derive(Debug, Deserialize)]
pub struct PlanConfig {
    #[serde(default)]
    pub failure_strategy: FailureStrategy,
    #[serde(default)]
    pub panic_policy: PanicPolicy,
    #[serde(default)]
    pub retry: RetryConfig,
    pub nodes: Vec<NodeConfig>,
}

impl PlanConfig {
    /// Whether any node reads the ids published by `node_id`.
    pub fn has_dependents(&self, node_id: &str) -> bool {
        self.nodes
            .iter()
            .any(|node| node.depends_on.iter().any(|dep| dep == node_id))
    }
}

/// Retry settings for sink calls. Missing values fall back to
/// [`crate::config::consts`].
#[derive(Debug, Default, Deserialize)]
pub struct RetryConfig {
    pub attempts: Option<u32>,
    pub backoff_ms: Option<u64>,
}

impl RetryConfig {
    /// Configured attempts clamped to `[1, MAX_RETRY_ATTEMPTS]`.
    pub fn get_attempts(&self) -> u32 {
        self.attempts
            .unwrap_or(DEFAULT_RETRY_ATTEMPTS)
            .clamp(1, MAX_RETRY_ATTEMPTS)
    }

    pub fn get_backoff(&self) -> Duration {
        let millis = self
            .backoff_ms
            .unwrap_or(DEFAULT_RETRY_BACKOFF_MS)
            .min(MAX_RETRY_BACKOFF_MS);
        Duration::from_millis(millis)
    }

    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.get_attempts(), self.get_backoff())
    }
}

/// One record kind to seed.
///
/// # Fields
/// * `id` - Unique identifier for this node
/// * `kind` - Record kind written to the sink (defaults to `id`)
/// * `count` - Fixed number of records
/// * `per_parent` - Records per id published by the first dependency
/// * `depends_on` - Nodes whose ids these records reference
/// * `unique_field` - A field whose values are drawn without repetition from a fixed list
///
/// Exactly one of `count` and `per_parent` must be given.
///
/// # Example
/// ```yaml
/// id: dishes
/// per_parent: 3
/// depends_on: [suppliers]
/// unique_field:
///   name: name
///   values: [borscht, pelmeni, olivier]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    pub id: String,
    pub kind: Option<String>,
    pub count: Option<usize>,
    pub per_parent: Option<usize>,
    #[serde(default)]
    pub depends_on: Vec<String>,
    pub unique_field: Option<UniqueField>,
}

/// Field whose values must not repeat within one node's records.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UniqueField {
    pub name: String,
    pub values: Vec<String>,
}

/// How many records a node creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowCount {
    Fixed(usize),
    PerParent(usize),
}

impl RowCount {
    /// Total rows given the number of ids published by the first dependency.
    pub fn resolve(self, parents: usize) -> usize {
        match self {
            RowCount::Fixed(count) => count,
            RowCount::PerParent(per_parent) => per_parent.saturating_mul(parents),
        }
    }
}

impl NodeConfig {
    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or(&self.id)
    }

    /// Checks that only need this node's own declaration.
    pub fn check(&self) -> Result<RowCount, ConfigError> {
        let rows = match (self.count, self.per_parent) {
            (Some(count), None) => RowCount::Fixed(count),
            (None, Some(_)) if self.depends_on.is_empty() => {
                return Err(self.invalid("per_parent requires at least one dependency"));
            }
            (None, Some(per_parent)) => RowCount::PerParent(per_parent),
            (Some(_), Some(_)) => {
                return Err(self.invalid("count and per_parent are mutually exclusive"));
            }
            (None, None) => return Err(self.invalid("one of count or per_parent is required")),
        };

        if let Some(unique) = &self.unique_field {
            let distinct: HashSet<&String> = unique.values.iter().collect();
            if distinct.len() != unique.values.len() {
                return Err(self.invalid(&format!(
                    "unique_field '{}' lists the same value more than once",
                    unique.name
                )));
            }
            if let RowCount::Fixed(count) = rows {
                if count > distinct.len() {
                    return Err(self.invalid(&format!(
                        "unique_field '{}' has {} values for {} records",
                        unique.name,
                        distinct.len(),
                        count
                    )));
                }
            }
        }

        Ok(rows)
    }

    fn invalid(&self, reason: &str) -> ConfigError {
        ConfigError::InvalidNode {
            node_id: self.id.clone(),
            reason: reason.to_string(),
        }
    }
}

impl DependencySpec for NodeConfig {
    fn node_id(&self) -> &str {
        &self.id
    }

    fn dependencies(&self) -> &[String] {
        &self.depends_on
    }
}

/// Parse a plan from YAML text.
pub fn parse_config(content: &str) -> Result<PlanConfig, ConfigError> {
    Ok(serde_yaml::from_str(content)?)
}

/// Load a plan from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PlanConfig, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&content)
}

/// Load a plan and check every node and the dependency graph.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<PlanConfig, ConfigError> {
    let cfg = load_config(path)?;
    validate_config(&cfg)?;
    Ok(cfg)
}

pub fn validate_config(cfg: &PlanConfig) -> Result<(), ConfigError> {
    for node in &cfg.nodes {
        node.check()?;
    }
    validate_dependency_graph(&cfg.nodes).map_err(ConfigError::Validation)
}
