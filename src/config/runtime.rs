// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::config::PlanConfig;
use crate::engine::GraphExecutor;
use crate::errors::{ConfigError, SeedError};
use crate::seed::{seed_node, Ids};
use crate::traits::DataSink;

/// Seeding runtime builder: turns a plan into a ready-to-run executor bound
/// to one sink.
///
/// # Examples
///
/// ```
/// use seedgraph::backends::MemorySink;
/// use seedgraph::config::{parse_config, RuntimeBuilder};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let plan = parse_config("nodes:\n  - id: users\n    count: 3\n").unwrap();
/// let sink = Arc::new(MemorySink::new());
///
/// let executor = RuntimeBuilder::from_config(&plan, sink.clone()).unwrap();
/// executor.run().await.unwrap();
///
/// assert_eq!(sink.row_count("users").await, 3);
/// # }
/// ```
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build one seeding node per plan node. A node publishes its ids only
    /// when some other node depends on it.
    ///
    /// The graph itself is validated when the executor runs.
    pub fn from_config(
        cfg: &PlanConfig,
        sink: Arc<dyn DataSink>,
    ) -> Result<GraphExecutor<Ids, SeedError>, ConfigError> {
        let retry = cfg.retry.policy();

        let mut executor = GraphExecutor::new()
            .with_failure_strategy(cfg.failure_strategy)
            .with_panic_policy(cfg.panic_policy);

        for node in &cfg.nodes {
            let publishes = cfg.has_dependents(&node.id);
            executor.add_node(seed_node(node, Arc::clone(&sink), retry, publishes)?);
        }

        Ok(executor)
    }
}
