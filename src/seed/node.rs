// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use crate::config::{NodeConfig, RowCount};
use crate::engine::{Dependencies, Node};
use crate::errors::{ConfigError, SeedError};
use crate::observability::messages::sink::{BatchInserted, IdsSelected};
use crate::observability::messages::StructuredLog;
use crate::seed::{Ids, RecordFactory};
use crate::traits::DataSink;
use crate::utils::{with_retries, RetryPolicy};

/// Turn one plan node into an executable graph node.
///
/// The node's work reads the ids published by its dependencies, builds its
/// records, and inserts them as one batch. When `publishes` is set it then
/// selects the stored ids of its kind and publishes them; otherwise it is a
/// leaf and publishes nothing. Every sink call goes through `retry`.
pub fn seed_node(
    config: &NodeConfig,
    sink: Arc<dyn DataSink>,
    retry: RetryPolicy,
    publishes: bool,
) -> Result<Node<Ids, SeedError>, ConfigError> {
    let rows = config.check()?;
    let id = config.id.clone();
    let depends_on = config.depends_on.clone();
    let config = config.clone();

    let node = if publishes {
        Node::producer(id, move |deps| async move {
            insert_records(&config, rows, deps, sink.as_ref(), retry).await?;
            select_published(config.kind(), sink.as_ref(), retry).await
        })
    } else {
        Node::consumer(id, move |deps| async move {
            insert_records(&config, rows, deps, sink.as_ref(), retry).await
        })
    };

    Ok(node.depends_on(depends_on))
}

async fn insert_records(
    config: &NodeConfig,
    rows: RowCount,
    mut deps: Dependencies<Ids>,
    sink: &dyn DataSink,
    retry: RetryPolicy,
) -> Result<(), SeedError> {
    let kind = config.kind();

    let mut factory = RecordFactory::new(kind);
    for dependency in &config.depends_on {
        let ids = deps.take(dependency).ok_or_else(|| SeedError::NoReferences {
            kind: kind.to_string(),
            dependency: dependency.clone(),
        })?;
        factory = factory.with_reference(dependency.as_str(), ids);
    }
    if let Some(unique) = &config.unique_field {
        factory = factory.with_unique_field(unique);
    }

    let records = factory.build(rows)?;
    let row_count = records.len();

    let operation = format!("insert {kind}");
    with_retries(&operation, retry, || sink.insert_batch(kind, records.clone())).await?;

    BatchInserted {
        kind,
        rows: row_count,
    }
    .log();
    Ok(())
}

async fn select_published(kind: &str, sink: &dyn DataSink, retry: RetryPolicy) -> Result<Ids, SeedError> {
    let operation = format!("select {kind} ids");
    let ids = with_retries(&operation, retry, || sink.select_ids(kind)).await?;

    IdsSelected {
        kind,
        count: ids.len(),
    }
    .log();
    Ok(Arc::new(ids))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemorySink;
    use crate::config::DependencySpec;
    use std::time::Duration;

    fn node_config(yaml: &str) -> NodeConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_invalid_node_is_rejected_before_running() {
        let sink: Arc<dyn DataSink> = Arc::new(MemorySink::new());
        let result = seed_node(&node_config("id: users"), sink, RetryPolicy::none(), true);

        assert!(matches!(result, Err(ConfigError::InvalidNode { .. })));
    }

    #[test]
    fn test_publishing_follows_flag() {
        let sink: Arc<dyn DataSink> = Arc::new(MemorySink::new());
        let config = node_config("id: cards\nper_parent: 2\ndepends_on: [users]");

        let producer = seed_node(&config, Arc::clone(&sink), RetryPolicy::none(), true).unwrap();
        let leaf = seed_node(&config, sink, RetryPolicy::none(), false).unwrap();

        assert!(producer.publishes());
        assert!(!leaf.publishes());
        assert_eq!(producer.dependencies(), &["users".to_string()]);
    }

    #[tokio::test]
    async fn test_transient_insert_failure_is_retried() {
        let memory = Arc::new(MemorySink::new());
        memory.fail_next_inserts("couriers", 2).await;

        let sink: Arc<dyn DataSink> = memory.clone();
        let config = node_config("id: couriers\ncount: 4");
        let result = insert_records(
            &config,
            RowCount::Fixed(4),
            Dependencies::from_iter(Vec::new()),
            sink.as_ref(),
            RetryPolicy::new(3, Duration::ZERO),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(memory.row_count("couriers").await, 4);
    }
}
