use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

use crate::engine::{GraphExecutor, Node};
use crate::errors::{FailureStrategy, GraphError, NodeError, PanicPolicy, TaskFailure, ValidationError};

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
struct StepError(String);

fn step_error(message: &str) -> StepError {
    StepError(message.to_string())
}

/// Integration tests for the graph executor using counting and failing nodes
#[cfg(test)]
mod tests {
    use super::*;

    fn counter() -> Arc<AtomicUsize> {
        Arc::new(AtomicUsize::new(0))
    }

    fn failed_graph<V>(result: Result<V, GraphError<StepError>>) -> crate::errors::AggregateError<NodeError<StepError>> {
        match result {
            Err(GraphError::Failed(aggregate)) => aggregate,
            Err(GraphError::Invalid(errors)) => panic!("graph rejected: {errors:?}"),
            Ok(_) => panic!("graph unexpectedly succeeded"),
        }
    }

    #[tokio::test]
    async fn test_failed_branch_never_runs_downstream() {
        // a publishes 5, b fails, c needs both
        let c_runs = counter();

        let c_counter = Arc::clone(&c_runs);
        let result = GraphExecutor::<i32, StepError>::new()
            .node(Node::producer("a", |_| async { Ok(5) }))
            .node(Node::producer("b", |_| async { Err(step_error("b broke")) }))
            .node(
                Node::consumer("c", move |_| async move {
                    c_counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .depends_on(["a", "b"]),
            )
            .run()
            .await;

        let aggregate = failed_graph(result);
        assert_eq!(c_runs.load(Ordering::SeqCst), 0);
        assert_eq!(aggregate.len(), 2);

        let roots: Vec<_> = aggregate.root_causes().collect();
        assert_eq!(roots.len(), 1);
        assert!(matches!(
            roots[0],
            TaskFailure::Failed {
                task,
                source: NodeError::Work { source, .. },
            } if task == "b" && source == &step_error("b broke")
        ));

        let c_error = aggregate
            .errors()
            .find(|e| e.node() == "c")
            .expect("c should report its missing dependency");
        assert!(matches!(
            c_error,
            NodeError::DependencyUnavailable { dependency, .. } if dependency == "b"
        ));
    }

    #[tokio::test]
    async fn test_cancellation_propagates_transitively() {
        let downstream_runs = counter();

        let mut executor = GraphExecutor::<u32, StepError>::new()
            .node(Node::producer("users", |_| async { Err(step_error("insert users failed")) }));
        for (id, dep) in [("cards", "users"), ("payments", "cards"), ("orders", "payments")] {
            let runs = Arc::clone(&downstream_runs);
            executor.add_node(
                Node::producer(id, move |_| async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(1)
                })
                .depends_on([dep]),
            );
        }

        let aggregate = failed_graph(executor.run().await);

        assert_eq!(downstream_runs.load(Ordering::SeqCst), 0);
        assert_eq!(aggregate.len(), 4);
        assert_eq!(aggregate.root_causes().count(), 1);
        assert!(aggregate.contains_task("orders"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_ten_thousand_node_chain_preserves_order() {
        const CHAIN: usize = 10_000;
        let completions = Arc::new(Mutex::new(Vec::with_capacity(CHAIN)));

        let mut executor = GraphExecutor::<usize, StepError>::new();
        for i in 0..CHAIN {
            let completions = Arc::clone(&completions);
            let upstream = i.checked_sub(1).map(|p| format!("n{p}"));

            let node = Node::<usize, StepError>::producer(format!("n{i}"), move |deps| async move {
                let previous = match upstream.as_deref() {
                    Some(id) => deps.get(id).copied().map(|v| v + 1),
                    None => Some(0),
                };
                completions.lock().unwrap().push(i);
                previous.ok_or_else(|| step_error("upstream value missing"))
            });
            let node = match i.checked_sub(1) {
                Some(p) => node.depends_on([format!("n{p}")]),
                None => node,
            };
            executor.add_node(node);
        }

        let outcome = tokio::time::timeout(Duration::from_secs(60), executor.run())
            .await
            .expect("chain did not finish in time")
            .unwrap();

        assert_eq!(outcome.get(&format!("n{}", CHAIN - 1)), Some(&(CHAIN - 1)));
        let completions = completions.lock().unwrap();
        assert_eq!(completions.len(), CHAIN);
        assert!(completions.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[tokio::test]
    async fn test_independent_branch_still_completes() {
        let y_runs = counter();

        let y_counter = Arc::clone(&y_runs);
        let result = GraphExecutor::<String, StepError>::new()
            .node(Node::producer("a", |_| async { Err(step_error("a broke")) }))
            .node(Node::consumer("b", |_| async { Ok(()) }).depends_on(["a"]))
            .node(Node::producer("x", |_| async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok("x".to_string())
            }))
            .node(
                Node::consumer("y", move |deps| async move {
                    assert_eq!(deps.get("x").map(String::as_str), Some("x"));
                    y_counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .depends_on(["x"]),
            )
            .run()
            .await;

        let aggregate = failed_graph(result);
        assert_eq!(y_runs.load(Ordering::SeqCst), 1);
        assert!(!aggregate.contains_task("x"));
        assert!(!aggregate.contains_task("y"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_every_failure_is_aggregated() {
        let mut executor = GraphExecutor::<u8, StepError>::new();
        for i in 0..40 {
            executor.add_node(Node::consumer(format!("leaf-{i}"), move |_| async move {
                if i % 8 == 3 {
                    Err(StepError(format!("leaf {i} failed")))
                } else {
                    Ok(())
                }
            }));
        }

        let aggregate = failed_graph(executor.run().await);

        assert_eq!(aggregate.len(), 5);
        assert_eq!(aggregate.root_causes().count(), 5);
        let mut failed: Vec<&str> = aggregate.iter().map(|f| f.task()).collect();
        failed.sort_unstable();
        assert_eq!(failed, vec!["leaf-11", "leaf-19", "leaf-27", "leaf-3", "leaf-35"]);
    }

    #[tokio::test]
    async fn test_diamond_sees_both_parents() {
        let outcome = GraphExecutor::<i64, StepError>::new()
            .node(Node::producer("a", |_| async { Ok(2) }))
            .node(Node::producer("b", |d| async move { Ok(d.get("a").copied().unwrap_or(0) * 3) }).depends_on(["a"]))
            .node(Node::producer("c", |d| async move { Ok(d.get("a").copied().unwrap_or(0) + 4) }).depends_on(["a"]))
            .node(
                Node::producer("d", |d| async move {
                    Ok(d.get("b").copied().unwrap_or(0) + d.get("c").copied().unwrap_or(0))
                })
                .depends_on(["c", "b"]),
            )
            .run()
            .await
            .unwrap();

        assert_eq!(outcome.len(), 4);
        assert_eq!(outcome.get("d"), Some(&12));
    }

    #[tokio::test]
    async fn test_leaf_nodes_publish_nothing() {
        let outcome = GraphExecutor::<i64, StepError>::new()
            .node(Node::producer("a", |_| async { Ok(1) }))
            .node(Node::consumer("report", |_| async { Ok(()) }).depends_on(["a"]))
            .run()
            .await
            .unwrap();

        assert_eq!(outcome.len(), 1);
        assert!(outcome.get("report").is_none());
    }

    #[tokio::test]
    async fn test_abort_all_stops_waiting_nodes() {
        let waiting_runs = counter();
        let slow_finished = counter();

        let waiting_counter = Arc::clone(&waiting_runs);
        let slow_counter = Arc::clone(&slow_finished);
        let result = GraphExecutor::<u32, StepError>::new()
            .with_failure_strategy(FailureStrategy::AbortAll)
            .node(Node::consumer("fails", |_| async {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Err(step_error("fatal"))
            }))
            .node(Node::producer("slow", move |_| async move {
                tokio::time::sleep(Duration::from_millis(100)).await;
                slow_counter.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            }))
            .node(
                Node::consumer("waiting", move |_| async move {
                    waiting_counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .depends_on(["slow"]),
            )
            .run()
            .await;

        let aggregate = failed_graph(result);

        // in-flight work finishes, waiting work never starts
        assert_eq!(slow_finished.load(Ordering::SeqCst), 1);
        assert_eq!(waiting_runs.load(Ordering::SeqCst), 0);
        assert!(!aggregate.contains_task("slow"));
        assert!(aggregate
            .errors()
            .any(|e| matches!(e, NodeError::Aborted { node } if node == "waiting")));

        let roots: Vec<&str> = aggregate.root_causes().map(|f| f.task()).collect();
        assert_eq!(roots, vec!["fails"]);
    }

    #[tokio::test]
    async fn test_invalid_graph_runs_nothing() {
        let runs = counter();

        let first = Arc::clone(&runs);
        let second = Arc::clone(&runs);
        let result = GraphExecutor::<u8, StepError>::new()
            .node(
                Node::producer("a", move |_| async move {
                    first.fetch_add(1, Ordering::SeqCst);
                    Ok(1)
                })
                .depends_on(["b"]),
            )
            .node(
                Node::producer("b", move |_| async move {
                    second.fetch_add(1, Ordering::SeqCst);
                    Ok(2)
                })
                .depends_on(["a"]),
            )
            .run()
            .await;

        match result {
            Err(GraphError::Invalid(errors)) => {
                assert!(matches!(errors[0], ValidationError::CyclicDependency { .. }));
            }
            other => panic!("expected validation failure, got {:?}", other.map(|o| o.len())),
        }
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_validation_catches_structural_errors() {
        let executor = GraphExecutor::<u8, StepError>::new()
            .node(Node::producer("a", |_| async { Ok(1) }))
            .node(Node::producer("a", |_| async { Ok(1) }))
            .node(Node::consumer("leaf", |_| async { Ok(()) }))
            .node(Node::consumer("b", |_| async { Ok(()) }).depends_on(["leaf", "ghost"]));

        let errors = executor.validate().unwrap_err();

        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&ValidationError::DuplicateNodeId {
            node_id: "a".to_string()
        }));
        assert!(errors.contains(&ValidationError::UnpublishedDependency {
            node_id: "b".to_string(),
            dependency: "leaf".to_string(),
        }));
        assert!(errors.contains(&ValidationError::UnresolvedDependency {
            node_id: "b".to_string(),
            missing_dependency: "ghost".to_string(),
        }));
    }

    #[tokio::test]
    async fn test_isolated_panic_cancels_dependents() {
        let downstream_runs = counter();

        let runs = Arc::clone(&downstream_runs);
        let result = GraphExecutor::<u8, StepError>::new()
            .with_panic_policy(PanicPolicy::Isolate)
            .node(Node::producer("explodes", |_| async {
                if true {
                    panic!("generator blew up");
                }
                Ok(1)
            }))
            .node(
                Node::consumer("after", move |_| async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .depends_on(["explodes"]),
            )
            .run()
            .await;

        let aggregate = failed_graph(result);

        assert_eq!(downstream_runs.load(Ordering::SeqCst), 0);
        assert!(aggregate.iter().any(|f| matches!(
            f,
            TaskFailure::Panicked { task, message } if task == "explodes" && message == "generator blew up"
        )));
        let roots: Vec<&str> = aggregate.root_causes().map(|f| f.task()).collect();
        assert_eq!(roots, vec!["explodes"]);
    }

    #[tokio::test]
    async fn test_propagated_panic_reaches_caller() {
        let sibling_finished = counter();

        let sibling = Arc::clone(&sibling_finished);
        let executor = GraphExecutor::<u8, StepError>::new()
            .node(Node::consumer("explodes", |_| async {
                if true {
                    panic!("boom");
                }
                Ok(())
            }))
            .node(Node::consumer("sibling", move |_| async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                sibling.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));

        let joined = tokio::spawn(executor.run()).await;

        assert!(joined.unwrap_err().is_panic());
        assert_eq!(sibling_finished.load(Ordering::SeqCst), 1);
    }
}
