// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::any::Any;
use std::future::Future;
use tokio::task::JoinHandle;

use crate::errors::{AggregateError, PanicPolicy, TaskFailure};
use crate::observability::messages::task::{
    CollectedFailure, TaskGroupJoined, TaskGroupJoining, TaskPanicked,
};
use crate::observability::messages::StructuredLog;

/// Runs independently scheduled units of work and joins them into a single
/// result that carries every failure.
///
/// Each unit is spawned on the ambient tokio runtime as soon as it is
/// registered, so `spawn` must be called from within a runtime context.
/// Every unit gets its own join slot; the group never buffers more results
/// than it has units, and no unit ever blocks on reporting its outcome.
///
/// `spawn` borrows the group mutably and `wait` consumes it, so every
/// registration happens-before the join and the join can only happen once.
///
/// # Example
/// ```
/// use seedgraph::engine::TaskGroup;
///
/// # #[tokio::main]
/// # async fn main() {
/// let mut group: TaskGroup<std::io::Error> = TaskGroup::new();
/// group.spawn("ok", async { Ok(()) });
/// group.spawn("broken", async {
///     Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
/// });
///
/// let aggregate = group.wait().await.unwrap_err();
/// assert_eq!(aggregate.len(), 1);
/// assert!(aggregate.contains_task("broken"));
/// # }
/// ```
pub struct TaskGroup<E> {
    tasks: Vec<(String, JoinHandle<Result<(), E>>)>,
    panic_policy: PanicPolicy,
}

impl<E> TaskGroup<E>
where
    E: Send + 'static,
{
    pub fn new() -> Self {
        Self::with_panic_policy(PanicPolicy::default())
    }

    pub fn with_panic_policy(panic_policy: PanicPolicy) -> Self {
        Self {
            tasks: Vec::new(),
            panic_policy,
        }
    }

    pub fn panic_policy(&self) -> PanicPolicy {
        self.panic_policy
    }

    /// Register one unit of work. It starts running immediately.
    pub fn spawn<F>(&mut self, name: impl Into<String>, unit: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
    {
        let handle = tokio::spawn(unit);
        self.tasks.push((name.into(), handle));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for every registered unit to finish.
    ///
    /// Returns `Ok(())` when no unit failed, including when none were
    /// registered. Otherwise returns every failure, in registration order.
    ///
    /// Dropping the returned future before it completes (for example under
    /// `tokio::time::timeout`) does not abort the units; they keep running
    /// detached and their results are discarded.
    ///
    /// # Panics
    /// Under [`PanicPolicy::Propagate`], if any unit panicked, the first
    /// panic is resumed here once all other units have finished and every
    /// collected failure has been logged.
    pub async fn wait(self) -> Result<(), AggregateError<E>>
    where
        E: std::fmt::Display,
    {
        let task_count = self.tasks.len();
        TaskGroupJoining { task_count }.log();

        let mut failures = Vec::new();
        let mut first_panic: Option<Box<dyn Any + Send>> = None;

        for (task, handle) in self.tasks {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(source)) => failures.push(TaskFailure::Failed { task, source }),
                Err(join_error) if join_error.is_panic() => {
                    let payload = join_error.into_panic();
                    let message = panic_message(payload.as_ref());
                    let isolated = self.panic_policy == PanicPolicy::Isolate;

                    TaskPanicked {
                        task: &task,
                        message: &message,
                        isolated,
                    }
                    .log();

                    if isolated {
                        failures.push(TaskFailure::Panicked { task, message });
                    } else if first_panic.is_none() {
                        first_panic = Some(payload);
                    }
                }
                Err(_) => failures.push(TaskFailure::Cancelled { task }),
            }
        }

        TaskGroupJoined {
            task_count,
            failed_count: failures.len(),
        }
        .log();

        if let Some(payload) = first_panic {
            for failure in &failures {
                CollectedFailure {
                    task: failure.task(),
                    error: &failure.to_string(),
                }
                .log();
            }
            std::panic::resume_unwind(payload);
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(AggregateError::new(failures))
        }
    }
}

impl<E> Default for TaskGroup<E>
where
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use thiserror::Error;

    #[derive(Error, Debug, PartialEq)]
    #[error("unit {0} failed")]
    struct UnitFailed(usize);

    #[tokio::test]
    async fn wait_with_no_tasks_returns_ok() {
        let group: TaskGroup<UnitFailed> = TaskGroup::new();
        assert!(group.is_empty());

        let result = tokio::time::timeout(Duration::from_millis(100), group.wait()).await;
        assert!(matches!(result, Ok(Ok(()))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn aggregate_holds_exactly_the_failed_units() {
        let mut group = TaskGroup::new();
        let completed = Arc::new(AtomicUsize::new(0));

        for i in 0..50usize {
            let completed = Arc::clone(&completed);
            group.spawn(format!("unit-{i}"), async move {
                // Finish in roughly reverse order of registration.
                tokio::time::sleep(Duration::from_millis((50 - i as u64) % 7)).await;
                completed.fetch_add(1, Ordering::SeqCst);
                if i % 5 == 0 {
                    Err(UnitFailed(i))
                } else {
                    Ok(())
                }
            });
        }
        assert_eq!(group.len(), 50);

        let aggregate = group.wait().await.unwrap_err();

        assert_eq!(completed.load(Ordering::SeqCst), 50);
        assert_eq!(aggregate.len(), 10);
        let mut failed: Vec<usize> = aggregate.errors().map(|e| e.0).collect();
        failed.sort_unstable();
        assert_eq!(failed, vec![0, 5, 10, 15, 20, 25, 30, 35, 40, 45]);
        assert!(aggregate.contains_task("unit-45"));
    }

    #[tokio::test]
    async fn all_successful_units_yield_ok() {
        let mut group: TaskGroup<UnitFailed> = TaskGroup::new();
        for i in 0..10 {
            group.spawn(format!("unit-{i}"), async { Ok(()) });
        }
        assert!(group.wait().await.is_ok());
    }

    #[tokio::test]
    async fn isolated_panic_is_recorded_as_failure() {
        let mut group = TaskGroup::with_panic_policy(PanicPolicy::Isolate);
        group.spawn("fine", async { Ok(()) });
        group.spawn("broken", async { Err(UnitFailed(1)) });
        group.spawn("explodes", async {
            if true {
                panic!("generator blew up");
            }
            Ok(())
        });

        let aggregate = group.wait().await.unwrap_err();

        assert_eq!(aggregate.len(), 2);
        match &aggregate.failures()[1] {
            TaskFailure::Panicked { task, message } => {
                assert_eq!(task, "explodes");
                assert_eq!(message, "generator blew up");
            }
            other => panic!("expected a panic entry, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn propagated_panic_waits_for_siblings_then_resumes() {
        let finished = Arc::new(AtomicUsize::new(0));
        let mut group: TaskGroup<UnitFailed> = TaskGroup::new();

        group.spawn("explodes", async {
            if true {
                panic!("boom");
            }
            Ok(())
        });
        let slow = Arc::clone(&finished);
        group.spawn("slow", async move {
            tokio::time::sleep(Duration::from_millis(30)).await;
            slow.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let joined = tokio::spawn(group.wait()).await;

        let join_error = joined.unwrap_err();
        assert!(join_error.is_panic());
        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }
}
