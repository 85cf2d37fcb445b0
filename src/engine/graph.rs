use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::{validate_dependency_graph, DependencySpec};
use crate::engine::TaskGroup;
use crate::errors::{FailureStrategy, GraphError, NodeError, PanicPolicy, ValidationError};
use crate::observability::messages::engine::{
    GraphRunCompleted, GraphRunFailed, GraphRunStarted, NodeAborted, NodeCompleted, NodeFailed,
    NodeSkipped, NodeStarted,
};
use crate::observability::messages::validation::ValidationFailed;
use crate::observability::messages::StructuredLog;
use crate::sync::{FutureReader, OneShotFuture};

/// Boxed future returned by a node's unit of work.
pub type NodeFuture<T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'static>>;

type ProduceFn<V, E> = Box<dyn FnOnce(Dependencies<V>) -> NodeFuture<V, E> + Send + 'static>;
type ConsumeFn<V, E> = Box<dyn FnOnce(Dependencies<V>) -> NodeFuture<(), E> + Send + 'static>;

enum Work<V, E> {
    Produce(ProduceFn<V, E>),
    Consume(ConsumeFn<V, E>),
}

/// One node of a dependency graph: a unit of work, the nodes it reads from,
/// and (for producers) the value it publishes to its dependents.
pub struct Node<V, E> {
    id: String,
    depends_on: Vec<String>,
    work: Work<V, E>,
}

impl<V, E> Node<V, E>
where
    V: Send + 'static,
    E: Send + 'static,
{
    /// A node whose successful result is published to a future that
    /// downstream nodes may depend on.
    pub fn producer<F, Fut>(id: impl Into<String>, work: F) -> Self
    where
        F: FnOnce(Dependencies<V>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
    {
        Self {
            id: id.into(),
            depends_on: Vec::new(),
            work: Work::Produce(Box::new(move |deps: Dependencies<V>| -> NodeFuture<V, E> {
                Box::pin(work(deps))
            })),
        }
    }

    /// A leaf node: runs its work and publishes nothing.
    pub fn consumer<F, Fut>(id: impl Into<String>, work: F) -> Self
    where
        F: FnOnce(Dependencies<V>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
    {
        Self {
            id: id.into(),
            depends_on: Vec::new(),
            work: Work::Consume(Box::new(move |deps: Dependencies<V>| -> NodeFuture<(), E> {
                Box::pin(work(deps))
            })),
        }
    }

    pub fn depends_on<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on
            .extend(dependencies.into_iter().map(Into::into));
        self
    }
}

impl<V, E> DependencySpec for Node<V, E> {
    fn node_id(&self) -> &str {
        &self.id
    }

    fn dependencies(&self) -> &[String] {
        &self.depends_on
    }

    fn publishes(&self) -> bool {
        matches!(self.work, Work::Produce(_))
    }
}

/// Resolved values of a node's dependencies, keyed by dependency id.
#[derive(Debug, Clone)]
pub struct Dependencies<V> {
    values: HashMap<String, V>,
}

impl<V> Dependencies<V> {
    pub fn get(&self, id: &str) -> Option<&V> {
        self.values.get(id)
    }

    pub fn take(&mut self, id: &str) -> Option<V> {
        self.values.remove(id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.values.iter().map(|(id, value)| (id.as_str(), value))
    }
}

impl<V> FromIterator<(String, V)> for Dependencies<V> {
    fn from_iter<I: IntoIterator<Item = (String, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Values published by producer nodes in a successful run.
#[derive(Debug, Clone)]
pub struct GraphOutcome<V> {
    values: HashMap<String, V>,
}

impl<V> GraphOutcome<V> {
    pub fn get(&self, id: &str) -> Option<&V> {
        self.values.get(id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> HashMap<String, V> {
        self.values
    }
}

/// Runs a fixed, acyclic graph of nodes, one task per node.
///
/// Every producer gets a [`OneShotFuture`] created before any task starts.
/// Each task waits on the futures of its dependencies (in any order), runs its
/// work, then resolves its own future. If a dependency was canceled the task
/// skips its work, cancels its own future, and reports which dependency was
/// missing, so everything downstream fails fast instead of waiting forever.
/// A failing unit of work likewise cancels its own future before returning.
///
/// Under the default [`FailureStrategy::ContinueIndependent`] nothing else is
/// stopped: unrelated branches run to completion and every failure comes back
/// together from [`run`](Self::run).
///
/// # Example
/// ```
/// use seedgraph::engine::{Dependencies, GraphExecutor, Node};
///
/// # #[tokio::main]
/// # async fn main() {
/// let outcome = GraphExecutor::<u32, std::io::Error>::new()
///     .node(Node::producer("a", |_| async { Ok(2) }))
///     .node(Node::producer("b", |deps: Dependencies<u32>| async move {
///         Ok(deps.get("a").copied().unwrap_or_default() * 10)
///     }).depends_on(["a"]))
///     .run()
///     .await
///     .unwrap();
///
/// assert_eq!(outcome.get("b"), Some(&20));
/// # }
/// ```
pub struct GraphExecutor<V, E> {
    nodes: Vec<Node<V, E>>,
    failure_strategy: FailureStrategy,
    panic_policy: PanicPolicy,
}

impl<V, E> GraphExecutor<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            failure_strategy: FailureStrategy::default(),
            panic_policy: PanicPolicy::default(),
        }
    }

    pub fn with_failure_strategy(mut self, failure_strategy: FailureStrategy) -> Self {
        self.failure_strategy = failure_strategy;
        self
    }

    pub fn with_panic_policy(mut self, panic_policy: PanicPolicy) -> Self {
        self.panic_policy = panic_policy;
        self
    }

    pub fn node(mut self, node: Node<V, E>) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn add_node(&mut self, node: Node<V, E>) {
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        validate_dependency_graph(self.nodes.as_slice())
    }

    /// Validate the graph, launch every node, and wait for all of them.
    pub async fn run(self) -> Result<GraphOutcome<V>, GraphError<E>> {
        if let Err(errors) = self.validate() {
            ValidationFailed {
                error_count: errors.len(),
            }
            .log();
            return Err(GraphError::Invalid(errors));
        }

        let started = Instant::now();
        let node_count = self.nodes.len();
        GraphRunStarted {
            node_count,
            strategy: strategy_label(self.failure_strategy),
        }
        .log();

        let mut outputs: HashMap<String, OneShotFuture<V>> = HashMap::new();
        let mut readers: HashMap<String, FutureReader<V>> = HashMap::new();
        for node in self.nodes.iter().filter(|n| n.publishes()) {
            let future = OneShotFuture::new(node.id.clone());
            readers.insert(node.id.clone(), future.reader());
            outputs.insert(node.id.clone(), future);
        }

        let abort = CancellationToken::new();
        let mut group = TaskGroup::with_panic_policy(self.panic_policy);

        for node in self.nodes {
            let upstream = node
                .depends_on
                .iter()
                .filter_map(|dep| readers.get(dep).map(|r| (dep.clone(), r.clone())))
                .collect();

            let task = NodeTask {
                id: node.id.clone(),
                upstream,
                output: outputs.remove(&node.id),
                abort: abort.clone(),
                failure_strategy: self.failure_strategy,
            };
            group.spawn(node.id, task.run(node.work));
        }

        match group.wait().await {
            Ok(()) => {
                let values = readers
                    .into_iter()
                    .filter_map(|(id, reader)| match reader.try_get() {
                        Some(Ok(value)) => Some((id, value)),
                        _ => None,
                    })
                    .collect();

                GraphRunCompleted {
                    node_count,
                    duration: started.elapsed(),
                }
                .log();
                Ok(GraphOutcome { values })
            }
            Err(aggregate) => {
                GraphRunFailed {
                    failed_count: aggregate.len(),
                    root_cause_count: aggregate.root_causes().count(),
                    error: &aggregate,
                }
                .log();
                Err(GraphError::Failed(aggregate))
            }
        }
    }
}

impl<V, E> Default for GraphExecutor<V, E>
where
    V: Clone + Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

fn strategy_label(strategy: FailureStrategy) -> &'static str {
    match strategy {
        FailureStrategy::ContinueIndependent => "continue_independent",
        FailureStrategy::AbortAll => "abort_all",
    }
}

/// Everything one spawned node task owns.
struct NodeTask<V> {
    id: String,
    upstream: Vec<(String, FutureReader<V>)>,
    output: Option<OneShotFuture<V>>,
    abort: CancellationToken,
    failure_strategy: FailureStrategy,
}

impl<V> NodeTask<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn run<E>(self, work: Work<V, E>) -> Result<(), NodeError<E>>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let result = self.execute(work).await;

        if result.is_err() {
            if let Some(output) = &self.output {
                // Only the success path resolves, so this is still pending.
                let _ = output.cancel();
            }
            if self.failure_strategy == FailureStrategy::AbortAll {
                self.abort.cancel();
            }
        }

        result
    }

    async fn execute<E>(&self, work: Work<V, E>) -> Result<(), NodeError<E>>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        let mut values = HashMap::with_capacity(self.upstream.len());

        for (dependency, reader) in &self.upstream {
            let value = tokio::select! {
                biased;
                _ = self.abort.cancelled() => return Err(self.aborted()),
                value = reader.get() => value,
            };

            match value {
                Ok(value) => {
                    values.insert(dependency.clone(), value);
                }
                Err(source) => {
                    NodeSkipped {
                        node_id: &self.id,
                        dependency,
                    }
                    .log();
                    return Err(NodeError::DependencyUnavailable {
                        node: self.id.clone(),
                        dependency: dependency.clone(),
                        source,
                    });
                }
            }
        }

        if self.abort.is_cancelled() {
            return Err(self.aborted());
        }

        NodeStarted {
            node_id: &self.id,
            dependency_count: values.len(),
        }
        .log();

        let started = Instant::now();
        let dependencies = Dependencies { values };

        let published = match work {
            Work::Produce(produce) => {
                let value = produce(dependencies)
                    .await
                    .map_err(|source| self.work_failed(source))?;
                if let Some(output) = &self.output {
                    output.resolve(value).map_err(|source| NodeError::Publish {
                        node: self.id.clone(),
                        source,
                    })?;
                }
                true
            }
            Work::Consume(consume) => {
                consume(dependencies)
                    .await
                    .map_err(|source| self.work_failed(source))?;
                false
            }
        };

        NodeCompleted {
            node_id: &self.id,
            published,
            duration: started.elapsed(),
        }
        .log();
        Ok(())
    }

    fn aborted<E>(&self) -> NodeError<E> {
        NodeAborted { node_id: &self.id }.log();
        NodeError::Aborted {
            node: self.id.clone(),
        }
    }

    fn work_failed<E>(&self, source: E) -> NodeError<E>
    where
        E: std::error::Error,
    {
        NodeFailed {
            node_id: &self.id,
            error: &source,
        }
        .log();
        NodeError::Work {
            node: self.id.clone(),
            source,
        }
    }
}
