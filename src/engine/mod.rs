pub mod graph;
pub mod task_group;
#[cfg(test)]
pub mod integration_tests;

pub use graph::{Dependencies, GraphExecutor, GraphOutcome, Node, NodeFuture};
pub use task_group::TaskGroup;
