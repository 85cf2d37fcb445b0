// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Structural validation of node graphs.
//!
//! Any set of node declarations implementing [`DependencySpec`] can be checked:
//! plan files ([`crate::config::NodeConfig`]) before anything is built, and
//! executable graphs ([`crate::engine::Node`]) before anything is spawned.
//!
//! # Validation Pipeline
//!
//! 1. **Uniqueness**: every node id appears once
//! 2. **References**: every dependency is listed once and names a declared node
//! 3. **Publication**: every dependency names a node that publishes a value
//! 4. **Acyclicity**: Kahn's algorithm over the forward edges
//!
//! All errors from the first three stages are accumulated. The cycle check only
//! runs on an otherwise valid graph.
//!
//! ## Cycle Detection
//! Kahn's algorithm is iterative, so a chain of tens of thousands of nodes
//! needs no deeper stack than a chain of three. Nodes left with a non-zero
//! in-degree are either on a cycle or downstream of one; following remaining
//! dependencies from any of them must revisit a node, and the revisited stretch
//! is reported as the cycle.
//!
//! # Example
//! ```rust
//! use seedgraph::config::{validate_dependency_graph, DependencySpec};
//! use seedgraph::errors::ValidationError;
//!
//! struct Step(&'static str, Vec<String>);
//!
//! impl DependencySpec for Step {
//!     fn node_id(&self) -> &str { self.0 }
//!     fn dependencies(&self) -> &[String] { &self.1 }
//! }
//!
//! let steps = vec![
//!     Step("users", vec![]),
//!     Step("orders", vec!["carts".to_string()]),
//! ];
//!
//! let errors = validate_dependency_graph(&steps).unwrap_err();
//! assert!(matches!(errors[0], ValidationError::UnresolvedDependency { .. }));
//! ```

use std::collections::{HashMap, HashSet};

use crate::config::DependencyGraph;
use crate::errors::ValidationError;
use crate::observability::messages::validation::{
    CyclicDependencyDetected, DuplicateDependency, DuplicateNodeId, UnpublishedDependency,
    UnresolvedDependency, ValidationStarted,
};
use crate::observability::messages::StructuredLog;

/// The shape of a node as far as validation is concerned.
pub trait DependencySpec {
    fn node_id(&self) -> &str;

    /// Ids of the nodes whose published values this node reads.
    fn dependencies(&self) -> &[String];

    /// Whether other nodes may depend on this one.
    fn publishes(&self) -> bool {
        true
    }
}

/// Validate node declarations for uniqueness, resolvable and published
/// dependencies, and acyclicity.
///
/// # Returns
///
/// * `Ok(())` - the graph can be executed
/// * `Err(Vec<ValidationError>)` - every problem found
pub fn validate_dependency_graph<N: DependencySpec>(nodes: &[N]) -> Result<(), Vec<ValidationError>> {
    ValidationStarted {
        node_count: nodes.len(),
    }
    .log();

    let mut errors = Vec::new();

    if let Err(duplicate_errors) = validate_unique_node_ids(nodes) {
        errors.extend(duplicate_errors);
    }

    if let Err(reference_errors) = validate_dependency_references(nodes) {
        errors.extend(reference_errors);
    }

    if errors.is_empty() {
        if let Err(cycle_errors) = validate_acyclic_graph(nodes) {
            errors.extend(cycle_errors);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_unique_node_ids<N: DependencySpec>(nodes: &[N]) -> Result<(), Vec<ValidationError>> {
    let mut seen_ids = HashSet::new();
    let mut errors = Vec::new();

    for node in nodes {
        if !seen_ids.insert(node.node_id()) {
            DuplicateNodeId {
                node_id: node.node_id(),
            }
            .log();
            errors.push(ValidationError::DuplicateNodeId {
                node_id: node.node_id().to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_dependency_references<N: DependencySpec>(
    nodes: &[N],
) -> Result<(), Vec<ValidationError>> {
    let publishes: HashMap<&str, bool> = nodes
        .iter()
        .map(|node| (node.node_id(), node.publishes()))
        .collect();
    let mut errors = Vec::new();

    for node in nodes {
        let mut listed = HashSet::new();
        for dependency in node.dependencies() {
            if !listed.insert(dependency.as_str()) {
                DuplicateDependency {
                    node_id: node.node_id(),
                    dependency,
                }
                .log();
                errors.push(ValidationError::DuplicateDependency {
                    node_id: node.node_id().to_string(),
                    dependency: dependency.clone(),
                });
                continue;
            }

            match publishes.get(dependency.as_str()) {
                None => {
                    UnresolvedDependency {
                        node_id: node.node_id(),
                        missing_dependency: dependency,
                    }
                    .log();
                    errors.push(ValidationError::UnresolvedDependency {
                        node_id: node.node_id().to_string(),
                        missing_dependency: dependency.clone(),
                    });
                }
                Some(false) => {
                    UnpublishedDependency {
                        node_id: node.node_id(),
                        dependency,
                    }
                    .log();
                    errors.push(ValidationError::UnpublishedDependency {
                        node_id: node.node_id().to_string(),
                        dependency: dependency.clone(),
                    });
                }
                Some(true) => {}
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_acyclic_graph<N: DependencySpec>(nodes: &[N]) -> Result<(), Vec<ValidationError>> {
    let remaining = match DependencyGraph::from_nodes(nodes).topological_order() {
        Ok(_) => return Ok(()),
        Err(remaining) => remaining,
    };

    let dependencies: HashMap<&str, &[String]> = nodes
        .iter()
        .map(|node| (node.node_id(), node.dependencies()))
        .collect();
    let cycle = extract_cycle(&remaining, &dependencies);

    let labels: Vec<&str> = cycle.iter().map(String::as_str).collect();
    CyclicDependencyDetected { cycle: &labels }.log();

    Err(vec![ValidationError::CyclicDependency { cycle }])
}

/// Walk remaining dependencies until a node repeats. Every remaining node has
/// at least one remaining dependency, so the walk always closes a loop.
///
/// The result is in execution order (dependency first) and ends with its
/// first element, e.g. `["a", "b", "a"]`.
fn extract_cycle(remaining: &HashSet<String>, dependencies: &HashMap<&str, &[String]>) -> Vec<String> {
    let mut candidates: Vec<&str> = remaining.iter().map(String::as_str).collect();
    candidates.sort_unstable();

    let mut walk: Vec<&str> = Vec::new();
    let mut position: HashMap<&str, usize> = HashMap::new();
    let mut current = match candidates.first() {
        Some(start) => *start,
        None => return Vec::new(),
    };

    loop {
        if let Some(&start) = position.get(current) {
            let mut cycle: Vec<String> = walk[start..].iter().rev().map(|id| id.to_string()).collect();
            if let Some(first) = cycle.first().cloned() {
                cycle.push(first);
            }
            return cycle;
        }

        position.insert(current, walk.len());
        walk.push(current);

        let next = dependencies.get(current).and_then(|deps| {
            deps.iter()
                .map(String::as_str)
                .find(|dep| remaining.contains(*dep))
        });
        match next {
            Some(next) => current = next,
            None => return walk.iter().rev().map(|id| id.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestNode {
        id: String,
        depends_on: Vec<String>,
        publishes: bool,
    }

    impl DependencySpec for TestNode {
        fn node_id(&self) -> &str {
            &self.id
        }

        fn dependencies(&self) -> &[String] {
            &self.depends_on
        }

        fn publishes(&self) -> bool {
            self.publishes
        }
    }

    fn create_test_node(id: &str, depends_on: Vec<&str>) -> TestNode {
        TestNode {
            id: id.to_string(),
            depends_on: depends_on.iter().map(|s| s.to_string()).collect(),
            publishes: true,
        }
    }

    fn create_leaf_node(id: &str, depends_on: Vec<&str>) -> TestNode {
        TestNode {
            publishes: false,
            ..create_test_node(id, depends_on)
        }
    }

    #[test]
    fn test_valid_empty_graph() {
        let nodes: Vec<TestNode> = vec![];
        assert!(validate_dependency_graph(&nodes).is_ok());
    }

    #[test]
    fn test_valid_diamond_dependency() {
        let nodes = vec![
            create_test_node("a", vec![]),
            create_test_node("b", vec!["a"]),
            create_test_node("c", vec!["a"]),
            create_leaf_node("d", vec!["b", "c"]),
        ];

        assert!(validate_dependency_graph(&nodes).is_ok());
    }

    #[test]
    fn test_duplicate_node_ids() {
        let nodes = vec![create_test_node("a", vec![]), create_test_node("a", vec![])];

        let errors = validate_dependency_graph(&nodes).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateNodeId {
                node_id: "a".to_string()
            }]
        );
    }

    #[test]
    fn test_unresolved_dependency() {
        let nodes = vec![
            create_test_node("a", vec![]),
            create_test_node("b", vec!["nonexistent"]),
        ];

        let errors = validate_dependency_graph(&nodes).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::UnresolvedDependency {
                node_id: "b".to_string(),
                missing_dependency: "nonexistent".to_string(),
            }]
        );
    }

    #[test]
    fn test_dependency_on_leaf_node() {
        let nodes = vec![
            create_leaf_node("audit", vec![]),
            create_test_node("report", vec!["audit"]),
        ];

        let errors = validate_dependency_graph(&nodes).unwrap_err();
        assert!(matches!(
            &errors[0],
            ValidationError::UnpublishedDependency { node_id, dependency }
                if node_id == "report" && dependency == "audit"
        ));
    }

    #[test]
    fn test_repeated_dependency_is_rejected() {
        let nodes = vec![
            create_test_node("users", vec![]),
            create_leaf_node("cards", vec!["users", "users"]),
        ];

        let errors = validate_dependency_graph(&nodes).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::DuplicateDependency {
                node_id: "cards".to_string(),
                dependency: "users".to_string(),
            }]
        );
    }

    #[test]
    fn test_simple_cycle() {
        let nodes = vec![create_test_node("a", vec!["b"]), create_test_node("b", vec!["a"])];

        let errors = validate_dependency_graph(&nodes).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::CyclicDependency {
                cycle: vec!["b".to_string(), "a".to_string(), "b".to_string()]
            }]
        );
    }

    #[test]
    fn test_self_dependency_cycle() {
        let nodes = vec![create_test_node("a", vec!["a"])];

        let errors = validate_dependency_graph(&nodes).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::CyclicDependency {
                cycle: vec!["a".to_string(), "a".to_string()]
            }]
        );
    }

    #[test]
    fn test_cycle_reported_without_downstream_nodes() {
        // b -> c -> d -> b, with "e" hanging off the cycle
        let nodes = vec![
            create_test_node("a", vec![]),
            create_test_node("b", vec!["a", "d"]),
            create_test_node("c", vec!["b"]),
            create_test_node("d", vec!["c"]),
            create_test_node("e", vec!["d"]),
        ];

        let errors = validate_dependency_graph(&nodes).unwrap_err();
        let cycle = match &errors[0] {
            ValidationError::CyclicDependency { cycle } => cycle.clone(),
            other => panic!("expected cycle, got {other}"),
        };
        assert_eq!(cycle.len(), 4);
        assert_eq!(cycle.first(), cycle.last());
        assert!(!cycle.contains(&"e".to_string()));
        assert!(!cycle.contains(&"a".to_string()));
    }

    #[test]
    fn test_long_chain_is_valid() {
        let nodes: Vec<TestNode> = (0..10_000)
            .map(|i| TestNode {
                id: format!("n{i}"),
                depends_on: if i == 0 { vec![] } else { vec![format!("n{}", i - 1)] },
                publishes: true,
            })
            .collect();

        assert!(validate_dependency_graph(&nodes).is_ok());
    }

    #[test]
    fn test_multiple_errors_accumulate() {
        let nodes = vec![
            create_test_node("a", vec!["nonexistent"]),
            create_test_node("a", vec![]),
            create_test_node("b", vec!["missing"]),
        ];

        let errors = validate_dependency_graph(&nodes).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
