use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::DependencySpec;

/// Forward adjacency of a node graph: node id to the ids that depend on it.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph(pub HashMap<String, Vec<String>>);

impl DependencyGraph {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Build the graph from node declarations. Dependencies on ids that are
    /// not declared are ignored; reference validation reports those.
    pub fn from_nodes<N: DependencySpec>(nodes: &[N]) -> Self {
        let mut graph: HashMap<String, Vec<String>> = nodes
            .iter()
            .map(|node| (node.node_id().to_string(), Vec::new()))
            .collect();

        for node in nodes {
            for dependency in node.dependencies() {
                if let Some(dependents) = graph.get_mut(dependency) {
                    dependents.push(node.node_id().to_string());
                }
            }
        }

        Self(graph)
    }

    pub fn add_dependency(&mut self, node_id: String, dependents: Vec<String>) {
        self.0.insert(node_id, dependents);
    }

    pub fn get_dependents(&self, node_id: &str) -> Option<&Vec<String>> {
        self.0.get(node_id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of declared dependencies per node.
    pub fn in_degrees(&self) -> HashMap<&str, usize> {
        let mut in_degree: HashMap<&str, usize> =
            self.0.keys().map(|id| (id.as_str(), 0)).collect();
        for dependents in self.0.values() {
            for dependent in dependents {
                if let Some(count) = in_degree.get_mut(dependent.as_str()) {
                    *count += 1;
                }
            }
        }
        in_degree
    }

    /// Kahn's algorithm. Ties are broken by id so the order is stable.
    ///
    /// Returns the ids that could not be ordered when the graph has a cycle;
    /// that set holds every node on a cycle plus everything downstream of one.
    pub fn topological_order(&self) -> Result<Vec<String>, HashSet<String>> {
        let mut in_degree = self.in_degrees();

        let mut ready: Vec<&str> = in_degree
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(&id, _)| id)
            .collect();
        ready.sort_unstable();
        let mut queue: VecDeque<&str> = ready.into();

        let mut order = Vec::with_capacity(self.0.len());
        while let Some(id) = queue.pop_front() {
            order.push(id.to_string());

            let mut unlocked = Vec::new();
            for dependent in self.0.get(id).into_iter().flatten() {
                if let Some(count) = in_degree.get_mut(dependent.as_str()) {
                    *count -= 1;
                    if *count == 0 {
                        unlocked.push(dependent.as_str());
                    }
                }
            }
            unlocked.sort_unstable();
            queue.extend(unlocked);
        }

        if order.len() == self.0.len() {
            Ok(order)
        } else {
            Err(in_degree
                .into_iter()
                .filter(|(_, count)| *count > 0)
                .map(|(id, _)| id.to_string())
                .collect())
        }
    }
}

impl From<HashMap<String, Vec<String>>> for DependencyGraph {
    fn from(graph: HashMap<String, Vec<String>>) -> Self {
        Self(graph)
    }
}

impl From<DependencyGraph> for HashMap<String, Vec<String>> {
    fn from(graph: DependencyGraph) -> Self {
        graph.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Decl(&'static str, Vec<String>);

    impl DependencySpec for Decl {
        fn node_id(&self) -> &str {
            self.0
        }

        fn dependencies(&self) -> &[String] {
            &self.1
        }
    }

    fn decl(id: &'static str, deps: &[&str]) -> Decl {
        Decl(id, deps.iter().map(|d| d.to_string()).collect())
    }

    #[test]
    fn test_dependents_are_forward_edges() {
        let graph = DependencyGraph::from_nodes(&[
            decl("users", &[]),
            decl("cards", &["users"]),
            decl("orders", &["users", "cards"]),
        ]);

        assert_eq!(graph.len(), 3);
        assert_eq!(
            graph.get_dependents("users"),
            Some(&vec!["cards".to_string(), "orders".to_string()])
        );
        assert_eq!(graph.in_degrees()["orders"], 2);
    }

    #[test]
    fn test_topological_order_is_stable() {
        let graph = DependencyGraph::from_nodes(&[
            decl("d", &["b", "c"]),
            decl("c", &["a"]),
            decl("b", &["a"]),
            decl("a", &[]),
        ]);

        assert_eq!(graph.topological_order().unwrap(), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_cycle_leaves_nodes_unordered() {
        let graph = DependencyGraph::from_nodes(&[
            decl("a", &[]),
            decl("b", &["a", "c"]),
            decl("c", &["b"]),
            decl("d", &["c"]),
        ]);

        let remaining = graph.topological_order().unwrap_err();
        let expected: HashSet<String> = ["b", "c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(remaining, expected);
    }

    #[test]
    fn test_long_chain_orders_without_recursion() {
        let ids: Vec<String> = (0..10_000).map(|i| format!("n{i}")).collect();
        let mut graph = DependencyGraph::new();
        for pair in ids.windows(2) {
            graph.add_dependency(pair[0].clone(), vec![pair[1].clone()]);
        }
        graph.add_dependency(ids[ids.len() - 1].clone(), Vec::new());

        let order = graph.topological_order().unwrap();
        assert_eq!(order.len(), 10_000);
        assert_eq!(order.first(), ids.first());
        assert_eq!(order.last(), ids.last());
    }
}
