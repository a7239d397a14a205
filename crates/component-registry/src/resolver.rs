//! Dependency resolution
//!
//! Orders registered components so that each one comes after every
//! registered component it depends on. Edges to names that are not
//! registered are ignored here; initialization reports them.

use crate::error::{RegistryError, RegistryResult};
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::debug;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Directed graph of components, edges pointing at dependencies.
///
/// Node order is registration order and is used for traversal roots.
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    nodes: IndexMap<String, Vec<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with its declared dependencies. Re-adding a name replaces its edges.
    pub fn add_node(&mut self, name: impl Into<String>, dependencies: Vec<String>) {
        self.nodes.insert(name.into(), dependencies);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    /// Dependencies of `name` that are not nodes of this graph, in declared order
    pub fn missing_dependencies(&self, name: &str) -> Vec<String> {
        self.nodes
            .get(name)
            .map(|deps| {
                deps.iter()
                    .filter(|dep| !self.nodes.contains_key(dep.as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Topological order over all nodes.
    ///
    /// Depth-first from each node in insertion order, visiting dependencies
    /// in declared order, so the result is stable for an unchanged graph.
    /// Fails with the offending path when a node on the current path is
    /// reached again.
    ///
    /// The walk keeps its own stack of `(node, next dependency index)`, so
    /// chain depth is bounded by memory rather than the thread stack.
    pub fn resolve(&self) -> RegistryResult<Vec<String>> {
        let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(self.nodes.len());
        let mut stack: Vec<(&str, usize)> = Vec::new();
        let mut order = Vec::with_capacity(self.nodes.len());

        for root in self.nodes.keys() {
            if marks.contains_key(root.as_str()) {
                continue;
            }
            marks.insert(root.as_str(), Mark::Visiting);
            stack.push((root.as_str(), 0));

            while let Some(&(name, next)) = stack.last() {
                let dependencies = self.nodes.get(name).map(Vec::as_slice).unwrap_or_default();

                let Some(dependency) = dependencies.get(next) else {
                    stack.pop();
                    marks.insert(name, Mark::Done);
                    order.push(name.to_string());
                    continue;
                };
                let top = stack.len() - 1;
                stack[top].1 += 1;

                // Unregistered edges are not part of the order
                let Some((dependency, _)) = self.nodes.get_key_value(dependency.as_str()) else {
                    continue;
                };
                let dependency = dependency.as_str();
                match marks.get(dependency) {
                    Some(Mark::Done) => {}
                    Some(Mark::Visiting) => {
                        return Err(RegistryError::CircularDependency {
                            cycle: cycle_path(&stack, dependency),
                        });
                    }
                    None => {
                        marks.insert(dependency, Mark::Visiting);
                        stack.push((dependency, 0));
                    }
                }
            }
        }

        debug!(components = order.len(), "Resolved dependency order");
        Ok(order)
    }
}

/// Path from the first occurrence of `repeated` on the stack back to itself
fn cycle_path(stack: &[(&str, usize)], repeated: &str) -> Vec<String> {
    let start = stack.iter().position(|(n, _)| *n == repeated).unwrap_or(0);
    stack[start..]
        .iter()
        .map(|(n, _)| n.to_string())
        .chain(std::iter::once(repeated.to_string()))
        .collect()
}

impl<'a> FromIterator<(&'a str, &'a [String])> for DependencyGraph {
    fn from_iter<T: IntoIterator<Item = (&'a str, &'a [String])>>(iter: T) -> Self {
        let mut graph = DependencyGraph::new();
        for (name, dependencies) in iter {
            graph.add_node(name, dependencies.to_vec());
        }
        graph
    }
}
