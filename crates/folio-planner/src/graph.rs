//! Resource graph construction and dependency ordering.

use crate::error::GraphError;
use folio_core::ResourceDescriptor;
use std::collections::{BTreeSet, HashMap};

/// A validated set of descriptors whose known references form a DAG.
///
/// Construction rejects duplicate names and cycles. References to names
/// absent from the graph are reported by [`ResourceGraph::order`].
#[derive(Debug, Clone)]
pub struct ResourceGraph {
    descriptors: Vec<ResourceDescriptor>,
    index: HashMap<String, usize>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

impl ResourceGraph {
    /// Validate descriptors into a graph. Declaration order is preserved and
    /// later used as the ordering tie-break.
    pub fn build(descriptors: Vec<ResourceDescriptor>) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(descriptors.len());
        for (i, d) in descriptors.iter().enumerate() {
            if index.insert(d.name.clone(), i).is_some() {
                return Err(GraphError::DuplicateIdentity {
                    name: d.name.clone(),
                });
            }
        }

        let graph = Self { descriptors, index };
        if let Some(cycle) = graph.find_cycle() {
            return Err(GraphError::CyclicDependency { cycle });
        }

        tracing::debug!(resources = graph.len(), "resource graph validated");
        Ok(graph)
    }

    pub fn get(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Descriptors in declaration order.
    pub fn descriptors(&self) -> &[ResourceDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Names of descriptors that reference `name` directly.
    pub fn dependents(&self, name: &str) -> Vec<&str> {
        self.descriptors
            .iter()
            .filter(|d| d.references().contains(&name))
            .map(|d| d.name.as_str())
            .collect()
    }

    /// Topological order: every descriptor comes after everything it
    /// references. Among descriptors that are ready at the same time, the one
    /// declared first goes first, so an unchanged graph always yields the same
    /// order.
    pub fn order(&self) -> Result<Vec<&ResourceDescriptor>, GraphError> {
        let n = self.descriptors.len();
        let mut remaining = vec![0usize; n];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];

        for (i, d) in self.descriptors.iter().enumerate() {
            for reference in d.references() {
                let Some(&target) = self.index.get(reference) else {
                    return Err(GraphError::UnresolvedReference {
                        from: d.name.clone(),
                        to: reference.to_string(),
                    });
                };
                remaining[i] += 1;
                dependents[target].push(i);
            }
        }

        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| remaining[i] == 0).collect();
        let mut ordered = Vec::with_capacity(n);

        while let Some(i) = ready.pop_first() {
            ordered.push(&self.descriptors[i]);
            for &dependent in &dependents[i] {
                remaining[dependent] -= 1;
                if remaining[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if ordered.len() != n {
            // Unreachable for a graph accepted by `build`.
            let cycle = (0..n)
                .filter(|&i| remaining[i] > 0)
                .map(|i| self.descriptors[i].name.clone())
                .collect();
            return Err(GraphError::CyclicDependency { cycle });
        }

        Ok(ordered)
    }

    fn find_cycle(&self) -> Option<Vec<String>> {
        let mut marks = vec![Mark::Unvisited; self.descriptors.len()];
        let mut path = Vec::new();
        for start in 0..self.descriptors.len() {
            if marks[start] == Mark::Unvisited
                && let Some(cycle) = self.visit(start, &mut marks, &mut path)
            {
                return Some(cycle);
            }
        }
        None
    }

    fn visit(&self, node: usize, marks: &mut [Mark], path: &mut Vec<usize>) -> Option<Vec<String>> {
        marks[node] = Mark::InProgress;
        path.push(node);

        for reference in self.descriptors[node].references() {
            // Unknown names are reported by `order`.
            let Some(&next) = self.index.get(reference) else {
                continue;
            };
            match marks[next] {
                Mark::InProgress => {
                    let start = path.iter().position(|&p| p == next).unwrap_or(0);
                    let mut cycle: Vec<String> = path[start..]
                        .iter()
                        .map(|&i| self.descriptors[i].name.clone())
                        .collect();
                    cycle.push(self.descriptors[next].name.clone());
                    return Some(cycle);
                }
                Mark::Unvisited => {
                    if let Some(cycle) = self.visit(next, marks, path) {
                        return Some(cycle);
                    }
                }
                Mark::Done => {}
            }
        }

        path.pop();
        marks[node] = Mark::Done;
        None
    }
}
