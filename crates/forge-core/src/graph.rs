// SPDX-License-Identifier: MIT

//! The dependency graph learned by observing resolution calls. Edges point
//! from a dependent to each of its dependencies.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::key::Key;

#[derive(Default)]
pub struct Graph {
    /// parent -> set of children it depends on.
    edges: HashMap<Key, HashSet<Key>>,
}

impl Graph {
    pub fn new() -> Self {
        Graph::default()
    }

    /// Rebuild a graph from a previously exported edge set, independent of
    /// the container that produced it.
    pub fn from_edges(edges: &[(Key, Key)]) -> Self {
        let mut graph = Graph::new();
        for (parent, child) in edges {
            graph.add_edge(parent.clone(), child.clone());
        }
        graph
    }

    pub fn add_edge(&mut self, parent: Key, child: Key) {
        self.edges.entry(parent).or_default().insert(child);
    }

    pub fn edge_pairs(&self) -> Vec<(Key, Key)> {
        self.edges
            .iter()
            .flat_map(|(p, children)| children.iter().map(move |c| (p.clone(), c.clone())))
            .collect()
    }

    /// Deterministic topological order over `nodes`: dependencies first.
    ///
    /// Ties are broken by canonical key so repeated runs produce the same
    /// order. A cycle here is an internal error — cycles are expected to have
    /// already surfaced during resolution.
    pub fn topological_order(&self, nodes: &[Key]) -> Result<Vec<Key>, Vec<Key>> {
        let node_set: HashSet<&Key> = nodes.iter().collect();

        // reverse[child] = parents depending on it, restricted to the node set.
        let mut reverse: HashMap<&Key, HashSet<&Key>> = HashMap::new();
        let mut remaining: HashMap<&Key, usize> = nodes.iter().map(|n| (n, 0usize)).collect();

        // Both `expect`s below are infallible: `parent` was just filtered
        // through `node_set.contains(parent)`, and `remaining` is seeded with
        // every key in that same set before this loop runs.
        #[allow(clippy::expect_used)]
        for (parent, children) in &self.edges {
            if !node_set.contains(parent) {
                continue;
            }
            for child in children {
                if !node_set.contains(child) {
                    continue;
                }
                reverse.entry(child).or_default().insert(parent);
                *remaining.get_mut(parent).expect("parent is in node_set") += 1;
            }
        }

        let mut ready: BTreeSet<&Key> =
            remaining.iter().filter(|(_, &c)| c == 0).map(|(k, _)| *k).collect();
        let mut order = Vec::with_capacity(nodes.len());

        #[allow(clippy::expect_used)]
        while let Some(&next) = ready.iter().next() {
            ready.remove(next);
            order.push(next.clone());
            if let Some(parents) = reverse.get(next) {
                for &parent in parents {
                    let count = remaining.get_mut(parent).expect("parent tracked in remaining");
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(parent);
                    }
                }
            }
        }

        if order.len() != nodes.len() {
            let unresolved: Vec<Key> =
                nodes.iter().filter(|n| !order.contains(n)).cloned().collect();
            return Err(unresolved);
        }

        Ok(order)
    }
}
