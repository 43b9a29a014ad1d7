//! Directed dependency graphs.
//!
//! An edge `u -> v` means "`u` depends on `v`". Nodes and edges are kept in
//! ordered collections so every traversal, and therefore every derived
//! result, is deterministic.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// A directed graph over comparable nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digraph<N: Ord> {
    /// Adjacency: node -> nodes it depends on.
    edges: BTreeMap<N, BTreeSet<N>>,
}

impl<N: Ord> Default for Digraph<N> {
    fn default() -> Self {
        Self {
            edges: BTreeMap::new(),
        }
    }
}

impl<N: Ord + Clone> Digraph<N> {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node; adding an existing node is a no-op.
    pub fn add_node(&mut self, node: N) {
        self.edges.entry(node).or_default();
    }

    /// Records that `from` depends on `to`, adding both nodes as needed.
    pub fn add_edge(&mut self, from: N, to: N) {
        self.add_node(to.clone());
        self.edges.entry(from).or_default().insert(to);
    }

    /// Returns true if `from` directly depends on `to`.
    #[must_use]
    pub fn has_edge(&self, from: &N, to: &N) -> bool {
        self.edges.get(from).is_some_and(|targets| targets.contains(to))
    }

    /// Returns true if the node is in the graph.
    #[must_use]
    pub fn contains(&self, node: &N) -> bool {
        self.edges.contains_key(node)
    }

    /// Iterates over nodes in order.
    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.edges.keys()
    }

    /// Iterates over edges in order.
    pub fn edges(&self) -> impl Iterator<Item = (&N, &N)> {
        self.edges
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |to| (from, to)))
    }

    /// Iterates over the direct dependencies of a node.
    pub fn dependencies_of<'a>(&'a self, node: &N) -> impl Iterator<Item = &'a N> + use<'a, N> {
        self.edges.get(node).into_iter().flatten()
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Returns the graph with every edge reversed.
    ///
    /// In the inverted graph the successors of a node are its dependents.
    #[must_use]
    pub fn invert(&self) -> Self {
        let mut inverted = Self::new();
        for node in self.nodes() {
            inverted.add_node(node.clone());
        }
        for (from, to) in self.edges() {
            inverted.add_edge(to.clone(), from.clone());
        }
        inverted
    }

    /// Nodes reachable from `start` through at least one edge.
    fn reachable_from(&self, start: &N) -> BTreeSet<N> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<&N> = self.dependencies_of(start).collect();
        while let Some(node) = queue.pop_front() {
            if seen.insert(node.clone()) {
                queue.extend(self.dependencies_of(node));
            }
        }
        seen
    }

    /// Computes the transitive closure: an edge `u -> v` for every path from `u` to `v`.
    #[must_use]
    pub fn compute_transitive_closure(&self) -> Self {
        let edges = self
            .nodes()
            .map(|node| (node.clone(), self.reachable_from(node)))
            .collect();
        Self { edges }
    }

    /// Labels each node with the smallest node of its strongly connected component.
    fn components(closure: &Self) -> BTreeMap<N, N> {
        let mut component = BTreeMap::new();
        for node in closure.nodes() {
            if component.contains_key(node) {
                continue;
            }
            component.insert(node.clone(), node.clone());
            for other in closure.dependencies_of(node) {
                if closure.has_edge(other, node) {
                    component.entry(other.clone()).or_insert_with(|| node.clone());
                }
            }
        }
        component
    }

    /// Computes the transitive reduction and the transitive closure.
    ///
    /// The reduction has the fewest edges preserving reachability between
    /// strongly connected components. Edges inside a component (cycles) are
    /// kept as they are, so reachability is preserved even for cyclic graphs.
    #[must_use]
    pub fn compute_transitive_reduction(&self) -> (Self, Self) {
        let closure = self.compute_transitive_closure();
        let component = Self::components(&closure);
        let same = |a: &N, b: &N| component.get(a) == component.get(b);

        let mut reduction = Self::new();
        for (node, targets) in &self.edges {
            reduction.add_node(node.clone());
            for target in targets {
                let redundant = !same(node, target)
                    && targets.iter().any(|other| {
                        other != target
                            && !same(other, node)
                            && !same(other, target)
                            && closure.has_edge(other, target)
                    });
                if !redundant {
                    reduction.add_edge(node.clone(), target.clone());
                }
            }
        }
        (reduction, closure)
    }

    /// Identifies cycles: one ordered cycle per group of mutually reachable nodes.
    ///
    /// Each cycle starts at the smallest node of its group and follows a
    /// shortest path back to it.
    #[must_use]
    pub fn identify_cycles(&self) -> Vec<Vec<N>> {
        let closure = self.compute_transitive_closure();
        let component = Self::components(&closure);

        let mut cycles = Vec::new();
        for (node, root) in &component {
            if node != root || !closure.has_edge(node, node) {
                continue;
            }
            if let Some(cycle) = self.shortest_cycle(node, |n| component.get(n) == Some(root)) {
                cycles.push(cycle);
            }
        }
        cycles
    }

    /// Shortest path from `start` back to itself through nodes accepted by `within`.
    fn shortest_cycle(&self, start: &N, within: impl Fn(&N) -> bool) -> Option<Vec<N>> {
        let mut parent: BTreeMap<&N, &N> = BTreeMap::new();
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            for next in self.dependencies_of(node) {
                if next == start {
                    let mut cycle = vec![node.clone()];
                    let mut current = node;
                    while let Some(previous) = parent.get(current) {
                        cycle.push((*previous).clone());
                        current = *previous;
                    }
                    cycle.reverse();
                    return Some(cycle);
                }
                if within(next) && !parent.contains_key(next) {
                    parent.insert(next, node);
                    queue.push_back(next);
                }
            }
        }
        None
    }
}
