//! Change plan types and construction.
//!
//! This module merges the deployment dependency graph with the identified
//! changes into a change-level graph:
//! - Every add or update depends on every removal
//! - An add or update depends on the add or update of each deployment its
//!   deployment depends on
//!
//! The graph is then transitively reduced into the pruned graph that drives
//! a concurrent executor, and optionally serialized into a total order.

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::graph::Digraph;
use crate::package::ResolvedDeployment;

use super::changes::{ChangeId, ChangeKind, LiveStack, ReconciliationChange, identify_changes};
use super::order::serialize_changes;

/// A complete change plan.
#[derive(Debug, Clone)]
pub struct ChangePlan {
    /// Changes, sorted by stack name.
    pub changes: Vec<ReconciliationChange>,
    /// Full change dependency graph.
    pub graph: Digraph<ChangeId>,
    /// Transitively reduced graph; a change runs once its pruned predecessors finish.
    pub pruned: Digraph<ChangeId>,
    /// Transitive closure of the change graph.
    pub closure: Digraph<ChangeId>,
    /// Cycles in the change graph.
    pub cycles: Vec<Vec<ChangeId>>,
    /// Serial execution order, if requested.
    pub order: Option<Vec<ChangeId>>,
}

impl ChangePlan {
    /// Returns true if no change is needed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes of the given kind.
    #[must_use]
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind() == kind).count()
    }

    /// Returns true if the change graph has cycles.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    /// Looks up a change by identity.
    #[must_use]
    pub fn change(&self, id: &ChangeId) -> Option<&ReconciliationChange> {
        self.changes.iter().find(|c| c.name() == id.as_str())
    }

    /// Changes with no pruned predecessors, which may start immediately.
    #[must_use]
    pub fn ready_changes(&self) -> Vec<&ReconciliationChange> {
        self.changes
            .iter()
            .filter(|c| self.pruned.dependencies_of(&c.id()).next().is_none())
            .collect()
    }

    /// Pruned predecessors of a change.
    #[must_use]
    pub fn dependencies_of(&self, id: &ChangeId) -> Vec<&ChangeId> {
        self.pruned.dependencies_of(id).collect()
    }

    /// Changes having the given change as a pruned predecessor.
    #[must_use]
    pub fn dependents_of(&self, id: &ChangeId) -> Vec<&ChangeId> {
        self.pruned
            .edges()
            .filter(|(_, to)| *to == id)
            .map(|(from, _)| from)
            .collect()
    }

    /// Changes in serial order, if the plan was serialized.
    #[must_use]
    pub fn ordered_changes(&self) -> Option<Vec<&ReconciliationChange>> {
        self.order
            .as_ref()
            .map(|order| order.iter().filter_map(|id| self.change(id)).collect())
    }
}

/// Builds change plans from deployments and live stacks.
#[derive(Debug, Default)]
pub struct ChangePlanner {
    /// Whether to compute a serial order.
    serialize: bool,
}

impl ChangePlanner {
    /// Creates a planner which leaves plans unserialized.
    #[must_use]
    pub const fn new() -> Self {
        Self { serialize: false }
    }

    /// Sets whether plans carry a serial order.
    #[must_use]
    pub const fn with_serialize(mut self, serialize: bool) -> Self {
        self.serialize = serialize;
        self
    }

    /// Plans the changes bringing the live stacks in line with the deployments.
    ///
    /// `deployment_graph` is the deployment dependency graph, with an edge
    /// from each deployment to each deployment it depends on. Cycles do not
    /// abort planning; they are reported in the plan.
    ///
    /// # Errors
    ///
    /// Returns an error if two deployments map to one stack name, or if a
    /// deployment enables an undeclared feature.
    pub fn plan(
        &self,
        deployments: &HashMap<String, ResolvedDeployment>,
        deployment_graph: &Digraph<String>,
        stacks: &HashMap<String, LiveStack>,
    ) -> Result<ChangePlan> {
        let changes = identify_changes(deployments, stacks)?;
        let graph = Self::build_graph(&changes, deployment_graph);

        let (pruned, closure) = graph.compute_transitive_reduction();
        debug!(
            "Change graph reduced from {} to {} edges",
            graph.edge_count(),
            pruned.edge_count()
        );

        let cycles = graph.identify_cycles();
        for cycle in &cycles {
            let path: Vec<&str> = cycle.iter().map(ChangeId::as_str).collect();
            warn!("Dependency cycle between changes: {}", path.join(" -> "));
        }

        let order = self.serialize.then(|| serialize_changes(&changes, &closure));

        info!(
            "Planned {} changes ({} cycles{})",
            changes.len(),
            cycles.len(),
            if order.is_some() { ", serialized" } else { "" }
        );

        Ok(ChangePlan {
            changes,
            graph,
            pruned,
            closure,
            cycles,
            order,
        })
    }

    /// Builds the change-level dependency graph.
    fn build_graph(
        changes: &[ReconciliationChange],
        deployment_graph: &Digraph<String>,
    ) -> Digraph<ChangeId> {
        let mut graph = Digraph::new();
        for change in changes {
            graph.add_node(change.id());
        }

        let removals: Vec<ChangeId> = changes
            .iter()
            .filter(|c| c.kind() == ChangeKind::Remove)
            .map(ReconciliationChange::id)
            .collect();

        let by_deployment: BTreeMap<&str, ChangeId> = changes
            .iter()
            .filter_map(|c| c.deployment().map(|d| (d.name.as_str(), c.id())))
            .collect();

        for (deployment, id) in &by_deployment {
            for removal in &removals {
                graph.add_edge(id.clone(), removal.clone());
            }
            for dependency in deployment_graph.dependencies_of(&(*deployment).to_string()) {
                if let Some(target) = by_deployment.get(dependency.as_str()) {
                    if target != id {
                        graph.add_edge(id.clone(), target.clone());
                    }
                }
            }
        }
        graph
    }
}
