//! Plan hashing for idempotence checks.
//!
//! Identical inputs always produce identical plans, so the digest of a plan
//! can be compared across invocations to confirm nothing changed.

use sha2::{Digest, Sha256};

use super::plan::ChangePlan;

/// Hasher for computing plan digests.
#[derive(Debug, Default)]
pub struct PlanHasher;

impl PlanHasher {
    /// Creates a new plan hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes a SHA-256 hex digest of a plan.
    ///
    /// A serialized plan hashes its order; otherwise the sorted changes and
    /// the pruned edges are hashed.
    #[must_use]
    pub fn hash_plan(&self, plan: &ChangePlan) -> String {
        let mut hasher = Sha256::new();

        if let Some(order) = &plan.order {
            hasher.update(b"order\0");
            for id in order {
                if let Some(change) = plan.change(id) {
                    hasher.update(change.kind().to_string().as_bytes());
                    hasher.update(b"\0");
                }
                hasher.update(id.as_str().as_bytes());
                hasher.update(b"\0");
            }
        } else {
            hasher.update(b"changes\0");
            for change in &plan.changes {
                hasher.update(change.kind().to_string().as_bytes());
                hasher.update(b"\0");
                hasher.update(change.name().as_bytes());
                hasher.update(b"\0");
            }
            hasher.update(b"edges\0");
            for (from, to) in plan.pruned.edges() {
                hasher.update(from.as_str().as_bytes());
                hasher.update(b"\0");
                hasher.update(to.as_str().as_bytes());
                hasher.update(b"\0");
            }
        }

        hex::encode(hasher.finalize())
    }

    /// Computes a short hash (first 8 characters) for display purposes.
    #[must_use]
    pub fn short_hash(&self, hash: &str) -> String {
        hash.chars().take(8).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Digraph;
    use crate::package::{DeploymentSpec, PackageDefinition, ResolvedDeployment};
    use crate::planner::{ChangePlanner, LiveStack};
    use std::collections::HashMap;

    fn plan(names: &[&str], edges: &[(&str, &str)], serialize: bool) -> ChangePlan {
        let deployments: HashMap<String, ResolvedDeployment> = names
            .iter()
            .map(|name| {
                let package = PackageDefinition {
                    path: format!("example.com/{name}"),
                    deployment: DeploymentSpec {
                        definition_files: vec![String::from("compose.yml")],
                        ..DeploymentSpec::default()
                    },
                    ..PackageDefinition::default()
                };
                let deployment =
                    ResolvedDeployment::new(*name, package, Vec::<String>::new()).unwrap();
                ((*name).to_string(), deployment)
            })
            .collect();
        let mut graph = Digraph::new();
        for (from, to) in edges {
            graph.add_edge((*from).to_string(), (*to).to_string());
        }
        ChangePlanner::new()
            .with_serialize(serialize)
            .plan(&deployments, &graph, &HashMap::<String, LiveStack>::new())
            .unwrap()
    }

    #[test]
    fn test_plan_hash_deterministic() {
        let hasher = PlanHasher::new();
        for serialize in [false, true] {
            let first = hasher.hash_plan(&plan(&["web", "db", "api"], &[("web", "db")], serialize));
            let second = hasher.hash_plan(&plan(&["api", "db", "web"], &[("web", "db")], serialize));
            assert_eq!(first, second);
            assert_eq!(first.len(), 64);
        }
    }

    #[test]
    fn test_different_plans_different_hash() {
        let hasher = PlanHasher::new();
        let ordered = hasher.hash_plan(&plan(&["web", "db"], &[("web", "db")], false));
        let unordered = hasher.hash_plan(&plan(&["web", "db"], &[], false));
        assert_ne!(ordered, unordered);
    }

    #[test]
    fn test_short_hash() {
        let hasher = PlanHasher::new();
        let short = hasher.short_hash("abcdef1234567890abcdef1234567890");
        assert_eq!(short, "abcdef12");
    }
}
