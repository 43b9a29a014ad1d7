//! Reconciliation changes between desired deployments and live stacks.
//!
//! A deployment maps to exactly one application stack, named by
//! [`stack_name`]. Diffing the desired deployments against the live stacks
//! yields one change per affected stack:
//! - `Add` for an application deployment without a live stack
//! - `Update` for an application deployment with a live stack
//! - `Remove` for a live stack no application deployment maps to

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::error::{PlanError, Result};
use crate::package::ResolvedDeployment;

/// A live application stack on the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveStack {
    /// Stack name.
    pub name: String,
    /// Opaque stack state, passed through unmodified.
    #[serde(default)]
    pub state: serde_json::Value,
}

impl LiveStack {
    /// Creates a live stack with no state.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: serde_json::Value::Null,
        }
    }
}

/// Maps a deployment name to its application stack name.
#[must_use]
pub fn stack_name(deployment: &str) -> String {
    deployment.replace('/', "_")
}

/// Identity of a change: the name of the stack it targets.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeId(String);

impl ChangeId {
    /// Creates a change identity from a stack name.
    #[must_use]
    pub fn new(stack: impl Into<String>) -> Self {
        Self(stack.into())
    }

    /// The targeted stack name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChangeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of a reconciliation change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Create a new stack.
    Add,
    /// Update an existing stack.
    Update,
    /// Remove an existing stack.
    Remove,
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Add => "add",
            Self::Update => "update",
            Self::Remove => "remove",
        };
        write!(f, "{s}")
    }
}

/// A change needed to bring live stacks in line with desired deployments.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReconciliationChange {
    /// Create the stack for a deployment.
    Add {
        /// Target stack name.
        name: String,
        /// The deployment to create.
        deployment: ResolvedDeployment,
    },
    /// Update the live stack of a deployment.
    Update {
        /// Target stack name.
        name: String,
        /// The desired deployment.
        deployment: ResolvedDeployment,
        /// The live stack being replaced.
        stack: LiveStack,
    },
    /// Remove a live stack.
    Remove {
        /// Target stack name.
        name: String,
        /// The live stack being removed.
        stack: LiveStack,
    },
}

impl ReconciliationChange {
    /// The targeted stack name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Add { name, .. } | Self::Update { name, .. } | Self::Remove { name, .. } => name,
        }
    }

    /// The change identity.
    #[must_use]
    pub fn id(&self) -> ChangeId {
        ChangeId::new(self.name())
    }

    /// The change kind.
    #[must_use]
    pub const fn kind(&self) -> ChangeKind {
        match self {
            Self::Add { .. } => ChangeKind::Add,
            Self::Update { .. } => ChangeKind::Update,
            Self::Remove { .. } => ChangeKind::Remove,
        }
    }

    /// The desired deployment, for adds and updates.
    #[must_use]
    pub const fn deployment(&self) -> Option<&ResolvedDeployment> {
        match self {
            Self::Add { deployment, .. } | Self::Update { deployment, .. } => Some(deployment),
            Self::Remove { .. } => None,
        }
    }

    /// The live stack, for updates and removals.
    #[must_use]
    pub const fn stack(&self) -> Option<&LiveStack> {
        match self {
            Self::Update { stack, .. } | Self::Remove { stack, .. } => Some(stack),
            Self::Add { .. } => None,
        }
    }

    /// Name used to break ordering ties: the deployment name, or the stack
    /// name for removals.
    #[must_use]
    pub fn sort_name(&self) -> &str {
        self.deployment()
            .map_or_else(|| self.name(), |deployment| deployment.name.as_str())
    }
}

impl std::fmt::Display for ReconciliationChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind(), self.name())?;
        if let Some(deployment) = self.deployment() {
            if deployment.name != self.name() {
                write!(f, " (deployment {})", deployment.name)?;
            }
        }
        Ok(())
    }
}

/// Maps every deployment to its stack name, rejecting collisions.
fn deployments_by_stack(
    deployments: &HashMap<String, ResolvedDeployment>,
) -> Result<BTreeMap<String, &ResolvedDeployment>> {
    let mut sorted: Vec<&ResolvedDeployment> = deployments.values().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    let mut by_stack: BTreeMap<String, &ResolvedDeployment> = BTreeMap::new();
    for deployment in sorted {
        let stack = stack_name(&deployment.name);
        if let Some(existing) = by_stack.get(&stack) {
            return Err(PlanError::StackNameCollision {
                stack,
                first: existing.name.clone(),
                second: deployment.name.clone(),
            }
            .into());
        }
        by_stack.insert(stack, deployment);
    }
    Ok(by_stack)
}

/// Diffs desired deployments against live stacks.
///
/// Changes are returned sorted by stack name.
///
/// # Errors
///
/// Returns [`PlanError::StackNameCollision`] if two deployments map to one
/// stack name, or a resolution error if a deployment enables an undeclared
/// feature.
pub fn identify_changes(
    deployments: &HashMap<String, ResolvedDeployment>,
    stacks: &HashMap<String, LiveStack>,
) -> Result<Vec<ReconciliationChange>> {
    let by_stack = deployments_by_stack(deployments)?;

    let mut apps: BTreeMap<&str, &ResolvedDeployment> = BTreeMap::new();
    for (stack, deployment) in &by_stack {
        if deployment.defines_app()? {
            apps.insert(stack.as_str(), deployment);
        } else {
            debug!("Deployment {} defines no application", deployment.name);
        }
    }

    let mut changes = Vec::new();
    for (stack, deployment) in &apps {
        let change = match stacks.get(*stack) {
            Some(live) => ReconciliationChange::Update {
                name: (*stack).to_string(),
                deployment: (*deployment).clone(),
                stack: live.clone(),
            },
            None => ReconciliationChange::Add {
                name: (*stack).to_string(),
                deployment: (*deployment).clone(),
            },
        };
        info!("Identified change: {change}");
        changes.push(change);
    }

    let mut live: Vec<(&String, &LiveStack)> = stacks.iter().collect();
    live.sort_by(|a, b| a.0.cmp(b.0));
    for (name, stack) in live {
        if !apps.contains_key(name.as_str()) {
            let change = ReconciliationChange::Remove {
                name: name.clone(),
                stack: stack.clone(),
            };
            info!("Identified change: {change}");
            changes.push(change);
        }
    }

    changes.sort_by(|a, b| a.name().cmp(b.name()));
    debug!("Identified {} changes", changes.len());
    Ok(changes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StackplanError;
    use crate::package::{DeploymentSpec, PackageDefinition};

    fn deployment(name: &str, app: bool) -> ResolvedDeployment {
        let definition_files = if app {
            vec![String::from("compose.yml")]
        } else {
            vec![]
        };
        let package = PackageDefinition {
            path: format!("example.com/{name}"),
            deployment: DeploymentSpec {
                definition_files,
                ..DeploymentSpec::default()
            },
            ..PackageDefinition::default()
        };
        ResolvedDeployment::new(name, package, Vec::<String>::new()).unwrap()
    }

    fn desired(items: &[(&str, bool)]) -> HashMap<String, ResolvedDeployment> {
        items
            .iter()
            .map(|(name, app)| ((*name).to_string(), deployment(name, *app)))
            .collect()
    }

    fn live(names: &[&str]) -> HashMap<String, LiveStack> {
        names
            .iter()
            .map(|name| ((*name).to_string(), LiveStack::new(*name)))
            .collect()
    }

    fn summary(changes: &[ReconciliationChange]) -> Vec<(ChangeKind, &str)> {
        changes.iter().map(|c| (c.kind(), c.name())).collect()
    }

    #[test]
    fn test_stack_name_mapping() {
        assert_eq!(stack_name("web"), "web");
        assert_eq!(stack_name("infra/caddy"), "infra_caddy");
    }

    #[test]
    fn test_add_and_update() {
        let changes =
            identify_changes(&desired(&[("web", true), ("db", true)]), &live(&["web"])).unwrap();
        assert_eq!(
            summary(&changes),
            vec![(ChangeKind::Add, "db"), (ChangeKind::Update, "web")]
        );
        assert_eq!(changes[1].stack().map(|s| s.name.as_str()), Some("web"));
    }

    #[test]
    fn test_orphan_stack_is_removed() {
        let changes = identify_changes(
            &desired(&[("web", true), ("db", true)]),
            &live(&["web", "cache"]),
        )
        .unwrap();
        assert_eq!(
            summary(&changes),
            vec![
                (ChangeKind::Remove, "cache"),
                (ChangeKind::Add, "db"),
                (ChangeKind::Update, "web")
            ]
        );
        assert!(changes[0].deployment().is_none());
        assert_eq!(changes[0].sort_name(), "cache");
    }

    #[test]
    fn test_stacks_are_matched_by_key() {
        let mut stacks = HashMap::new();
        stacks.insert(String::from("web"), LiveStack::new("web-legacy"));
        let changes = identify_changes(&desired(&[("web", true)]), &stacks).unwrap();
        assert_eq!(summary(&changes), vec![(ChangeKind::Update, "web")]);
        assert_eq!(changes[0].stack().map(|s| s.name.as_str()), Some("web-legacy"));

        let changes = identify_changes(&desired(&[]), &stacks).unwrap();
        assert_eq!(summary(&changes), vec![(ChangeKind::Remove, "web")]);
    }

    #[test]
    fn test_non_app_deployment() {
        // No stack: nothing to do.
        let changes = identify_changes(&desired(&[("base", false)]), &live(&[])).unwrap();
        assert!(changes.is_empty());

        // Live stack of a deployment that no longer defines an app.
        let changes = identify_changes(&desired(&[("base", false)]), &live(&["base"])).unwrap();
        assert_eq!(summary(&changes), vec![(ChangeKind::Remove, "base")]);
    }

    #[test]
    fn test_mapped_names_are_used() {
        let changes =
            identify_changes(&desired(&[("infra/caddy", true)]), &live(&["infra_caddy"])).unwrap();
        assert_eq!(summary(&changes), vec![(ChangeKind::Update, "infra_caddy")]);
        assert_eq!(changes[0].sort_name(), "infra/caddy");
        assert_eq!(changes[0].to_string(), "update infra_caddy (deployment infra/caddy)");
    }

    #[test]
    fn test_stack_name_collision_rejected() {
        let result = identify_changes(&desired(&[("a/b", true), ("a_b", true)]), &live(&[]));
        match result {
            Err(StackplanError::Plan(PlanError::StackNameCollision { stack, first, second })) => {
                assert_eq!(stack, "a_b");
                assert_eq!(first, "a/b");
                assert_eq!(second, "a_b");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_live_state_passes_through() {
        let mut stacks = live(&[]);
        stacks.insert(
            String::from("web"),
            LiveStack {
                name: String::from("web"),
                state: serde_json::json!({"containers": 3}),
            },
        );
        let changes = identify_changes(&desired(&[("web", true)]), &stacks).unwrap();
        assert_eq!(
            changes[0].stack().map(|s| s.state.clone()),
            Some(serde_json::json!({"containers": 3}))
        );
    }
}
