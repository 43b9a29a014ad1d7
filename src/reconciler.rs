//! Reconciler tying the planning stages together.
//!
//! This module runs the whole pipeline over desired deployments and live
//! stacks: conflict detection, dependency checking, the deployment
//! dependency graph and finally the change plan. Diagnostics are returned as
//! data; the configured policy decides whether they block.

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::config::PlannerConfig;
use crate::constraints::{
    DeploymentConflictReport, MissingDependencies, SatisfiedDependencies, check_all_conflicts,
    check_all_dependencies, resolve_dependency_graph,
};
use crate::error::{ConfigError, ReconcileError, ResolutionError, Result};
use crate::graph::Digraph;
use crate::package::ResolvedDeployment;
use crate::planner::{ChangeKind, ChangePlan, ChangePlanner, LiveStack, PlanHasher, stack_name};

/// Reconciler for desired deployments against live stacks.
#[derive(Debug)]
pub struct Reconciler<'a> {
    /// Desired deployments, in input order.
    deployments: &'a [ResolvedDeployment],
    /// Live stacks by name.
    stacks: &'a HashMap<String, LiveStack>,
    /// Planner settings and policy.
    config: PlannerConfig,
}

/// Reporting view of one desired deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentSummary {
    /// Deployment name.
    pub name: String,
    /// Name of the application stack it maps to.
    pub stack: String,
    /// Whether the deployment produces an application stack.
    pub defines_app: bool,
    /// Enabled features, sorted.
    pub enabled_features: Vec<String>,
    /// Declared but disabled features, sorted.
    pub disabled_features: Vec<String>,
    /// Referenced container images, sorted.
    pub images: Vec<String>,
}

impl DeploymentSummary {
    /// Summarizes a deployment.
    fn of(deployment: &ResolvedDeployment) -> std::result::Result<Self, ResolutionError> {
        Ok(Self {
            name: deployment.name.clone(),
            stack: stack_name(&deployment.name),
            defines_app: deployment.defines_app()?,
            enabled_features: deployment
                .enabled_features()?
                .into_iter()
                .map(|(name, _)| name.to_string())
                .collect(),
            disabled_features: deployment
                .disabled_features()
                .into_iter()
                .map(str::to_string)
                .collect(),
            images: deployment.images()?,
        })
    }
}

/// Everything computed by a reconciliation run.
#[derive(Debug)]
pub struct ReconciliationReport {
    /// Desired deployments, in input order.
    pub deployments: Vec<DeploymentSummary>,
    /// Conflicting deployment pairs.
    pub conflicts: Vec<DeploymentConflictReport>,
    /// Satisfied dependencies, per deployment.
    pub satisfied: Vec<SatisfiedDependencies>,
    /// Missing dependencies, for deployments with any.
    pub missing: Vec<MissingDependencies>,
    /// Deployment dependency graph.
    pub deployment_graph: Digraph<String>,
    /// The change plan.
    pub plan: ChangePlan,
    /// Digest of the plan.
    pub digest: String,
}

impl<'a> Reconciler<'a> {
    /// Creates a new reconciler.
    #[must_use]
    pub const fn new(
        deployments: &'a [ResolvedDeployment],
        stacks: &'a HashMap<String, LiveStack>,
        config: PlannerConfig,
    ) -> Self {
        Self {
            deployments,
            stacks,
            config,
        }
    }

    /// Runs the pipeline and reports every diagnostic.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed input: duplicate deployment names,
    /// undeclared features or stack name collisions.
    pub fn reconcile(&self) -> Result<ReconciliationReport> {
        info!(
            "Reconciling {} deployments against {} live stacks",
            self.deployments.len(),
            self.stacks.len()
        );

        let by_name = self.deployments_by_name()?;
        let deployments = self
            .deployments
            .iter()
            .map(DeploymentSummary::of)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let conflicts = check_all_conflicts(self.deployments)?;
        let (satisfied, missing) = check_all_dependencies(self.deployments)?;
        let deployment_graph = resolve_dependency_graph(&satisfied, self.config.skip_nonblocking);

        let plan = ChangePlanner::new()
            .with_serialize(self.config.serialize)
            .plan(&by_name, &deployment_graph, self.stacks)?;

        let hasher = PlanHasher::new();
        let digest = hasher.hash_plan(&plan);
        info!(
            "Plan {}: {} to add, {} to update, {} to remove",
            hasher.short_hash(&digest),
            plan.count(ChangeKind::Add),
            plan.count(ChangeKind::Update),
            plan.count(ChangeKind::Remove)
        );

        Ok(ReconciliationReport {
            deployments,
            conflicts,
            satisfied,
            missing,
            deployment_graph,
            plan,
            digest,
        })
    }

    /// Runs the pipeline and applies the configured policy.
    ///
    /// # Errors
    ///
    /// Returns [`ReconcileError::Blocked`] if a diagnostic the policy does
    /// not allow is present, or any error from [`Reconciler::reconcile`].
    pub fn reconcile_checked(&self) -> Result<ReconciliationReport> {
        let report = self.reconcile()?;
        let reasons = report.blocking_reasons(&self.config);
        if reasons.is_empty() {
            return Ok(report);
        }
        for reason in &reasons {
            warn!("Blocked: {reason}");
        }
        Err(ReconcileError::blocked(reasons.join("; ")).into())
    }

    /// Keys the deployments by name, rejecting duplicates.
    fn deployments_by_name(&self) -> Result<HashMap<String, ResolvedDeployment>> {
        let mut by_name = HashMap::with_capacity(self.deployments.len());
        for deployment in self.deployments {
            if by_name
                .insert(deployment.name.clone(), deployment.clone())
                .is_some()
            {
                return Err(ConfigError::DuplicateName {
                    resource_type: String::from("deployment"),
                    name: deployment.name.clone(),
                }
                .into());
            }
        }
        debug!("Indexed {} deployments", by_name.len());
        Ok(by_name)
    }
}

impl ReconciliationReport {
    /// Reasons the policy refuses this report; empty if it may proceed.
    #[must_use]
    pub fn blocking_reasons(&self, config: &PlannerConfig) -> Vec<String> {
        let mut reasons = Vec::new();
        if !config.allow_conflicts && !self.conflicts.is_empty() {
            reasons.push(format!("{} conflicting deployment pairs", self.conflicts.len()));
        }
        if !config.allow_missing_dependencies && !self.missing.is_empty() {
            let count: usize = self.missing.iter().map(MissingDependencies::len).sum();
            reasons.push(format!(
                "{count} missing dependencies across {} deployments",
                self.missing.len()
            ));
        }
        if !config.allow_cycles && self.plan.has_cycles() {
            reasons.push(format!("{} dependency cycles", self.plan.cycles.len()));
        }
        reasons
    }

    /// Returns true if there are no conflicts, missing dependencies or cycles.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty() && self.missing.is_empty() && !self.plan.has_cycles()
    }
}

impl std::fmt::Display for ReconciliationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.is_clean() { "clean" } else { "with diagnostics" };
        writeln!(f, "Reconciliation plan {status}:")?;
        writeln!(f, "  Add: {}", self.plan.count(ChangeKind::Add))?;
        writeln!(f, "  Update: {}", self.plan.count(ChangeKind::Update))?;
        writeln!(f, "  Remove: {}", self.plan.count(ChangeKind::Remove))?;
        writeln!(f, "  Conflicts: {}", self.conflicts.len())?;
        writeln!(f, "  Missing dependencies: {}", self.missing.len())?;
        writeln!(f, "  Cycles: {}", self.plan.cycles.len())?;
        write!(f, "  Digest: {}", self.digest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StackplanError;
    use crate::package::{DeploymentSpec, PackageDefinition, ProvidedResources, RequiredResources};
    use crate::planner::{ChangeId, identify_changes};
    use crate::resources::{ListenerResource, NetworkResource};

    fn network(name: &str) -> NetworkResource {
        NetworkResource {
            name: name.to_string(),
            ..NetworkResource::default()
        }
    }

    fn deployment(name: &str, provides: ProvidedResources, requires: RequiredResources) -> ResolvedDeployment {
        let package = PackageDefinition {
            path: format!("example.com/{name}"),
            deployment: DeploymentSpec {
                definition_files: vec![String::from("compose.yml")],
                provides,
                requires,
                ..DeploymentSpec::default()
            },
            ..PackageDefinition::default()
        };
        ResolvedDeployment::new(name, package, Vec::<String>::new()).unwrap()
    }

    fn web_and_db() -> Vec<ResolvedDeployment> {
        vec![
            deployment(
                "web",
                ProvidedResources::default(),
                RequiredResources {
                    networks: vec![network("backend")],
                    ..RequiredResources::default()
                },
            ),
            deployment(
                "db",
                ProvidedResources {
                    networks: vec![network("backend")],
                    ..ProvidedResources::default()
                },
                RequiredResources::default(),
            ),
        ]
    }

    fn listener(port: u16) -> ProvidedResources {
        ProvidedResources {
            listeners: vec![ListenerResource {
                port,
                protocol: String::from("tcp"),
                ..ListenerResource::default()
            }],
            ..ProvidedResources::default()
        }
    }

    #[test]
    fn test_reconcile_web_depends_on_db() {
        let deployments = web_and_db();
        let stacks = HashMap::new();
        let config = PlannerConfig::default().with_serialize(true);
        let report = Reconciler::new(&deployments, &stacks, config)
            .reconcile()
            .unwrap();

        assert!(report.is_clean());
        assert!(report
            .deployment_graph
            .has_edge(&String::from("web"), &String::from("db")));
        assert!(report
            .plan
            .pruned
            .has_edge(&ChangeId::new("web"), &ChangeId::new("db")));
        assert_eq!(
            report.plan.order,
            Some(vec![ChangeId::new("db"), ChangeId::new("web")])
        );
        assert_eq!(report.digest.len(), 64);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let deployments = web_and_db();
        let mut stacks = HashMap::new();
        stacks.insert(String::from("cache"), LiveStack::new("cache"));
        let reconciler = Reconciler::new(&deployments, &stacks, PlannerConfig::default());

        let first = reconciler.reconcile().unwrap();
        let second = reconciler.reconcile().unwrap();
        assert_eq!(first.digest, second.digest);
        assert_eq!(first.plan.changes, second.plan.changes);
        assert_eq!(first.plan.pruned, second.plan.pruned);
    }

    #[test]
    fn test_undeclared_feature_aborts_every_stage() {
        let mut deployments = web_and_db();
        deployments[0].features.insert(String::from("ghost"));
        let unrecognized = |err: &ResolutionError| {
            matches!(err, ResolutionError::UnrecognizedFeature { deployment, feature }
                if deployment == "web" && feature == "ghost")
        };

        assert!(check_all_conflicts(&deployments).is_err_and(|e| unrecognized(&e)));
        assert!(check_all_dependencies(&deployments).is_err_and(|e| unrecognized(&e)));

        let by_name: HashMap<String, ResolvedDeployment> = deployments
            .iter()
            .map(|d| (d.name.clone(), d.clone()))
            .collect();
        let stacks = HashMap::new();
        assert!(matches!(
            identify_changes(&by_name, &stacks),
            Err(StackplanError::Resolution(ref e)) if unrecognized(e)
        ));
        assert!(matches!(
            Reconciler::new(&deployments, &stacks, PlannerConfig::default()).reconcile(),
            Err(StackplanError::Resolution(ref e)) if unrecognized(e)
        ));
    }

    #[test]
    fn test_report_summarizes_deployments() {
        let deployments = web_and_db();
        let stacks = HashMap::new();
        let report = Reconciler::new(&deployments, &stacks, PlannerConfig::default())
            .reconcile()
            .unwrap();
        let names: Vec<&str> = report.deployments.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["web", "db"]);
        assert!(report.deployments[0].defines_app);
        assert_eq!(report.deployments[0].stack, "web");
        assert!(report.deployments[0].images.is_empty());
    }

    #[test]
    fn test_duplicate_deployment_rejected() {
        let deployments = vec![
            deployment("web", ProvidedResources::default(), RequiredResources::default()),
            deployment("web", ProvidedResources::default(), RequiredResources::default()),
        ];
        let stacks = HashMap::new();
        let result = Reconciler::new(&deployments, &stacks, PlannerConfig::default()).reconcile();
        assert!(matches!(
            result,
            Err(StackplanError::Config(ConfigError::DuplicateName { .. }))
        ));
    }

    #[test]
    fn test_policy_blocks_conflicts() {
        let deployments = vec![
            deployment("a", listener(80), RequiredResources::default()),
            deployment("b", listener(80), RequiredResources::default()),
        ];
        let stacks = HashMap::new();

        let lenient = Reconciler::new(&deployments, &stacks, PlannerConfig::default());
        let report = lenient.reconcile_checked().unwrap();
        assert_eq!(report.conflicts.len(), 1);

        let strict = Reconciler::new(&deployments, &stacks, PlannerConfig::strict());
        assert!(matches!(
            strict.reconcile_checked(),
            Err(StackplanError::Reconcile(ReconcileError::Blocked { .. }))
        ));
    }

    #[test]
    fn test_policy_blocks_missing_dependencies() {
        let deployments = vec![deployment(
            "web",
            ProvidedResources::default(),
            RequiredResources {
                networks: vec![network("backend")],
                ..RequiredResources::default()
            },
        )];
        let stacks = HashMap::new();
        let report = Reconciler::new(&deployments, &stacks, PlannerConfig::default())
            .reconcile()
            .unwrap();
        assert_eq!(report.missing.len(), 1);
        assert!(report.blocking_reasons(&PlannerConfig::default()).is_empty());
        assert_eq!(report.blocking_reasons(&PlannerConfig::strict()).len(), 1);
    }
}
