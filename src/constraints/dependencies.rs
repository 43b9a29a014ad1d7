//! Dependency checking between deployments and the deployment dependency graph.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ResolutionError;
use crate::graph::Digraph;
use crate::package::{AttachedProvided, ResolvedDeployment};
use crate::resources::{
    Attached, FilesetResource, MissingDependency, NetworkResource, ProviderResources, Resource,
    ResourceCheck, SatisfiedDependency, ServiceResource, check_dependencies as check_resource_dependencies,
    split_by_path,
};

/// Requirements of one deployment which were satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SatisfiedDependencies {
    /// Name of the dependent deployment.
    pub deployment: String,
    /// Satisfied network requirements.
    pub networks: Vec<SatisfiedDependency<NetworkResource>>,
    /// Satisfied service requirements, one per path.
    pub services: Vec<SatisfiedDependency<ServiceResource>>,
    /// Satisfied fileset requirements, one per path.
    pub filesets: Vec<SatisfiedDependency<FilesetResource>>,
}

/// Requirements of one deployment which no candidate satisfies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingDependencies {
    /// Name of the dependent deployment.
    pub deployment: String,
    /// Missing network requirements.
    pub networks: Vec<MissingDependency<NetworkResource>>,
    /// Missing service requirements, one per path.
    pub services: Vec<MissingDependency<ServiceResource>>,
    /// Missing fileset requirements, one per path.
    pub filesets: Vec<MissingDependency<FilesetResource>>,
}

/// Outcome of checking one deployment's requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyCheck {
    /// Satisfied requirements.
    pub satisfied: SatisfiedDependencies,
    /// Missing requirements.
    pub missing: MissingDependencies,
}

impl SatisfiedDependencies {
    /// Number of satisfied requirements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.networks.len() + self.services.len() + self.filesets.len()
    }

    /// Returns true if no requirement was satisfied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the providers this deployment must wait for.
    ///
    /// Self-provided requirements are skipped, and nonblocking service and
    /// fileset requirements are skipped when `skip_nonblocking` is set.
    fn blocking_providers(&self, skip_nonblocking: bool) -> Vec<&str> {
        fn providers<T: ResourceCheck>(
            satisfied: &[SatisfiedDependency<T>],
            skip_nonblocking: bool,
        ) -> impl Iterator<Item = &str> {
            satisfied
                .iter()
                .filter(move |dependency| !(skip_nonblocking && dependency.required.resource.is_nonblocking()))
                .map(|dependency| dependency.provider.as_str())
        }

        providers(&self.networks, skip_nonblocking)
            .chain(providers(&self.services, skip_nonblocking))
            .chain(providers(&self.filesets, skip_nonblocking))
            .filter(|provider| *provider != self.deployment)
            .collect()
    }
}

impl MissingDependencies {
    /// Number of missing requirements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.networks.len() + self.services.len() + self.filesets.len()
    }

    /// Returns true if nothing is missing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All missing requirements, widened to the tagged union.
    #[must_use]
    pub fn widened(&self) -> Vec<MissingDependency<Resource>> {
        let networks = self.networks.iter().cloned().map(MissingDependency::widen);
        let services = self.services.iter().cloned().map(MissingDependency::widen);
        let filesets = self.filesets.iter().cloned().map(MissingDependency::widen);
        networks.chain(services).chain(filesets).collect()
    }
}

/// Checks one kind of requirement against every candidate's provided resources.
fn check_kind<T: ResourceCheck>(
    required: &[Attached<T>],
    candidates: &[(&ResolvedDeployment, AttachedProvided)],
    select: impl Fn(&AttachedProvided) -> &[Attached<T>],
) -> (Vec<SatisfiedDependency<T>>, Vec<MissingDependency<T>>) {
    let providers: Vec<ProviderResources<'_, T>> = candidates
        .iter()
        .map(|(candidate, provided)| (candidate.name.as_str(), select(provided)))
        .collect();
    check_resource_dependencies(required, &providers)
}

/// Checks a deployment's requirements against the candidates' provided resources.
///
/// The deployment itself may appear among the candidates; requirements it
/// satisfies on its own count as satisfied. Multi-path service and fileset
/// requirements are split into one requirement per path first, so different
/// providers may satisfy different paths.
///
/// # Errors
///
/// Returns [`ResolutionError::UnrecognizedFeature`] if the deployment or any
/// candidate enables a feature its package does not declare.
pub fn check_dependencies(
    deployment: &ResolvedDeployment,
    candidates: &[ResolvedDeployment],
) -> Result<DependencyCheck, ResolutionError> {
    let required = deployment.required_resources()?;
    let provided = candidates
        .iter()
        .map(|candidate| candidate.provided_resources().map(|provided| (candidate, provided)))
        .collect::<Result<Vec<_>, _>>()?;

    let services = split_by_path(&required.services);
    let filesets = split_by_path(&required.filesets);

    let (satisfied_networks, missing_networks) =
        check_kind(&required.networks, &provided, |p| p.networks.as_slice());
    let (satisfied_services, missing_services) = check_kind(&services, &provided, |p| p.services.as_slice());
    let (satisfied_filesets, missing_filesets) = check_kind(&filesets, &provided, |p| p.filesets.as_slice());

    let check = DependencyCheck {
        satisfied: SatisfiedDependencies {
            deployment: deployment.name.clone(),
            networks: satisfied_networks,
            services: satisfied_services,
            filesets: satisfied_filesets,
        },
        missing: MissingDependencies {
            deployment: deployment.name.clone(),
            networks: missing_networks,
            services: missing_services,
            filesets: missing_filesets,
        },
    };

    if check.missing.is_empty() {
        debug!(
            "Deployment {} has all {} dependencies satisfied",
            deployment.name,
            check.satisfied.len()
        );
    } else {
        warn!(
            "Deployment {} has {} missing dependencies",
            deployment.name,
            check.missing.len()
        );
    }
    Ok(check)
}

/// Checks every deployment against the whole set.
///
/// Returns the satisfied reports for every deployment, and the missing
/// reports of deployments with at least one missing requirement.
///
/// # Errors
///
/// Returns [`ResolutionError::UnrecognizedFeature`] for the first deployment
/// enabling an undeclared feature.
pub fn check_all_dependencies(
    deployments: &[ResolvedDeployment],
) -> Result<(Vec<SatisfiedDependencies>, Vec<MissingDependencies>), ResolutionError> {
    let mut satisfied = Vec::with_capacity(deployments.len());
    let mut missing = Vec::new();
    for deployment in deployments {
        let check = check_dependencies(deployment, deployments)?;
        satisfied.push(check.satisfied);
        if !check.missing.is_empty() {
            missing.push(check.missing);
        }
    }
    Ok((satisfied, missing))
}

/// Builds the deployment-level dependency graph from satisfied dependencies.
///
/// Every reported deployment becomes a node, and each satisfied network,
/// service or fileset requirement adds an edge from the dependent to its
/// provider. Self-edges are never added; nonblocking requirements are left
/// out when `skip_nonblocking` is set.
#[must_use]
pub fn resolve_dependency_graph(
    satisfied: &[SatisfiedDependencies],
    skip_nonblocking: bool,
) -> Digraph<String> {
    let mut graph = Digraph::new();
    for report in satisfied {
        graph.add_node(report.deployment.clone());
        for provider in report.blocking_providers(skip_nonblocking) {
            graph.add_edge(report.deployment.clone(), provider.to_string());
        }
    }
    debug!(
        "Deployment dependency graph has {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    graph
}
