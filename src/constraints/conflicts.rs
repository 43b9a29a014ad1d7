//! Conflict detection between deployments.

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ResolutionError;
use crate::package::{AttachedProvided, ResolvedDeployment};
use crate::resources::{
    FileExportResource, FilesetResource, ListenerResource, NetworkResource, Resource,
    ResourceConflict, ServiceResource, check_conflicts as check_resource_conflicts,
};

/// Conflicts found between one ordered pair of deployments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeploymentConflictReport {
    /// Name of the first deployment.
    pub first: String,
    /// Name of the second deployment.
    pub second: String,
    /// Whether both deployments share a name.
    pub name: bool,
    /// Conflicting listeners.
    pub listeners: Vec<ResourceConflict<ListenerResource>>,
    /// Conflicting networks.
    pub networks: Vec<ResourceConflict<NetworkResource>>,
    /// Conflicting services.
    pub services: Vec<ResourceConflict<ServiceResource>>,
    /// Conflicting filesets.
    pub filesets: Vec<ResourceConflict<FilesetResource>>,
    /// Conflicting file exports.
    pub file_exports: Vec<ResourceConflict<FileExportResource>>,
}

impl DeploymentConflictReport {
    /// Builds the report for a pair of deployments.
    fn between(
        first: &ResolvedDeployment,
        first_provided: &AttachedProvided,
        second: &ResolvedDeployment,
        second_provided: &AttachedProvided,
    ) -> Self {
        Self {
            first: first.name.clone(),
            second: second.name.clone(),
            name: first.name == second.name,
            listeners: check_resource_conflicts(&first_provided.listeners, &second_provided.listeners),
            networks: check_resource_conflicts(&first_provided.networks, &second_provided.networks),
            services: check_resource_conflicts(&first_provided.services, &second_provided.services),
            filesets: check_resource_conflicts(&first_provided.filesets, &second_provided.filesets),
            file_exports: check_resource_conflicts(
                &first_provided.file_exports,
                &second_provided.file_exports,
            ),
        }
    }

    /// Returns true if any resource conflicts.
    #[must_use]
    pub fn has_resource_conflict(&self) -> bool {
        self.resource_conflict_count() > 0
    }

    /// Returns true if the deployments collide on name or on any resource.
    #[must_use]
    pub fn has_conflict(&self) -> bool {
        self.name || self.has_resource_conflict()
    }

    /// Number of conflicting resource pairs.
    #[must_use]
    pub fn resource_conflict_count(&self) -> usize {
        self.listeners.len()
            + self.networks.len()
            + self.services.len()
            + self.filesets.len()
            + self.file_exports.len()
    }

    /// All resource conflicts, widened to the tagged union.
    #[must_use]
    pub fn resource_conflicts(&self) -> Vec<ResourceConflict<Resource>> {
        let listeners = self.listeners.iter().cloned().map(ResourceConflict::widen);
        let networks = self.networks.iter().cloned().map(ResourceConflict::widen);
        let services = self.services.iter().cloned().map(ResourceConflict::widen);
        let filesets = self.filesets.iter().cloned().map(ResourceConflict::widen);
        let file_exports = self.file_exports.iter().cloned().map(ResourceConflict::widen);
        listeners
            .chain(networks)
            .chain(services)
            .chain(filesets)
            .chain(file_exports)
            .collect()
    }
}

/// Checks a deployment against the candidates that follow it.
///
/// If `deployment` is an element of `candidates` (or equal to one), only the
/// candidates after it are checked, so running this for every element checks
/// each unordered pair once. Otherwise every candidate is checked. Reports without any
/// conflict are discarded.
///
/// # Errors
///
/// Returns [`ResolutionError::UnrecognizedFeature`] if either side enables a
/// feature its package does not declare.
pub fn check_conflicts(
    deployment: &ResolvedDeployment,
    candidates: &[ResolvedDeployment],
) -> Result<Vec<DeploymentConflictReport>, ResolutionError> {
    let start = candidates
        .iter()
        .position(|candidate| std::ptr::eq(candidate, deployment))
        .or_else(|| candidates.iter().position(|candidate| candidate == deployment))
        .map_or(0, |index| index + 1);

    let provided = deployment.provided_resources()?;
    let mut reports = Vec::new();
    for candidate in &candidates[start..] {
        let candidate_provided = candidate.provided_resources()?;
        let report =
            DeploymentConflictReport::between(deployment, &provided, candidate, &candidate_provided);
        if report.has_conflict() {
            warn!(
                "Deployments {} and {} conflict ({} resources{})",
                report.first,
                report.second,
                report.resource_conflict_count(),
                if report.name { ", same name" } else { "" }
            );
            reports.push(report);
        }
    }
    Ok(reports)
}

/// Checks every unordered pair of deployments once.
///
/// # Errors
///
/// Returns [`ResolutionError::UnrecognizedFeature`] for the first deployment
/// enabling an undeclared feature.
pub fn check_all_conflicts(
    deployments: &[ResolvedDeployment],
) -> Result<Vec<DeploymentConflictReport>, ResolutionError> {
    let mut reports = Vec::new();
    for deployment in deployments {
        reports.extend(check_conflicts(deployment, deployments)?);
    }
    debug!(
        "Checked {} deployments for conflicts, {} conflicting pairs",
        deployments.len(),
        reports.len()
    );
    Ok(reports)
}
