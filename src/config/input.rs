//! Plan input document.
//!
//! The input document carries what the surrounding tooling hands the
//! planner: planner settings, the resolved deployments and a snapshot of
//! the live stacks.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{ConfigError, ResolutionError, Result};
use crate::package::{PackageDefinition, ResolvedDeployment};
use crate::planner::LiveStack;

use super::settings::PlannerConfig;

/// Root of the input document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanInput {
    /// Planner settings.
    #[serde(default)]
    pub settings: PlannerConfig,
    /// Desired deployments.
    #[serde(default)]
    pub deployments: Vec<DeploymentInput>,
    /// Live application stacks.
    #[serde(default)]
    pub stacks: Vec<LiveStack>,
}

/// A desired deployment in the input document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentInput {
    /// Deployment name.
    pub name: String,
    /// The package the deployment instantiates.
    pub package: PackageDefinition,
    /// Enabled feature names.
    #[serde(default)]
    pub features: Vec<String>,
}

impl DeploymentInput {
    /// Resolves the deployment, validating its features.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::UnrecognizedFeature`] if a feature is not
    /// declared by the package.
    pub fn resolve(&self) -> std::result::Result<ResolvedDeployment, ResolutionError> {
        ResolvedDeployment::new(&self.name, self.package.clone(), self.features.iter().cloned())
    }
}

impl PlanInput {
    /// Resolves every deployment, in input order.
    ///
    /// # Errors
    ///
    /// Returns the first resolution error.
    pub fn resolve_deployments(&self) -> Result<Vec<ResolvedDeployment>> {
        Ok(self
            .deployments
            .iter()
            .map(DeploymentInput::resolve)
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Live stacks keyed by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateName`] if two stacks share a name.
    pub fn stacks_by_name(&self) -> Result<HashMap<String, LiveStack>> {
        let mut stacks = HashMap::with_capacity(self.stacks.len());
        for stack in &self.stacks {
            if stacks.insert(stack.name.clone(), stack.clone()).is_some() {
                return Err(ConfigError::DuplicateName {
                    resource_type: String::from("stack"),
                    name: stack.name.clone(),
                }
                .into());
            }
        }
        Ok(stacks)
    }
}
