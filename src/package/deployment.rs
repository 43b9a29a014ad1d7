//! Resolved deployments.
//!
//! A resolved deployment binds a unique name to a package definition and a
//! set of enabled features validated against the features the package
//! declares.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

use crate::error::ResolutionError;

use super::spec::{AttachedProvided, AttachedRequired, FeatureSpec, PackageDefinition};

/// A deployment bound to a concrete package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDeployment {
    /// Unique deployment name.
    pub name: String,
    /// The package this deployment instantiates.
    pub package: PackageDefinition,
    /// Names of enabled features, kept sorted.
    #[serde(default)]
    pub features: BTreeSet<String>,
}

impl ResolvedDeployment {
    /// Resolves a deployment, validating the enabled features.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::UnrecognizedFeature`] if a feature is not
    /// declared by the package.
    pub fn new<I, S>(
        name: impl Into<String>,
        package: PackageDefinition,
        features: I,
    ) -> Result<Self, ResolutionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let deployment = Self {
            name: name.into(),
            package,
            features: features.into_iter().map(Into::into).collect(),
        };
        deployment.enabled_features()?;
        Ok(deployment)
    }

    /// Returns the enabled features with their specs, in sorted name order.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::UnrecognizedFeature`] for the first enabled
    /// feature missing from the package.
    pub fn enabled_features(&self) -> Result<Vec<(&str, &FeatureSpec)>, ResolutionError> {
        self.features
            .iter()
            .map(|name| {
                self.package
                    .features
                    .get(name)
                    .map(|spec| (name.as_str(), spec))
                    .ok_or_else(|| ResolutionError::unrecognized_feature(&self.name, name))
            })
            .collect()
    }

    /// Returns the declared features which are not enabled, sorted.
    #[must_use]
    pub fn disabled_features(&self) -> Vec<&str> {
        let mut disabled: Vec<&str> = self
            .package
            .features
            .keys()
            .filter(|name| !self.features.contains(*name))
            .map(String::as_str)
            .collect();
        disabled.sort_unstable();
        disabled
    }

    /// Provenance prefix for resources declared in `section`.
    fn source(&self, section: &str) -> Vec<String> {
        vec![
            format!("deployment {}", self.name),
            format!("package {}", self.package.path),
            section.to_string(),
        ]
    }

    /// Collects host-level, deployment-level and enabled-feature resources.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::UnrecognizedFeature`] if an enabled feature
    /// is missing from the package.
    pub fn provided_resources(&self) -> Result<AttachedProvided, ResolutionError> {
        let features = self.enabled_features()?;
        let mut provided = AttachedProvided::default();

        self.package
            .host
            .provides
            .attach_into(&mut provided, &self.source("host"));
        self.package
            .deployment
            .provides
            .attach_into(&mut provided, &self.source("deployment"));
        for (name, feature) in features {
            let mut source = self.source("feature");
            source.push(name.to_string());
            feature.provides.attach_into(&mut provided, &source);
        }

        debug!("Deployment {} provides {} resources", self.name, provided.len());
        Ok(provided)
    }

    /// Collects deployment-level and enabled-feature requirements.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::UnrecognizedFeature`] if an enabled feature
    /// is missing from the package.
    pub fn required_resources(&self) -> Result<AttachedRequired, ResolutionError> {
        let features = self.enabled_features()?;
        let mut required = AttachedRequired::default();

        self.package
            .deployment
            .requires
            .attach_into(&mut required, &self.source("deployment"));
        for (name, feature) in features {
            let mut source = self.source("feature");
            source.push(name.to_string());
            feature.requires.attach_into(&mut required, &source);
        }

        debug!("Deployment {} requires {} resources", self.name, required.len());
        Ok(required)
    }

    /// Returns true if the deployment produces an application stack.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::UnrecognizedFeature`] if an enabled feature
    /// is missing from the package.
    pub fn defines_app(&self) -> Result<bool, ResolutionError> {
        let features = self.enabled_features()?;
        Ok(!self.package.deployment.definition_files.is_empty()
            || features
                .iter()
                .any(|(_, feature)| !feature.compose_files.is_empty()))
    }

    /// Lists the container images the deployment references, sorted and deduplicated.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::UnrecognizedFeature`] if an enabled feature
    /// is missing from the package.
    pub fn images(&self) -> Result<Vec<String>, ResolutionError> {
        let mut images: BTreeSet<String> =
            self.package.deployment.images.iter().cloned().collect();
        for (_, feature) in self.enabled_features()? {
            images.extend(feature.images.iter().cloned());
        }
        Ok(images.into_iter().collect())
    }
}
