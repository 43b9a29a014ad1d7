//! Package definition types.
//!
//! These structs describe what a package declares: resources provided at
//! host level, the deployment section with its own provided and required
//! resources, and optional features layering more resources on top.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::resources::{
    Attached, FileExportResource, FilesetResource, ListenerResource, NetworkResource,
    ServiceResource,
};

/// A package definition, as bound to a deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageDefinition {
    /// Package path, e.g. `github.com/org/pallet/caddy`.
    pub path: String,
    /// Human-readable description.
    pub description: String,
    /// Resources the host provides when this package is present.
    pub host: HostSpec,
    /// The deployment section.
    pub deployment: DeploymentSpec,
    /// Optional features by name.
    pub features: HashMap<String, FeatureSpec>,
}

/// Host-level section of a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSpec {
    /// Host tags.
    pub tags: Vec<String>,
    /// Resources already present on the host.
    pub provides: ProvidedResources,
}

/// Deployment section of a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentSpec {
    /// Stack definition files; a deployment without any defines no application.
    pub definition_files: Vec<String>,
    /// Container images referenced by the stack definition.
    pub images: Vec<String>,
    /// Resources provided by the deployment.
    pub provides: ProvidedResources,
    /// Resources required by the deployment.
    pub requires: RequiredResources,
}

/// An optional feature of a package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureSpec {
    /// Human-readable description.
    pub description: String,
    /// Extra stack definition files merged in when the feature is enabled.
    pub compose_files: Vec<String>,
    /// Container images referenced by the extra files.
    pub images: Vec<String>,
    /// Resources provided when enabled.
    pub provides: ProvidedResources,
    /// Resources required when enabled.
    pub requires: RequiredResources,
}

/// Resources a section provides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidedResources {
    /// Host port listeners.
    pub listeners: Vec<ListenerResource>,
    /// Networks.
    pub networks: Vec<NetworkResource>,
    /// Services.
    pub services: Vec<ServiceResource>,
    /// Filesets.
    pub filesets: Vec<FilesetResource>,
    /// File exports.
    pub file_exports: Vec<FileExportResource>,
}

/// Resources a section requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequiredResources {
    /// Networks.
    pub networks: Vec<NetworkResource>,
    /// Services.
    pub services: Vec<ServiceResource>,
    /// Filesets.
    pub filesets: Vec<FilesetResource>,
}

/// Provided resources of one deployment, with provenance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachedProvided {
    /// Host port listeners.
    pub listeners: Vec<Attached<ListenerResource>>,
    /// Networks.
    pub networks: Vec<Attached<NetworkResource>>,
    /// Services.
    pub services: Vec<Attached<ServiceResource>>,
    /// Filesets.
    pub filesets: Vec<Attached<FilesetResource>>,
    /// File exports.
    pub file_exports: Vec<Attached<FileExportResource>>,
}

/// Required resources of one deployment, with provenance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttachedRequired {
    /// Networks.
    pub networks: Vec<Attached<NetworkResource>>,
    /// Services.
    pub services: Vec<Attached<ServiceResource>>,
    /// Filesets.
    pub filesets: Vec<Attached<FilesetResource>>,
}

fn attach_all<T: Clone>(resources: &[T], source: &[String]) -> Vec<Attached<T>> {
    resources
        .iter()
        .map(|resource| Attached::new(resource.clone(), source.to_vec()))
        .collect()
}

impl ProvidedResources {
    /// Returns true if nothing is provided.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
            && self.networks.is_empty()
            && self.services.is_empty()
            && self.filesets.is_empty()
            && self.file_exports.is_empty()
    }

    /// Appends these resources to `target`, attributed to `source`.
    pub fn attach_into(&self, target: &mut AttachedProvided, source: &[String]) {
        target.listeners.extend(attach_all(&self.listeners, source));
        target.networks.extend(attach_all(&self.networks, source));
        target.services.extend(attach_all(&self.services, source));
        target.filesets.extend(attach_all(&self.filesets, source));
        target.file_exports.extend(attach_all(&self.file_exports, source));
    }
}

impl RequiredResources {
    /// Returns true if nothing is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty() && self.services.is_empty() && self.filesets.is_empty()
    }

    /// Appends these resources to `target`, attributed to `source`.
    pub fn attach_into(&self, target: &mut AttachedRequired, source: &[String]) {
        target.networks.extend(attach_all(&self.networks, source));
        target.services.extend(attach_all(&self.services, source));
        target.filesets.extend(attach_all(&self.filesets, source));
    }
}

impl AttachedProvided {
    /// Total number of provided resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.len()
            + self.networks.len()
            + self.services.len()
            + self.filesets.len()
            + self.file_exports.len()
    }

    /// Returns true if nothing is provided.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AttachedRequired {
    /// Total number of required resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.networks.len() + self.services.len() + self.filesets.len()
    }

    /// Returns true if nothing is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
