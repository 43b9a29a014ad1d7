//! Package and deployment model consumed by the reconciliation engine.
//!
//! Package declarations are parsed elsewhere; this module holds the
//! already-loaded definitions and the resolved deployments built from them.

mod deployment;
mod spec;

pub use deployment::ResolvedDeployment;
pub use spec::{
    AttachedProvided, AttachedRequired, DeploymentSpec, FeatureSpec, HostSpec, PackageDefinition,
    ProvidedResources, RequiredResources,
};
