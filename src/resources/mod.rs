//! Resource model for deployment constraints.
//!
//! This module defines the typed resources a deployment can provide or
//! require, and the rules deciding when two provided resources conflict and
//! when a provided resource satisfies a requirement:
//! - Listeners and networks match on exact identity
//! - Services, filesets and file exports also match paths, where a trailing
//!   `*` marks a prefix

mod attached;
mod kinds;
mod matching;
mod paths;

pub use attached::{
    Attached, DependencyCandidate, MissingDependency, ResourceConflict, SatisfiedDependency,
};
pub use kinds::{
    FileExportResource, FilesetResource, ListenerResource, NetworkResource, Resource,
    ResourceCheck, ResourceKind, ServiceResource,
};
pub use matching::{ProviderResources, check_conflicts, check_dependencies, split_by_path};
