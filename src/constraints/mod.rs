//! Constraint aggregation across deployments.
//!
//! This module lifts the per-resource rules to whole deployments:
//! - Conflict reports for each unordered pair of deployments
//! - Satisfied and missing dependency reports per deployment
//! - The deployment dependency graph built from satisfied dependencies

mod conflicts;
mod dependencies;

pub use conflicts::{DeploymentConflictReport, check_all_conflicts, check_conflicts};
pub use dependencies::{
    DependencyCheck, MissingDependencies, SatisfiedDependencies, check_all_dependencies,
    check_dependencies, resolve_dependency_graph,
};
