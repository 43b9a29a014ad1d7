// ============================================================================
// Strict linting - Dangerous or non-idiomatic practices are forbidden
// ============================================================================

#![forbid(unsafe_code)]               // Unsafe code is forbidden
#![deny(missing_docs)]                // All public items must be documented
#![deny(dead_code)]                   // Unused code is forbidden
#![deny(non_camel_case_types)]        // Types must follow CamelCase convention

// Additional strictness - Leave nothing unchecked
#![deny(unused_imports)]              // Unused imports are forbidden
#![deny(unused_variables)]            // Unused variables are forbidden
#![deny(unused_must_use)]             // Must handle Result and Option explicitly
#![deny(non_snake_case)]              // Variables and functions must be snake_case
#![deny(non_upper_case_globals)]      // Constants must be UPPER_CASE
#![deny(nonstandard_style)]           // Non-standard code style is forbidden
#![forbid(unsafe_op_in_unsafe_fn)]    // Unsafe ops in unsafe fns are forbidden

// Clippy lints (warnings only)
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints
#![warn(clippy::nursery)]             // Experimental lints
#![warn(clippy::unwrap_used)]         // unwrap() warning
#![warn(clippy::expect_used)]         // expect() warning
#![warn(clippy::panic)]               // panic!() warning
#![warn(clippy::print_stdout)]        // println!() warning
#![warn(clippy::todo)]                // TODO warning
#![warn(clippy::unimplemented)]       // unimplemented!() warning
#![warn(clippy::missing_const_for_fn)] // Force const when possible
#![warn(clippy::unwrap_in_result)]    // unwrap() in Result warning
#![warn(clippy::module_inception)]    // Module with same name as crate warning
#![warn(clippy::redundant_clone)]     // Useless clones warning
#![warn(clippy::shadow_unrelated)]    // Shadowing unrelated variables warning
#![warn(clippy::too_many_arguments)]  // Limit function arguments
#![warn(clippy::cognitive_complexity)] // Limit cognitive complexity

// Safety and robustness lints
#![deny(overflowing_literals)]        // Overflowing literals are forbidden
#![deny(arithmetic_overflow)]         // Arithmetic overflow is forbidden

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Stackplan
//!
//! A reconciliation planner for containerized application stacks.
//!
//! ## Overview
//!
//! Stackplan turns a set of resolved package deployments into a plan for
//! creating, updating and removing live application stacks on a host:
//!
//! - Detect resource conflicts between deployments
//! - Verify that every deployment's requirements are provided by some deployment
//! - Diff desired deployments against live stacks
//! - Order the resulting changes for concurrent or serial execution
//!
//! ## Architecture
//!
//! The planner is built around a pure pipeline with no I/O:
//!
//! 1. **Resources**: Typed resources with conflict and dependency rules
//! 2. **Constraints**: Conflict reports, dependency reports and the deployment graph
//! 3. **Planner**: Changes, the pruned change graph, cycles and the serial order
//!
//! ## Modules
//!
//! - [`resources`]: Resource model and matching rules
//! - [`package`]: Package definitions and resolved deployments
//! - [`graph`]: Directed graphs with reduction and cycle detection
//! - [`constraints`]: Conflict and dependency aggregation across deployments
//! - [`planner`]: Change identification, planning and ordering
//! - [`reconciler`]: The end-to-end pipeline with policy gating
//! - [`config`]: Planner settings and input document parsing
//! - [`cli`]: Command-line interface
//!
//! ## Example
//!
//! ```yaml
//! settings:
//!   serialize: true
//!
//! deployments:
//!   - name: db
//!     package:
//!       path: example.com/db
//!       deployment:
//!         definition_files: [compose.yml]
//!         provides:
//!           networks:
//!             - name: backend
//!   - name: web
//!     package:
//!       path: example.com/web
//!       deployment:
//!         definition_files: [compose.yml]
//!         requires:
//!           networks:
//!             - name: backend
//!
//! stacks:
//!   - name: web
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod cli;
pub mod config;
pub mod constraints;
pub mod error;
pub mod graph;
pub mod package;
pub mod planner;
pub mod reconciler;
pub mod resources;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, OutputFormatter};
pub use config::{ConfigParser, InputValidator, PlanInput, PlannerConfig};
pub use constraints::{
    DeploymentConflictReport, MissingDependencies, SatisfiedDependencies, check_all_conflicts,
    check_all_dependencies, resolve_dependency_graph,
};
pub use error::{Result, StackplanError};
pub use graph::Digraph;
pub use package::{PackageDefinition, ResolvedDeployment};
pub use planner::{
    ChangePlan, ChangePlanner, LiveStack, PlanHasher, ReconciliationChange, identify_changes,
};
pub use reconciler::{DeploymentSummary, ReconciliationReport, Reconciler};
pub use resources::{Attached, Resource, ResourceKind};
