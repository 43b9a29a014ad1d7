//! Change planning between desired deployments and live stacks.
//!
//! This module identifies the changes needed to reconcile live application
//! stacks with the desired deployments, orders them by dependency, and
//! optionally serializes them into a single execution order.

mod changes;
mod hash;
mod order;
mod plan;

pub use changes::{
    ChangeId, ChangeKind, LiveStack, ReconciliationChange, identify_changes, stack_name,
};
pub use hash::PlanHasher;
pub use order::serialize_changes;
pub use plan::{ChangePlan, ChangePlanner};
