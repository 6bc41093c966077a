//! Reconciliation engine
//!
//! The engine runs in three steps:
//! 1. Planning - select targets and build desired membership from definitions
//! 2. Diffing - compare desired membership with the remote state
//! 3. Executing - apply additions and removals through the client

pub mod differ;
pub mod executor;
pub mod planner;

pub use differ::{MembershipDiff, display_diff, reconcile, reconcile_unified};
pub use executor::{ExecuteOptions, ExecuteSummary, apply, print_summary};
pub use planner::{SubgroupTarget, collect_meta, matching_subgroups, plan_subgroups};
