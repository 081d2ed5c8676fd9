//! Recruitment hierarchy engine
//!
//! - `walker`: batched, cycle-safe descendant traversal
//! - `permission`: self-or-descendant view checks
//! - `aggregator`: rank-grouped direct reports and subtree metrics
//! - `policy`: rank thresholds per action
//! - `forest`: arena forest for whole-hierarchy audits

pub mod aggregator;
pub mod forest;
pub mod permission;
pub mod policy;
pub mod walker;

pub use aggregator::{
    NetworkAggregator, ReportSummary, ReportsByRank, RosterEntry, SubtreeMetrics,
};
pub use forest::{Forest, ForestIssue};
pub use permission::PermissionOracle;
pub use policy::{can_create_voter, Action, RolePolicy};
pub use walker::{IntegrityWarning, TreeWalker, Walk, WalkedNode, DEFAULT_FRONTIER_BATCH_SIZE};
