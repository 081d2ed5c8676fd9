//! Tree walker: level-by-level expansion of a person's subtree
//!
//! Each level is fetched with batched `children_of_any` calls, so the number
//! of store round trips grows with depth, not with subtree size. A visited
//! set makes the walk terminate even when the stored parent pointers form a
//! cycle; every re-visit is reported as an [`IntegrityWarning`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::Result;
use crate::store::PersonStore;
use crate::types::{Person, PersonId};

/// Frontier chunk size used when none is configured
pub const DEFAULT_FRONTIER_BATCH_SIZE: usize = 500;

// ─────────────────────────────────────────────────────────────────
// Walk Results
// ─────────────────────────────────────────────────────────────────

/// Data problem noticed during a walk. The walk still completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityWarning {
    /// A person showed up a second time (cycle or duplicated row)
    Revisit { id: PersonId, level: u32 },
    /// The root came back as somebody's direct report
    RootReached { id: PersonId, level: u32 },
}

impl IntegrityWarning {
    pub fn id(&self) -> &PersonId {
        match self {
            IntegrityWarning::Revisit { id, .. } | IntegrityWarning::RootReached { id, .. } => id,
        }
    }
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityWarning::Revisit { id, level } => {
                write!(f, "{} reached again at level {}", id, level)
            }
            IntegrityWarning::RootReached { id, level } => {
                write!(f, "walk root {} listed as a report at level {}", id, level)
            }
        }
    }
}

/// A descendant together with its distance from the root (direct report = 1)
#[derive(Debug, Clone)]
pub struct WalkedNode {
    pub person: Person,
    pub level: u32,
}

/// Complete result of one walk, in breadth-first order
#[derive(Debug, Clone)]
pub struct Walk {
    pub root: PersonId,
    pub nodes: Vec<WalkedNode>,
    pub warnings: Vec<IntegrityWarning>,
    /// Store calls spent on this walk
    pub round_trips: u32,
}

impl Walk {
    fn new(root: PersonId) -> Self {
        Self {
            root,
            nodes: Vec::new(),
            warnings: Vec::new(),
            round_trips: 0,
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.nodes.iter().map(|n| n.level).max().unwrap_or(0)
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────
// Tree Walker
// ─────────────────────────────────────────────────────────────────

/// Computes descendant sets and depths against a [`PersonStore`]
#[derive(Clone)]
pub struct TreeWalker {
    store: Arc<dyn PersonStore>,
    frontier_batch_size: usize,
}

impl TreeWalker {
    pub fn new(store: Arc<dyn PersonStore>, frontier_batch_size: usize) -> Self {
        Self {
            store,
            frontier_batch_size: frontier_batch_size.max(1),
        }
    }

    pub fn with_defaults(store: Arc<dyn PersonStore>) -> Self {
        Self::new(store, DEFAULT_FRONTIER_BATCH_SIZE)
    }

    pub fn store(&self) -> &Arc<dyn PersonStore> {
        &self.store
    }

    /// Walk the whole subtree below `root` (root excluded)
    pub async fn walk(&self, root: &PersonId) -> Result<Walk> {
        let (walk, _) = self.expand(root, None).await?;
        Ok(walk)
    }

    /// Every id reachable below `root`
    pub async fn descendants_of(&self, root: &PersonId) -> Result<HashSet<PersonId>> {
        let walk = self.walk(root).await?;
        Ok(walk.nodes.into_iter().map(|n| n.person.id).collect())
    }

    /// Every id reachable below `root`, with its level
    pub async fn depth_of(&self, root: &PersonId) -> Result<HashMap<PersonId, u32>> {
        let walk = self.walk(root).await?;
        Ok(walk
            .nodes
            .into_iter()
            .map(|n| (n.person.id, n.level))
            .collect())
    }

    /// Whether `target` sits anywhere below `root`.
    ///
    /// Stops as soon as the target appears. A miss always walks the full
    /// subtree, so "unrelated" and "does not exist" cost the same.
    pub async fn contains(&self, root: &PersonId, target: &PersonId) -> Result<bool> {
        let (_, found) = self.expand(root, Some(target)).await?;
        Ok(found)
    }

    async fn expand(&self, root: &PersonId, stop_at: Option<&PersonId>) -> Result<(Walk, bool)> {
        let mut walk = Walk::new(root.clone());
        let mut visited: HashSet<PersonId> = HashSet::new();
        visited.insert(root.clone());

        let mut frontier = vec![root.clone()];
        let mut level = 0u32;

        while !frontier.is_empty() {
            level += 1;
            let mut next = Vec::new();

            for chunk in frontier.chunks(self.frontier_batch_size) {
                walk.round_trips += 1;
                let children = self.store.children_of_any(chunk).await?;

                for child in children {
                    if !visited.insert(child.id.clone()) {
                        let warning = if child.id == *root {
                            IntegrityWarning::RootReached { id: child.id, level }
                        } else {
                            IntegrityWarning::Revisit { id: child.id, level }
                        };
                        warn!(
                            root = %root,
                            store = self.store.name(),
                            warning = %warning,
                            "Hierarchy integrity problem"
                        );
                        walk.warnings.push(warning);
                        continue;
                    }

                    let found = stop_at == Some(&child.id);
                    next.push(child.id.clone());
                    walk.nodes.push(WalkedNode { person: child, level });

                    if found {
                        debug!(root = %root, level, round_trips = walk.round_trips, "Target found");
                        return Ok((walk, true));
                    }
                }
            }

            frontier = next;
        }

        debug!(
            root = %root,
            descendants = walk.nodes.len(),
            max_depth = walk.max_depth(),
            round_trips = walk.round_trips,
            warnings = walk.warnings.len(),
            "Walk complete"
        );

        Ok((walk, false))
    }
}
