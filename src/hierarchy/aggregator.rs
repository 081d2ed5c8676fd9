//! Network aggregation: one level of direct reports, or whole-subtree stats
//!
//! `direct_reports_by_rank` serves lazy tree expansion (one level at a time),
//! `subtree_metrics` serves the per-node summary badges. Neither ever loads
//! the whole forest.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use super::walker::TreeWalker;
use crate::error::Result;
use crate::store::PersonStore;
use crate::types::{Person, PersonId, Rank};

// ─────────────────────────────────────────────────────────────────
// Views
// ─────────────────────────────────────────────────────────────────

/// One direct report, as rendered in a tree level
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub id: PersonId,
    pub display_name: String,
    pub rank: Rank,
    pub has_reports: bool,
    pub quality_score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voting_place: Option<String>,
    pub registered_at: DateTime<Utc>,
}

impl ReportSummary {
    fn from_person(person: Person, has_reports: bool) -> Self {
        Self {
            display_name: person.display_name(),
            id: person.id,
            rank: person.rank,
            has_reports,
            quality_score: person.quality_score,
            phone: person.phone,
            neighborhood: person.neighborhood,
            voting_place: person.voting_place,
            registered_at: person.registered_at,
        }
    }
}

/// Direct reports grouped by rank, each group newest first
pub type ReportsByRank = BTreeMap<Rank, Vec<ReportSummary>>;

/// Size and shape of everything below one person
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubtreeMetrics {
    /// Number of descendants (the person itself excluded)
    pub total: usize,
    /// Deepest level reached; direct reports are level 1
    pub max_depth: u32,
    /// Descendants per rank, across all levels
    pub by_rank: BTreeMap<Rank, usize>,
}

impl SubtreeMetrics {
    pub fn record(&mut self, rank: Rank, level: u32) {
        self.total += 1;
        self.max_depth = self.max_depth.max(level);
        *self.by_rank.entry(rank).or_insert(0) += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// A descendant in the flattened roster
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterEntry {
    pub id: PersonId,
    pub display_name: String,
    pub rank: Rank,
    pub level: u32,
    pub parent_id: Option<PersonId>,
    pub quality_score: u8,
    pub registered_at: DateTime<Utc>,
}

/// Newest registration first, then id ascending
pub fn by_recency(
    a_time: &DateTime<Utc>,
    a_id: &PersonId,
    b_time: &DateTime<Utc>,
    b_id: &PersonId,
) -> Ordering {
    b_time.cmp(a_time).then_with(|| a_id.cmp(b_id))
}

// ─────────────────────────────────────────────────────────────────
// Aggregator
// ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct NetworkAggregator {
    store: Arc<dyn PersonStore>,
    walker: TreeWalker,
}

impl NetworkAggregator {
    pub fn new(walker: TreeWalker) -> Self {
        Self {
            store: walker.store().clone(),
            walker,
        }
    }

    /// Direct reports of `id`, grouped by rank.
    ///
    /// Two store calls regardless of the number of reports: one for the
    /// children, one batched count for their own reports.
    pub async fn direct_reports_by_rank(&self, id: &PersonId) -> Result<ReportsByRank> {
        let children: Vec<Person> = self
            .store
            .children_of(id)
            .await?
            .into_iter()
            .filter(|child| {
                if child.id == *id {
                    warn!(id = %id, "Person lists itself as a direct report");
                    return false;
                }
                true
            })
            .collect();

        let mut grouped = ReportsByRank::new();
        if children.is_empty() {
            return Ok(grouped);
        }

        let ids: Vec<PersonId> = children.iter().map(|c| c.id.clone()).collect();
        let counts = self.store.count_children(&ids).await?;

        for child in children {
            let has_reports = counts.get(&child.id).copied().unwrap_or(0) > 0;
            grouped
                .entry(child.rank)
                .or_default()
                .push(ReportSummary::from_person(child, has_reports));
        }

        for group in grouped.values_mut() {
            group.sort_by(|a, b| by_recency(&a.registered_at, &a.id, &b.registered_at, &b.id));
        }

        debug!(id = %id, reports = ids.len(), ranks = grouped.len(), "Direct reports grouped");
        Ok(grouped)
    }

    /// Size, depth and rank mix of the whole subtree below `id`
    pub async fn subtree_metrics(&self, id: &PersonId) -> Result<SubtreeMetrics> {
        let walk = self.walker.walk(id).await?;

        let mut metrics = SubtreeMetrics::default();
        for node in &walk.nodes {
            metrics.record(node.person.rank, node.level);
        }

        debug!(
            id = %id,
            total = metrics.total,
            max_depth = metrics.max_depth,
            "Subtree metrics computed"
        );
        Ok(metrics)
    }

    /// Every descendant of `id` with its level, newest registration first
    pub async fn roster(&self, id: &PersonId) -> Result<Vec<RosterEntry>> {
        let walk = self.walker.walk(id).await?;

        let mut entries: Vec<RosterEntry> = walk
            .nodes
            .into_iter()
            .map(|node| RosterEntry {
                display_name: node.person.display_name(),
                id: node.person.id,
                rank: node.person.rank,
                level: node.level,
                parent_id: node.person.parent_id,
                quality_score: node.person.quality_score,
                registered_at: node.person.registered_at,
            })
            .collect();

        entries.sort_by(|a, b| by_recency(&a.registered_at, &a.id, &b.registered_at, &b.id));
        Ok(entries)
    }
}
