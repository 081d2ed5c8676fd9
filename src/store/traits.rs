//! Person store trait
//!
//! The engine never talks to a database directly. Anything that can answer
//! "get by id" and "children of these ids" can back it.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Person, PersonId};

/// Repository of person records, addressable by id and by parent id.
///
/// Failures to answer must surface as `Error::StoreUnavailable`; the engine
/// propagates them and never retries.
#[async_trait]
pub trait PersonStore: Send + Sync {
    /// Name used in logs (e.g. "memory", "postgres")
    fn name(&self) -> &'static str;

    // ─────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────

    /// Fetch one person
    async fn get(&self, id: &PersonId) -> Result<Option<Person>>;

    /// Direct reports of one person
    async fn children_of(&self, id: &PersonId) -> Result<Vec<Person>>;

    /// Direct reports of any of the given people, in one round trip
    async fn children_of_any(&self, ids: &[PersonId]) -> Result<Vec<Person>>;

    /// Number of direct reports per parent. Parents without reports may be
    /// absent from the map.
    async fn count_children(&self, ids: &[PersonId]) -> Result<HashMap<PersonId, usize>> {
        let mut counts = HashMap::new();
        for child in self.children_of_any(ids).await? {
            if let Some(parent) = child.parent_id {
                *counts.entry(parent).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }

    /// Every row, for bulk operations over the whole forest
    async fn all(&self) -> Result<Vec<Person>>;

    // ─────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────

    /// Insert a new person. Duplicate ids fail with `AlreadyExists`.
    async fn insert(&self, person: Person) -> Result<()>;

    /// Point a person at a new parent (or make it a root).
    ///
    /// Fails with `CycleRejected` when `parent` is `id` itself or anywhere
    /// below it. The check and the write must be one atomic step, so two
    /// concurrent moves can never close a loop between them.
    async fn set_parent(&self, id: &PersonId, parent: Option<PersonId>) -> Result<()>;
}
