//! In-memory person store
//!
//! Backs the CLI (loaded from a JSON snapshot) and the test suite. Loaded rows
//! are stored verbatim, including rows that break the forest invariant, so
//! cyclic data can be reproduced. Ids stay unique: the parent index must agree
//! with the rows. Call counts per operation make the walker's query budget
//! observable.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use super::traits::PersonStore;
use crate::error::{Error, Result};
use crate::types::{Person, PersonId};

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<PersonId, Person>,
    /// parent id -> child ids, in insertion order
    by_parent: HashMap<PersonId, Vec<PersonId>>,
}

impl Tables {
    fn add(&mut self, person: Person) -> Result<()> {
        if self.rows.contains_key(&person.id) {
            return Err(Error::AlreadyExists { id: person.id });
        }
        self.link(&person.id, person.parent_id.as_ref());
        self.rows.insert(person.id.clone(), person);
        Ok(())
    }

    /// Whether `ancestor` is `id` or sits on `id`'s parent chain
    fn is_on_chain(&self, ancestor: &PersonId, id: &PersonId) -> bool {
        let mut seen = HashSet::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            if !seen.insert(current) {
                return false;
            }
            cursor = self.rows.get(current).and_then(|p| p.parent_id.as_ref());
        }
        false
    }

    fn link(&mut self, child: &PersonId, parent: Option<&PersonId>) {
        if let Some(parent) = parent {
            self.by_parent
                .entry(parent.clone())
                .or_default()
                .push(child.clone());
        }
    }

    fn unlink(&mut self, child: &PersonId, parent: Option<&PersonId>) {
        if let Some(parent) = parent {
            if let Some(children) = self.by_parent.get_mut(parent) {
                children.retain(|c| c != child);
                if children.is_empty() {
                    self.by_parent.remove(parent);
                }
            }
        }
    }

    fn children(&self, parent: &PersonId) -> impl Iterator<Item = &Person> {
        self.by_parent
            .get(parent)
            .into_iter()
            .flatten()
            .filter_map(|id| self.rows.get(id))
    }
}

/// Thread-safe in-memory store
#[derive(Debug)]
pub struct MemoryPersonStore {
    tables: RwLock<Tables>,
    call_counts: RwLock<HashMap<&'static str, u32>>,
    fail_reads: AtomicBool,
}

impl MemoryPersonStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            call_counts: RwLock::new(HashMap::new()),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Build a store from rows, keeping the given order as insertion order.
    /// A repeated id fails with `AlreadyExists`.
    pub fn try_from_people(people: impl IntoIterator<Item = Person>) -> Result<Self> {
        let store = Self::new();
        {
            let mut tables = store.tables.write();
            for person in people {
                tables.add(person)?;
            }
        }
        Ok(store)
    }

    /// Like [`try_from_people`](Self::try_from_people), but the first row
    /// for an id wins and later ones are dropped, as in `Forest::build`
    pub fn from_people(people: impl IntoIterator<Item = Person>) -> Self {
        let store = Self::new();
        {
            let mut tables = store.tables.write();
            for person in people {
                if let Err(e) = tables.add(person) {
                    warn!(error = %e, "Dropping repeated row");
                }
            }
        }
        store
    }

    /// Load a JSON snapshot (an array of person rows)
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::IoRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let people: Vec<Person> = serde_json::from_str(&content)?;
        let rows = people.len();
        let store = Self::try_from_people(people)?;
        info!(path = %path.display(), rows, "Snapshot loaded");
        Ok(store)
    }

    /// Write the current rows back as a JSON snapshot
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let mut people: Vec<Person> = self.tables.read().rows.values().cloned().collect();
        people.sort_by(|a, b| {
            a.registered_at
                .cmp(&b.registered_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        let content = serde_json::to_string_pretty(&people)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
            }
        }
        fs::write(path, content).map_err(|e| Error::IoWrite {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(path = %path.display(), rows = people.len(), "Snapshot saved");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tables.read().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every read fail with `StoreUnavailable`
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// How many times an operation was called
    pub fn call_count(&self, operation: &str) -> u32 {
        self.call_counts.read().get(operation).copied().unwrap_or(0)
    }

    pub fn reset_call_counts(&self) {
        self.call_counts.write().clear();
    }

    fn record(&self, operation: &'static str) -> Result<()> {
        *self.call_counts.write().entry(operation).or_insert(0) += 1;
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::store_unavailable(format!(
                "memory store refused {}",
                operation
            )));
        }
        Ok(())
    }
}

impl Default for MemoryPersonStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PersonStore for MemoryPersonStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, id: &PersonId) -> Result<Option<Person>> {
        self.record("get")?;
        Ok(self.tables.read().rows.get(id).cloned())
    }

    async fn children_of(&self, id: &PersonId) -> Result<Vec<Person>> {
        self.record("children_of")?;
        Ok(self.tables.read().children(id).cloned().collect())
    }

    async fn children_of_any(&self, ids: &[PersonId]) -> Result<Vec<Person>> {
        self.record("children_of_any")?;
        let tables = self.tables.read();
        Ok(ids
            .iter()
            .flat_map(|id| tables.children(id))
            .cloned()
            .collect())
    }

    async fn count_children(&self, ids: &[PersonId]) -> Result<HashMap<PersonId, usize>> {
        self.record("count_children")?;
        let tables = self.tables.read();
        Ok(ids
            .iter()
            .filter_map(|id| {
                let count = tables.children(id).count();
                (count > 0).then(|| (id.clone(), count))
            })
            .collect())
    }

    async fn all(&self) -> Result<Vec<Person>> {
        self.record("all")?;
        Ok(self.tables.read().rows.values().cloned().collect())
    }

    async fn insert(&self, person: Person) -> Result<()> {
        self.tables.write().add(person)
    }

    async fn set_parent(&self, id: &PersonId, parent: Option<PersonId>) -> Result<()> {
        let mut tables = self.tables.write();
        let previous = match tables.rows.get(id) {
            Some(person) => person.parent_id.clone(),
            None => return Err(Error::not_found(id)),
        };
        if let Some(ref new_parent) = parent {
            if tables.is_on_chain(id, new_parent) {
                return Err(Error::CycleRejected {
                    person: id.clone(),
                    new_parent: new_parent.clone(),
                });
            }
        }
        tables.unlink(id, previous.as_ref());
        tables.link(id, parent.as_ref());
        if let Some(person) = tables.rows.get_mut(id) {
            person.parent_id = parent;
            person.updated_at = Utc::now();
        }
        Ok(())
    }
}
