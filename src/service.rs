//! Network service: the entry points request handlers call
//!
//! Every operation takes the caller's [`Identity`] explicitly and runs the
//! policy gate and the tree check before touching data.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::hierarchy::{
    Action, NetworkAggregator, PermissionOracle, ReportsByRank, RolePolicy, RosterEntry,
    SubtreeMetrics, TreeWalker,
};
use crate::session::Identity;
use crate::store::PersonStore;
use crate::types::{Person, PersonId, Rank, Sex};

// ─────────────────────────────────────────────────────────────────
// Credentials
// ─────────────────────────────────────────────────────────────────

/// Turns a freshly issued credential into what the store keeps
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, credential: &str) -> String;
}

/// Marks the credential as not hashed. Deployments plug in a real hasher.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderHasher;

impl CredentialHasher for PlaceholderHasher {
    fn hash(&self, credential: &str) -> String {
        format!("unhashed:{}", credential)
    }
}

// ─────────────────────────────────────────────────────────────────
// Requests / Responses
// ─────────────────────────────────────────────────────────────────

/// Registration form for a new voter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewVoter {
    pub id: String,
    pub first_names: String,
    pub last_names: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub sex: Option<Sex>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub voting_place: Option<String>,
    #[serde(default)]
    pub voting_table: Option<String>,
    #[serde(default)]
    pub quality_score: Option<u8>,
}

/// A registered voter plus the credential issued to them.
///
/// The credential is only ever available here; the store keeps its hash.
#[derive(Debug, Clone, Serialize)]
pub struct EnrolledVoter {
    pub person: Person,
    pub credential: String,
}

// ─────────────────────────────────────────────────────────────────
// Network Service
// ─────────────────────────────────────────────────────────────────

pub struct NetworkService {
    store: Arc<dyn PersonStore>,
    oracle: PermissionOracle,
    aggregator: NetworkAggregator,
    hasher: Arc<dyn CredentialHasher>,
}

impl NetworkService {
    pub fn new(store: Arc<dyn PersonStore>, frontier_batch_size: usize) -> Self {
        let walker = TreeWalker::new(store.clone(), frontier_batch_size);
        Self {
            oracle: PermissionOracle::new(walker.clone()),
            aggregator: NetworkAggregator::new(walker),
            store,
            hasher: Arc::new(PlaceholderHasher),
        }
    }

    pub fn with_hasher(mut self, hasher: Arc<dyn CredentialHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn oracle(&self) -> &PermissionOracle {
        &self.oracle
    }

    pub fn aggregator(&self) -> &NetworkAggregator {
        &self.aggregator
    }

    /// Profile of `target`, if the caller may see it.
    ///
    /// The view check runs before the lookup, so an unknown target outside
    /// the caller's branch is `AccessDenied`, not `NotFound`.
    pub async fn view_profile(&self, identity: &Identity, target: &PersonId) -> Result<Person> {
        self.gate(identity, Action::ViewProfile, target)?;
        self.oracle.authorize_view(&identity.id, target).await?;

        self.store
            .get(target)
            .await?
            .map(|person| person.redacted())
            .ok_or_else(|| Error::not_found(target))
    }

    /// Direct reports of `target`, grouped by rank
    pub async fn referrals(&self, identity: &Identity, target: &PersonId) -> Result<ReportsByRank> {
        self.gate(identity, Action::ViewNetwork, target)?;
        self.oracle.authorize_view(&identity.id, target).await?;
        self.aggregator.direct_reports_by_rank(target).await
    }

    /// Size and rank mix of everything below `target`
    pub async fn network_metrics(
        &self,
        identity: &Identity,
        target: &PersonId,
    ) -> Result<SubtreeMetrics> {
        self.gate(identity, Action::ViewNetwork, target)?;
        self.oracle.authorize_view(&identity.id, target).await?;
        self.aggregator.subtree_metrics(target).await
    }

    /// Everyone below the caller, newest registration first
    pub async fn roster(&self, identity: &Identity) -> Result<Vec<RosterEntry>> {
        self.gate(identity, Action::ViewNetwork, &identity.id)?;
        self.aggregator.roster(&identity.id).await
    }

    /// Register a voter as a direct report of the caller
    pub async fn create_voter(
        &self,
        identity: &Identity,
        form: NewVoter,
        now: DateTime<Utc>,
    ) -> Result<EnrolledVoter> {
        self.gate(identity, Action::CreateVoter, "new voter")?;

        let id = PersonId::parse(&form.id)?;
        let mut person = Person::new(
            id,
            form.first_names.trim(),
            form.last_names.trim(),
            Rank::Voter,
            Some(identity.id.clone()),
            now,
        );
        person.phone = form.phone;
        person.age = form.age;
        person.sex = form.sex;
        person.email = form.email;
        person.neighborhood = form.neighborhood;
        person.voting_place = form.voting_place;
        person.voting_table = form.voting_table;
        person.quality_score = form.quality_score.unwrap_or(0);
        person.validate()?;

        if self.store.get(&person.id).await?.is_some() {
            return Err(Error::AlreadyExists { id: person.id });
        }

        let credential = Uuid::new_v4().simple().to_string();
        person.credential_hash = self.hasher.hash(&credential);

        self.store.insert(person.clone()).await?;
        info!(
            recruiter = %identity.id,
            voter = %person.id,
            "Voter enrolled"
        );

        Ok(EnrolledVoter {
            person: person.redacted(),
            credential,
        })
    }

    /// Move `person` under `new_parent`.
    ///
    /// Both must be in the caller's view, and `new_parent` must not sit
    /// inside `person`'s own subtree.
    pub async fn reassign(
        &self,
        identity: &Identity,
        person: &PersonId,
        new_parent: &PersonId,
    ) -> Result<()> {
        self.gate(identity, Action::ReassignReport, person)?;
        self.oracle.authorize_view(&identity.id, person).await?;
        self.oracle.authorize_view(&identity.id, new_parent).await?;

        let current = self
            .store
            .get(person)
            .await?
            .ok_or_else(|| Error::not_found(person))?;
        if self.store.get(new_parent).await?.is_none() {
            return Err(Error::not_found(new_parent));
        }

        if current.parent_id.as_ref() == Some(new_parent) {
            debug!(person = %person, parent = %new_parent, "Already assigned, nothing to do");
            return Ok(());
        }

        // the store checks ancestry under the same lock as the write
        self.store
            .set_parent(person, Some(new_parent.clone()))
            .await?;
        info!(
            by = %identity.id,
            person = %person,
            from = ?current.parent_id.as_ref().map(|p| p.as_str()),
            to = %new_parent,
            "Report reassigned"
        );
        Ok(())
    }

    fn gate(&self, identity: &Identity, action: Action, target: impl std::fmt::Display) -> Result<()> {
        if RolePolicy::allows(identity.rank, action) {
            Ok(())
        } else {
            debug!(requester = %identity.id, rank = %identity.rank, action = %action, "Rank too low");
            Err(Error::access_denied(&identity.id, target))
        }
    }
}
