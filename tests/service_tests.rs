//! Network service tests against the fixture snapshot
//!
//! Follows the request flow: resolve the session, then call the service
//! with the resulting identity.

mod common;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use common::{network_fixture, person, pid};
use urna_core::{
    Error, Forest, Identity, IdentityProvider, MemoryPersonStore, NetworkService, NewVoter,
    Person, PersonId, PersonStore, Rank, Result, SessionIdentity, SessionRegistry,
};

struct App {
    store: Arc<MemoryPersonStore>,
    service: NetworkService,
    sessions: SessionRegistry,
}

impl App {
    fn new() -> Self {
        let store = Arc::new(MemoryPersonStore::load_snapshot(&network_fixture()).unwrap());
        Self {
            service: NetworkService::new(store.clone(), 2),
            sessions: SessionRegistry::with_idle_minutes(30),
            store,
        }
    }

    async fn login(&self, id: &str) -> Identity {
        let person = self.store.get(&pid(id)).await.unwrap().unwrap();
        let now = Utc::now();
        let token = self.sessions.open(Identity::from_person(&person), now);
        self.sessions.current_identity(&token, now).require().unwrap()
    }
}

#[tokio::test]
async fn test_fixture_ranks_parse() {
    let app = App::new();
    assert_eq!(app.store.len(), 11);

    let identity = app.login("2000000001").await;
    assert_eq!(identity.rank, Rank::Coordinator);
    assert_eq!(app.login("1000000004").await.rank, Rank::Leader);
}

#[tokio::test]
async fn test_zone_chief_sees_whole_zone() {
    let app = App::new();
    let chief = app.login("1000000003").await;

    let metrics = app
        .service
        .network_metrics(&chief, &chief.id)
        .await
        .unwrap();
    assert_eq!(metrics.total, 6);
    assert_eq!(metrics.max_depth, 3);
    assert_eq!(metrics.by_rank[&Rank::Voter], 3);

    let profile = app
        .service
        .view_profile(&chief, &pid("1000000008"))
        .await
        .unwrap();
    assert_eq!(profile.display_name(), "Diana Marcela López Rincón");
}

#[tokio::test]
async fn test_branches_are_isolated() {
    let app = App::new();
    let other = app.login("2000000001").await;

    let err = app
        .service
        .view_profile(&other, &pid("1000000007"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AccessDenied { .. }));

    let err = app
        .service
        .referrals(&other, &pid("1000000001"))
        .await
        .unwrap_err();
    assert!(err.is_denial());
}

#[tokio::test]
async fn test_leader_enrolls_then_sees_voter() {
    let app = App::new();
    let leader = app.login("1000000005").await;

    let form = NewVoter {
        id: "1000000010".to_string(),
        first_names: "Valentina".to_string(),
        last_names: "Arias Loaiza".to_string(),
        phone: Some("3151234567".to_string()),
        quality_score: Some(75),
        ..Default::default()
    };
    let enrolled = app
        .service
        .create_voter(&leader, form, Utc::now())
        .await
        .unwrap();
    assert_eq!(enrolled.person.rank, Rank::Voter);

    let roster = app.service.roster(&leader).await.unwrap();
    assert_eq!(roster[0].id, pid("1000000010"));
    assert_eq!(roster.len(), 2);

    let reports = app.service.referrals(&leader, &leader.id).await.unwrap();
    assert_eq!(reports[&Rank::Voter].len(), 2);

    // the zone chief above sees the new voter too
    let chief = app.login("1000000003").await;
    assert!(app
        .service
        .view_profile(&chief, &pid("1000000010"))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_activist_cannot_enroll() {
    let app = App::new();
    let activist = app.login("1000000006").await;

    let form = NewVoter {
        id: "1000000011".to_string(),
        first_names: "Nadie".to_string(),
        last_names: "Registrado".to_string(),
        ..Default::default()
    };
    let err = app
        .service
        .create_voter(&activist, form, Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::AccessDenied { .. }));
    assert!(app.store.get(&pid("1000000011")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_coordinator_reassigns_within_branch() {
    let app = App::new();
    let coordinator = app.login("1000000002").await;

    app.service
        .reassign(&coordinator, &pid("1000000009"), &pid("1000000004"))
        .await
        .unwrap();

    let leader = app.login("1000000004").await;
    let reports = app.service.referrals(&leader, &leader.id).await.unwrap();
    let voters: Vec<_> = reports[&Rank::Voter].iter().map(|r| r.id.clone()).collect();
    assert_eq!(voters, vec![pid("1000000009"), pid("1000000007")]);

    let err = app
        .service
        .reassign(&coordinator, &pid("1000000003"), &pid("1000000008"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::CycleRejected { .. }));
}

#[tokio::test]
async fn test_expired_session_is_anonymous() {
    let app = App::new();
    let person = app.store.get(&pid("1000000004")).await.unwrap().unwrap();

    let opened = Utc::now();
    let token = app.sessions.open(Identity::from_person(&person), opened);

    let later = opened + Duration::minutes(45);
    assert_eq!(
        app.sessions.current_identity(&token, later),
        SessionIdentity::Anonymous
    );
}

/// Memory store that hands control back to the runtime before every call,
/// so concurrent requests interleave at each round trip
struct YieldingStore(Arc<MemoryPersonStore>);

#[async_trait]
impl PersonStore for YieldingStore {
    fn name(&self) -> &'static str {
        "yielding"
    }

    async fn get(&self, id: &PersonId) -> Result<Option<Person>> {
        tokio::task::yield_now().await;
        self.0.get(id).await
    }

    async fn children_of(&self, id: &PersonId) -> Result<Vec<Person>> {
        tokio::task::yield_now().await;
        self.0.children_of(id).await
    }

    async fn children_of_any(&self, ids: &[PersonId]) -> Result<Vec<Person>> {
        tokio::task::yield_now().await;
        self.0.children_of_any(ids).await
    }

    async fn count_children(&self, ids: &[PersonId]) -> Result<HashMap<PersonId, usize>> {
        tokio::task::yield_now().await;
        self.0.count_children(ids).await
    }

    async fn all(&self) -> Result<Vec<Person>> {
        tokio::task::yield_now().await;
        self.0.all().await
    }

    async fn insert(&self, person: Person) -> Result<()> {
        tokio::task::yield_now().await;
        self.0.insert(person).await
    }

    async fn set_parent(&self, id: &PersonId, parent: Option<PersonId>) -> Result<()> {
        tokio::task::yield_now().await;
        self.0.set_parent(id, parent).await
    }
}

#[tokio::test]
async fn test_concurrent_opposite_moves_cannot_close_a_loop() {
    let inner = Arc::new(MemoryPersonStore::from_people(vec![
        person("100000", Rank::Coordinator, None, 0),
        person("200001", Rank::Leader, Some("100000"), 1),
        person("200002", Rank::Leader, Some("100000"), 2),
    ]));
    let service = NetworkService::new(Arc::new(YieldingStore(inner.clone())), 2);
    let boss = Identity::new(pid("100000"), Rank::Coordinator, "Boss");

    let (a, b) = (pid("200001"), pid("200002"));
    let (first, second) = tokio::join!(
        service.reassign(&boss, &a, &b),
        service.reassign(&boss, &b, &a),
    );

    let outcomes = [first, second];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(Error::CycleRejected { .. }))));

    let forest = Forest::build(inner.all().await.unwrap());
    assert!(forest.find_cycles().is_empty());
    assert_eq!(forest.metrics(&pid("100000")).total, 2);
}
