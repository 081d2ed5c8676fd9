//! Session identity: who is making the request
//!
//! The engine never reads cookies or clocks on its own. Callers resolve a
//! session token into an [`Identity`] (passing the current time explicitly)
//! and hand that identity to every engine call.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Person, PersonId, Rank};

// ─────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────

/// The authenticated requester
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: PersonId,
    pub rank: Rank,
    pub display_name: String,
}

impl Identity {
    pub fn new(id: PersonId, rank: Rank, display_name: impl Into<String>) -> Self {
        Self {
            id,
            rank,
            display_name: display_name.into(),
        }
    }

    pub fn from_person(person: &Person) -> Self {
        Self::new(person.id.clone(), person.rank, person.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionIdentity {
    Authenticated(Identity),
    Anonymous,
}

impl SessionIdentity {
    /// The identity, or `NotAuthenticated`
    pub fn require(self) -> Result<Identity> {
        match self {
            SessionIdentity::Authenticated(identity) => Ok(identity),
            SessionIdentity::Anonymous => Err(Error::NotAuthenticated),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionIdentity::Authenticated(_))
    }
}

/// Opaque session handle
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // never log a full token
        write!(f, "{}…", &self.0[..self.0.len().min(8)])
    }
}

/// Resolves a session token into the current requester
pub trait IdentityProvider: Send + Sync {
    fn current_identity(&self, token: &SessionToken, now: DateTime<Utc>) -> SessionIdentity;
}

// ─────────────────────────────────────────────────────────────────
// Session Registry
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct SessionEntry {
    identity: Identity,
    last_seen: DateTime<Utc>,
}

/// In-memory sessions with idle expiry
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionToken, SessionEntry>>,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    pub fn with_idle_minutes(minutes: u32) -> Self {
        Self::new(Duration::minutes(i64::from(minutes)))
    }

    /// Start a session for an authenticated person
    pub fn open(&self, identity: Identity, now: DateTime<Utc>) -> SessionToken {
        let token = SessionToken::generate();
        debug!(token = %token, person = %identity.id, "Session opened");
        self.sessions.write().insert(
            token.clone(),
            SessionEntry {
                identity,
                last_seen: now,
            },
        );
        token
    }

    /// End a session (logout)
    pub fn close(&self, token: &SessionToken) -> bool {
        self.sessions.write().remove(token).is_some()
    }

    /// Drop every session idle past the timeout; returns how many were dropped
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, entry| now - entry.last_seen <= self.idle_timeout);
        before - sessions.len()
    }

    pub fn active_count(&self) -> usize {
        self.sessions.read().len()
    }
}

impl IdentityProvider for SessionRegistry {
    fn current_identity(&self, token: &SessionToken, now: DateTime<Utc>) -> SessionIdentity {
        let mut sessions = self.sessions.write();

        let expired = match sessions.get_mut(token) {
            None => return SessionIdentity::Anonymous,
            Some(entry) if now - entry.last_seen > self.idle_timeout => true,
            Some(entry) => {
                entry.last_seen = now;
                return SessionIdentity::Authenticated(entry.identity.clone());
            }
        };

        if expired {
            sessions.remove(token);
            debug!(token = %token, "Session expired after inactivity");
        }
        SessionIdentity::Anonymous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity::new(PersonId::new_unchecked("1000000001"), Rank::Leader, "Ana Ruiz")
    }

    #[test]
    fn test_open_and_resolve() {
        let registry = SessionRegistry::with_idle_minutes(30);
        let now = Utc::now();
        let token = registry.open(identity(), now);

        let current = registry.current_identity(&token, now + Duration::minutes(5));
        assert_eq!(current, SessionIdentity::Authenticated(identity()));
    }

    #[test]
    fn test_activity_extends_session() {
        let registry = SessionRegistry::with_idle_minutes(30);
        let now = Utc::now();
        let token = registry.open(identity(), now);

        assert!(registry
            .current_identity(&token, now + Duration::minutes(20))
            .is_authenticated());
        assert!(registry
            .current_identity(&token, now + Duration::minutes(40))
            .is_authenticated());
    }

    #[test]
    fn test_idle_session_expires() {
        let registry = SessionRegistry::with_idle_minutes(30);
        let now = Utc::now();
        let token = registry.open(identity(), now);

        let current = registry.current_identity(&token, now + Duration::minutes(31));
        assert_eq!(current, SessionIdentity::Anonymous);
        assert_eq!(registry.active_count(), 0);
        assert!(matches!(current.require(), Err(Error::NotAuthenticated)));
    }

    #[test]
    fn test_close_and_purge() {
        let registry = SessionRegistry::with_idle_minutes(10);
        let now = Utc::now();
        let a = registry.open(identity(), now);
        let _b = registry.open(identity(), now);

        assert!(registry.close(&a));
        assert!(!registry.close(&a));
        assert_eq!(registry.purge_expired(now + Duration::minutes(11)), 1);
        assert_eq!(registry.active_count(), 0);
    }

    #[test]
    fn test_unknown_token_is_anonymous() {
        let registry = SessionRegistry::with_idle_minutes(30);
        let token = SessionToken::from_raw("nope");
        assert!(!registry
            .current_identity(&token, Utc::now())
            .is_authenticated());
    }
}
