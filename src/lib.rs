//! URNA core: the recruitment hierarchy engine
//!
//! Answers two questions for a campaign's recruitment forest:
//! may this person see that person, and what does the network below a
//! person look like. Storage and sessions are collaborators behind traits.

pub mod config;
pub mod error;
pub mod hierarchy;
pub mod logging;
pub mod service;
pub mod session;
pub mod store;
pub mod types;
pub mod version;

pub use error::{Error, ErrorCode, Result};
pub use hierarchy::{
    can_create_voter, Action, Forest, IntegrityWarning, NetworkAggregator, PermissionOracle,
    ReportSummary, ReportsByRank, RolePolicy, SubtreeMetrics, TreeWalker,
};
pub use service::{CredentialHasher, EnrolledVoter, NetworkService, NewVoter};
pub use session::{Identity, IdentityProvider, SessionIdentity, SessionRegistry, SessionToken};
pub use store::{MemoryPersonStore, PersonStore};
pub use types::{Person, PersonId, Rank, Sex};
