//! Permission oracle: who may see whose profile
//!
//! A requester sees themself and every descendant, at any depth. Nothing
//! else grants access: not ancestry, not being siblings. Unknown requesters
//! have no descendants and are therefore denied.

use tracing::debug;

use super::walker::TreeWalker;
use crate::error::{Error, Result};
use crate::types::PersonId;

#[derive(Clone)]
pub struct PermissionOracle {
    walker: TreeWalker,
}

impl PermissionOracle {
    pub fn new(walker: TreeWalker) -> Self {
        Self { walker }
    }

    /// Self-or-descendant check.
    ///
    /// A store failure is returned as an error, never folded into a decision.
    pub async fn can_view(&self, requester: &PersonId, target: &PersonId) -> Result<bool> {
        if requester == target {
            return Ok(true);
        }

        let allowed = self.walker.contains(requester, target).await?;
        debug!(requester = %requester, target = %target, allowed, "View decision");
        Ok(allowed)
    }

    /// Like [`can_view`](Self::can_view) but yields `AccessDenied` on refusal
    pub async fn authorize_view(&self, requester: &PersonId, target: &PersonId) -> Result<()> {
        if self.can_view(requester, target).await? {
            Ok(())
        } else {
            Err(Error::access_denied(requester, target))
        }
    }
}
