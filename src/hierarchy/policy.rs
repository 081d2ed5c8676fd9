//! Role policy: static rank thresholds per action
//!
//! Pure lookups, no traversal. Tree-scoped actions still go through the
//! permission oracle after passing this gate.

use std::fmt;

use serde::Serialize;

use crate::types::Rank;

/// Actions gated by rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Action {
    /// Open one's own or a descendant's profile
    ViewProfile,
    /// See direct reports and network metrics
    ViewNetwork,
    /// Register a new voter as a direct report
    CreateVoter,
    /// Move a descendant under another person
    ReassignReport,
}

impl Action {
    pub fn all() -> &'static [Action] {
        &[
            Action::ViewProfile,
            Action::ViewNetwork,
            Action::CreateVoter,
            Action::ReassignReport,
        ]
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::ViewProfile => "view-profile",
            Action::ViewNetwork => "view-network",
            Action::CreateVoter => "create-voter",
            Action::ReassignReport => "reassign-report",
        };
        f.write_str(name)
    }
}

pub struct RolePolicy;

impl RolePolicy {
    /// Lowest rank allowed to perform `action`
    pub const fn minimum_rank(action: Action) -> Rank {
        match action {
            Action::ViewProfile | Action::ViewNetwork => Rank::Voter,
            Action::CreateVoter => Rank::Leader,
            Action::ReassignReport => Rank::Coordinator,
        }
    }

    pub fn allows(rank: Rank, action: Action) -> bool {
        rank >= Self::minimum_rank(action)
    }

    /// Everything `rank` may do
    pub fn allowed_actions(rank: Rank) -> Vec<Action> {
        Action::all()
            .iter()
            .copied()
            .filter(|action| Self::allows(rank, *action))
            .collect()
    }
}

/// Leaders and above may register voters under themselves
pub fn can_create_voter(rank: Rank) -> bool {
    RolePolicy::allows(rank, Action::CreateVoter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_create_voter() {
        assert!(!can_create_voter(Rank::Voter));
        assert!(!can_create_voter(Rank::Activist));
        assert!(can_create_voter(Rank::Leader));
        assert!(can_create_voter(Rank::ZoneChief));
        assert!(can_create_voter(Rank::Coordinator));
        assert!(can_create_voter(Rank::Strategist));
    }

    #[test]
    fn test_viewing_open_to_all_ranks() {
        for rank in Rank::all() {
            assert!(RolePolicy::allows(*rank, Action::ViewProfile));
            assert!(RolePolicy::allows(*rank, Action::ViewNetwork));
        }
    }

    #[test]
    fn test_allowed_actions_grow_with_rank() {
        let mut previous = 0;
        for rank in Rank::all() {
            let count = RolePolicy::allowed_actions(*rank).len();
            assert!(count >= previous);
            previous = count;
        }
        assert_eq!(RolePolicy::allowed_actions(Rank::Voter).len(), 2);
        assert_eq!(RolePolicy::allowed_actions(Rank::Strategist).len(), 4);
    }
}
