//! Campaign ranks.
//!
//! The order is part of the contract: authority grows from `Voter` (0) to
//! `Strategist` (5) and role checks compare ranks directly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Authority level of a person in the recruitment hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rank {
    /// Base of the pyramid.
    #[serde(alias = "Votante")]
    Voter = 0,
    /// Brings people in on the street.
    #[serde(alias = "Activista")]
    Activist = 1,
    /// Runs a neighborhood group.
    #[serde(alias = "Líder")]
    Leader = 2,
    /// Oversees several leaders.
    #[serde(alias = "Jefe de Zona")]
    ZoneChief = 3,
    /// Works directly with the candidate.
    #[serde(alias = "Coordinador")]
    Coordinator = 4,
    /// Top of the hierarchy.
    #[serde(alias = "Estratega")]
    Strategist = 5,
}

impl Rank {
    /// Ordinal, 0 (Voter) to 5 (Strategist).
    pub fn level(&self) -> u8 {
        *self as u8
    }

    /// All ranks in ascending order of authority.
    pub fn all() -> &'static [Rank] {
        &[
            Rank::Voter,
            Rank::Activist,
            Rank::Leader,
            Rank::ZoneChief,
            Rank::Coordinator,
            Rank::Strategist,
        ]
    }

    pub fn from_level(level: u8) -> Option<Rank> {
        Rank::all().get(level as usize).copied()
    }

    /// Slug used in snapshots and CLI args.
    pub fn slug(&self) -> &'static str {
        match self {
            Rank::Voter => "voter",
            Rank::Activist => "activist",
            Rank::Leader => "leader",
            Rank::ZoneChief => "zone-chief",
            Rank::Coordinator => "coordinator",
            Rank::Strategist => "strategist",
        }
    }

    /// Label shown to campaign staff.
    pub fn display_name(&self) -> &'static str {
        match self {
            Rank::Voter => "Votante",
            Rank::Activist => "Activista",
            Rank::Leader => "Líder",
            Rank::ZoneChief => "Jefe de Zona",
            Rank::Coordinator => "Coordinador",
            Rank::Strategist => "Estratega",
        }
    }
}

impl Default for Rank {
    fn default() -> Self {
        Rank::Voter
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Rank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Rank::all()
            .iter()
            .copied()
            .find(|rank| {
                rank.slug() == normalized
                    || rank.display_name().to_lowercase() == normalized
                    || rank.slug().replace('-', "_") == normalized
            })
            .ok_or_else(|| {
                format!(
                    "Unknown rank '{}'. Valid: voter, activist, leader, zone-chief, coordinator, strategist",
                    s
                )
            })
    }
}
