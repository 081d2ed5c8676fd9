//! Person records and their identifiers.

use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Rank;
use crate::error::{Error, Result};

// ─────────────────────────────────────────────────────────────────
// Person Id
// ─────────────────────────────────────────────────────────────────

/// National identification number, used as the primary key.
///
/// Externally an id is 6 to 10 digits. The hierarchy engine itself treats it
/// as an opaque key and never looks inside.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
    /// Parse an id coming from a form or URL.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let valid = (6..=10).contains(&raw.len()) && raw.bytes().all(|b| b.is_ascii_digit());
        if !valid {
            return Err(Error::validation(
                "identification",
                format!("'{}' must be 6 to 10 digits", raw),
            ));
        }
        Ok(Self(raw.to_string()))
    }

    /// Wrap an id that has already been validated (store rows, fixtures).
    pub fn new_unchecked(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PersonId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ─────────────────────────────────────────────────────────────────
// Person
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Sex {
    #[serde(alias = "Masculino")]
    Male,
    #[serde(alias = "Femenino")]
    Female,
    #[serde(alias = "Otro")]
    Other,
}

/// One row of the recruitment hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,

    pub first_names: String,
    pub last_names: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sex: Option<Sex>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voting_place: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voting_table: Option<String>,

    #[serde(default)]
    pub rank: Rank,

    /// Recruiter / supervisor. `None` marks a top-level operative.
    #[serde(default)]
    pub parent_id: Option<PersonId>,

    /// Opaque credential material, never interpreted here.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub credential_hash: String,

    /// 0 = doubtful vote, 100 = secured vote. Informational only.
    #[serde(default)]
    pub quality_score: u8,

    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Person {
    /// Minimal record with every optional attribute empty.
    pub fn new(
        id: PersonId,
        first_names: impl Into<String>,
        last_names: impl Into<String>,
        rank: Rank,
        parent_id: Option<PersonId>,
        registered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            first_names: first_names.into(),
            last_names: last_names.into(),
            phone: None,
            age: None,
            sex: None,
            email: None,
            neighborhood: None,
            voting_place: None,
            voting_table: None,
            rank,
            parent_id,
            credential_hash: String::new(),
            quality_score: 0,
            registered_at,
            updated_at: registered_at,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_names, self.last_names)
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Copy safe to show another person: credential material stripped.
    pub fn redacted(&self) -> Self {
        Self {
            credential_hash: String::new(),
            ..self.clone()
        }
    }

    /// Check the record-level rules enforced at registration.
    pub fn validate(&self) -> Result<()> {
        if self.first_names.trim().is_empty() {
            return Err(Error::validation("first_names", "must not be empty"));
        }
        if self.last_names.trim().is_empty() {
            return Err(Error::validation("last_names", "must not be empty"));
        }
        if self.quality_score > 100 {
            return Err(Error::validation(
                "quality_score",
                format!("{} is outside 0-100", self.quality_score),
            ));
        }
        if let Some(age) = self.age {
            if !(18..=120).contains(&age) {
                return Err(Error::validation("age", format!("{} is outside 18-120", age)));
            }
        }
        if let Some(ref phone) = self.phone {
            let valid = phone.len() == 10
                && phone.starts_with('3')
                && phone.bytes().all(|b| b.is_ascii_digit());
            if !valid {
                return Err(Error::validation(
                    "phone",
                    format!("'{}' must be 10 digits starting with 3", phone),
                ));
            }
        }
        Ok(())
    }
}
