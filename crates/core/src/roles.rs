//! User role classification.
//!
//! Roles describe who the account represents (a private donor, a town
//! hall, a recipient association). They are informational: which party a
//! user plays on a given donation is determined by the foreign-key slot
//! referencing them, not by this field.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Account role, stored as text in the `users.role` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Individual,
    TownHall,
    Association,
    Other,
}

impl UserRole {
    /// The database/API string for this role.
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Individual => "individual",
            UserRole::TownHall => "town_hall",
            UserRole::Association => "association",
            UserRole::Other => "other",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "individual" => Ok(UserRole::Individual),
            "town_hall" => Ok(UserRole::TownHall),
            "association" => Ok(UserRole::Association),
            "other" => Ok(UserRole::Other),
            other => Err(CoreError::Validation(format!("Unknown user role '{other}'"))),
        }
    }
}
