//! Donation lifecycle status and reference generation.
//!
//! The status field is a six-stage pipeline from the initial donation
//! request to delivery. The transition policy is deliberately permissive:
//! any state may be set from any other state through the dedicated
//! status-update operation, so town halls can correct mislogged donations
//! without an administrator unwinding the pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

/// Lifecycle stage of a donation, stored as text in `donations.status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DonationStatus {
    Requested,
    ReceivedByTownHall,
    ReceivedByAssociation,
    Reconditioning,
    ReadyForRecipient,
    Delivered,
}

impl DonationStatus {
    /// All stages in pipeline order.
    pub const ALL: [DonationStatus; 6] = [
        DonationStatus::Requested,
        DonationStatus::ReceivedByTownHall,
        DonationStatus::ReceivedByAssociation,
        DonationStatus::Reconditioning,
        DonationStatus::ReadyForRecipient,
        DonationStatus::Delivered,
    ];

    /// The state every donation starts in.
    pub fn initial() -> Self {
        DonationStatus::Requested
    }

    /// Whether this is the final pipeline stage. Terminal by convention
    /// only: the status can still be overwritten afterwards.
    pub fn is_terminal(self) -> bool {
        self == DonationStatus::Delivered
    }

    /// The database/API string for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            DonationStatus::Requested => "requested",
            DonationStatus::ReceivedByTownHall => "received_by_town_hall",
            DonationStatus::ReceivedByAssociation => "received_by_association",
            DonationStatus::Reconditioning => "reconditioning",
            DonationStatus::ReadyForRecipient => "ready_for_recipient",
            DonationStatus::Delivered => "delivered",
        }
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DonationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DonationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown donation status '{s}'")))
    }
}

/// Generate a human-readable donation reference.
///
/// Shape: `PRD-<YYYYMMDD>-<8 hex chars>`, e.g. `PRD-20260830-9f2c41ab`.
/// The date is the UTC creation date; the suffix is the first group of a
/// v4 UUID. References are immutable after creation and carry a unique
/// constraint in the database.
pub fn generate_reference() -> String {
    let date = chrono::Utc::now().format("%Y%m%d");
    let uuid = Uuid::new_v4().to_string();
    let suffix = uuid.split('-').next().unwrap_or("00000000");
    format!("PRD-{date}-{suffix}")
}
