//! Donation entity model and DTOs.

use rebond_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::photo::Photo;

/// A donation row from the `donations` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Donation {
    pub id: DbId,
    /// Immutable human-readable reference, `PRD-<date>-<hex>`.
    pub reference: String,
    pub title: String,
    pub description: Option<String>,
    pub issue_description: Option<String>,
    pub brand: Option<String>,
    /// Lifecycle status string, one of `rebond_core::donation::DonationStatus`.
    pub status: String,
    pub donor_id: DbId,
    pub town_hall_id: DbId,
    pub association_id: Option<DbId>,
    pub deposited_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A donation enriched with its photo set, as returned by read endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct DonationWithPhotos {
    #[serde(flatten)]
    pub donation: Donation,
    pub photos: Vec<Photo>,
}

/// DTO for inserting a new donation. Reference and status are supplied by
/// the caller (generated once; forced to the initial state).
#[derive(Debug, Clone)]
pub struct CreateDonation {
    pub reference: String,
    pub title: String,
    pub description: Option<String>,
    pub issue_description: Option<String>,
    pub brand: Option<String>,
    pub status: String,
    pub donor_id: DbId,
    pub town_hall_id: DbId,
}

/// DTO for the generic partial-update path. All fields optional; `status`
/// is carried only so the handler can reject attempts to change it here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDonation {
    pub title: Option<String>,
    pub description: Option<String>,
    pub issue_description: Option<String>,
    pub brand: Option<String>,
    /// Never applied: status changes go through the dedicated operation.
    pub status: Option<String>,
}

impl UpdateDonation {
    /// Whether any applicable scalar field was supplied.
    pub fn has_field_changes(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.issue_description.is_some()
            || self.brand.is_some()
    }
}
