//! Photo attachment model.

use rebond_core::types::DbId;
use serde::Serialize;
use sqlx::FromRow;

/// A photo row from the `photos` table. The URL points at a blob in the
/// upload store; the row owns nothing but the reference.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Photo {
    pub id: DbId,
    pub url: String,
    pub donation_id: DbId,
}
