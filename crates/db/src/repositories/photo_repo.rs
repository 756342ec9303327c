//! Repository for the `photos` table.

use rebond_core::types::DbId;
use sqlx::PgPool;

use crate::models::photo::Photo;

/// Read access to photo rows. Writes go through `DonationRepo`, which
/// owns the photo set transactionally.
pub struct PhotoRepo;

impl PhotoRepo {
    /// List all photos of a donation, ordered by insertion.
    pub async fn list_by_donation(
        pool: &PgPool,
        donation_id: DbId,
    ) -> Result<Vec<Photo>, sqlx::Error> {
        sqlx::query_as::<_, Photo>(
            "SELECT id, url, donation_id FROM photos WHERE donation_id = $1 ORDER BY id",
        )
        .bind(donation_id)
        .fetch_all(pool)
        .await
    }
}
