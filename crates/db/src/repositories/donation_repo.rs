//! Repository for the `donations` table and its owned `photos` rows.
//!
//! Multi-row writes (create with photos, photo reconciliation, delete)
//! run inside a single transaction so a failure never leaves a donation
//! without its photo rows or orphaned photo rows without a donation.

use std::collections::HashSet;

use rebond_core::types::DbId;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::donation::{CreateDonation, Donation, DonationWithPhotos, UpdateDonation};
use crate::models::photo::Photo;
use crate::repositories::photo_repo::PhotoRepo;

/// Column list for the `donations` table.
const COLUMNS: &str = "id, reference, title, description, issue_description, brand, status, \
    donor_id, town_hall_id, association_id, deposited_at, created_at, updated_at";

/// Provides CRUD and lifecycle operations for donations.
pub struct DonationRepo;

impl DonationRepo {
    /// Insert a new donation together with its photo rows.
    ///
    /// The donation and all photos commit as one transaction; on any
    /// failure nothing is persisted.
    pub async fn create(
        pool: &PgPool,
        input: &CreateDonation,
        photo_urls: &[String],
    ) -> Result<DonationWithPhotos, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let insert_query = format!(
            "INSERT INTO donations \
                (reference, title, description, issue_description, brand, status, \
                 donor_id, town_hall_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        );
        let donation = sqlx::query_as::<_, Donation>(&insert_query)
            .bind(&input.reference)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.issue_description)
            .bind(&input.brand)
            .bind(&input.status)
            .bind(input.donor_id)
            .bind(input.town_hall_id)
            .fetch_one(&mut *tx)
            .await?;

        let mut photos = Vec::with_capacity(photo_urls.len());
        for url in photo_urls {
            photos.push(Self::insert_photo(&mut tx, donation.id, url).await?);
        }

        tx.commit().await?;
        Ok(DonationWithPhotos { donation, photos })
    }

    /// Find a donation by its internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Donation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM donations WHERE id = $1");
        sqlx::query_as::<_, Donation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a donation by its immutable reference.
    pub async fn find_by_reference(
        pool: &PgPool,
        reference: &str,
    ) -> Result<Option<Donation>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM donations WHERE reference = $1");
        sqlx::query_as::<_, Donation>(&query)
            .bind(reference)
            .fetch_optional(pool)
            .await
    }

    /// Find a donation by ID, enriched with its photos.
    pub async fn find_by_id_with_photos(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<DonationWithPhotos>, sqlx::Error> {
        match Self::find_by_id(pool, id).await? {
            Some(donation) => {
                let photos = PhotoRepo::list_by_donation(pool, donation.id).await?;
                Ok(Some(DonationWithPhotos { donation, photos }))
            }
            None => Ok(None),
        }
    }

    /// List donations with their photos, ordered by `id` so `skip`/`limit`
    /// pagination stays stable across requests.
    pub async fn list(
        pool: &PgPool,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<DonationWithPhotos>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM donations ORDER BY id OFFSET $1 LIMIT $2");
        let donations = sqlx::query_as::<_, Donation>(&query)
            .bind(skip)
            .bind(limit)
            .fetch_all(pool)
            .await?;
        Self::attach_photos(pool, donations).await
    }

    /// List donations where the given user is the donor.
    pub async fn list_by_donor(
        pool: &PgPool,
        donor_id: DbId,
    ) -> Result<Vec<DonationWithPhotos>, sqlx::Error> {
        Self::list_by_party(pool, "donor_id", donor_id).await
    }

    /// List donations logged by the given town hall.
    pub async fn list_by_town_hall(
        pool: &PgPool,
        town_hall_id: DbId,
    ) -> Result<Vec<DonationWithPhotos>, sqlx::Error> {
        Self::list_by_party(pool, "town_hall_id", town_hall_id).await
    }

    /// List donations assigned to the given association.
    pub async fn list_by_association(
        pool: &PgPool,
        association_id: DbId,
    ) -> Result<Vec<DonationWithPhotos>, sqlx::Error> {
        Self::list_by_party(pool, "association_id", association_id).await
    }

    /// Apply a partial field update and reconcile the photo set in one
    /// transaction.
    ///
    /// `updated_at` only advances when `input` carries at least one
    /// applicable field. When `new_photo_urls` is `Some`, the stored photo
    /// set is diffed against it: rows whose URL disappeared are deleted,
    /// new URLs are inserted, and URLs present in both keep their row ids.
    /// `None` leaves the photo set untouched.
    ///
    /// Returns the updated donation with photos plus the URLs whose rows
    /// were removed (so the caller can clean up blobs), or `None` if the
    /// donation does not exist.
    pub async fn update_with_photos(
        pool: &PgPool,
        id: DbId,
        input: &UpdateDonation,
        new_photo_urls: Option<&[String]>,
    ) -> Result<Option<(DonationWithPhotos, Vec<String>)>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let update_query = format!(
            "UPDATE donations SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                issue_description = COALESCE($4, issue_description),
                brand = COALESCE($5, brand),
                updated_at = CASE WHEN $6 THEN NOW() ELSE updated_at END
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let donation = sqlx::query_as::<_, Donation>(&update_query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(&input.issue_description)
            .bind(&input.brand)
            .bind(input.has_field_changes())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(donation) = donation else {
            tx.rollback().await?;
            return Ok(None);
        };

        let mut removed_urls = Vec::new();
        if let Some(new_urls) = new_photo_urls {
            removed_urls = Self::reconcile_photos(&mut tx, id, new_urls).await?;
        }

        tx.commit().await?;

        let photos = PhotoRepo::list_by_donation(pool, id).await?;
        Ok(Some((DonationWithPhotos { donation, photos }, removed_urls)))
    }

    /// Overwrite the lifecycle status. No transition validation: any state
    /// is reachable from any state through this operation.
    pub async fn set_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Donation>, sqlx::Error> {
        let query = format!(
            "UPDATE donations SET status = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Donation>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Assign the recipient association.
    pub async fn set_association(
        pool: &PgPool,
        id: DbId,
        association_id: DbId,
    ) -> Result<Option<Donation>, sqlx::Error> {
        let query = format!(
            "UPDATE donations SET association_id = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Donation>(&query)
            .bind(id)
            .bind(association_id)
            .fetch_optional(pool)
            .await
    }

    /// Stamp the deposit timestamp. Calling this again overwrites the
    /// previous value with a later one.
    pub async fn set_deposited(pool: &PgPool, id: DbId) -> Result<Option<Donation>, sqlx::Error> {
        let query = format!(
            "UPDATE donations SET deposited_at = NOW(), updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Donation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a donation and its photo rows (photos first, inside one
    /// transaction, to preserve referential integrity).
    ///
    /// Returns the URLs of the removed photos so the caller can clean up
    /// blobs, or `None` if the donation does not exist.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<Vec<String>>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let urls: Vec<String> =
            sqlx::query_scalar("SELECT url FROM photos WHERE donation_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM photos WHERE donation_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM donations WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(urls))
    }

    // -- helpers ----------------------------------------------------------

    async fn insert_photo(
        tx: &mut Transaction<'_, Postgres>,
        donation_id: DbId,
        url: &str,
    ) -> Result<Photo, sqlx::Error> {
        sqlx::query_as::<_, Photo>(
            "INSERT INTO photos (url, donation_id) VALUES ($1, $2)
             RETURNING id, url, donation_id",
        )
        .bind(url)
        .bind(donation_id)
        .fetch_one(&mut **tx)
        .await
    }

    /// Diff the stored photo URLs against `new_urls` inside `tx`: delete
    /// rows that disappeared, insert rows that are new, leave the rest
    /// untouched. Returns the deleted URLs.
    async fn reconcile_photos(
        tx: &mut Transaction<'_, Postgres>,
        donation_id: DbId,
        new_urls: &[String],
    ) -> Result<Vec<String>, sqlx::Error> {
        let current: Vec<String> =
            sqlx::query_scalar("SELECT url FROM photos WHERE donation_id = $1")
                .bind(donation_id)
                .fetch_all(&mut **tx)
                .await?;

        let current_set: HashSet<&str> = current.iter().map(String::as_str).collect();
        let new_set: HashSet<&str> = new_urls.iter().map(String::as_str).collect();

        let removed: Vec<String> = current
            .iter()
            .filter(|url| !new_set.contains(url.as_str()))
            .cloned()
            .collect();

        if !removed.is_empty() {
            sqlx::query("DELETE FROM photos WHERE donation_id = $1 AND url = ANY($2)")
                .bind(donation_id)
                .bind(&removed)
                .execute(&mut **tx)
                .await?;
        }

        for url in new_urls {
            if !current_set.contains(url.as_str()) {
                Self::insert_photo(tx, donation_id, url).await?;
            }
        }

        Ok(removed)
    }

    async fn list_by_party(
        pool: &PgPool,
        column: &str,
        user_id: DbId,
    ) -> Result<Vec<DonationWithPhotos>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM donations WHERE {column} = $1 ORDER BY id");
        let donations = sqlx::query_as::<_, Donation>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await?;
        Self::attach_photos(pool, donations).await
    }

    async fn attach_photos(
        pool: &PgPool,
        donations: Vec<Donation>,
    ) -> Result<Vec<DonationWithPhotos>, sqlx::Error> {
        let mut enriched = Vec::with_capacity(donations.len());
        for donation in donations {
            let photos = PhotoRepo::list_by_donation(pool, donation.id).await?;
            enriched.push(DonationWithPhotos { donation, photos });
        }
        Ok(enriched)
    }
}
