//! Handlers for the `/donations` resource -- the donation lifecycle
//! manager surface.
//!
//! Create and update accept multipart payloads mixing text fields and
//! photo uploads. Blob writes happen before the database transaction;
//! when the transaction fails, freshly written blobs are deleted so a
//! failed request persists nothing.

use axum::body::Bytes;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rebond_core::donation::{generate_reference, DonationStatus};
use rebond_core::error::CoreError;
use rebond_core::types::DbId;
use rebond_db::models::donation::{CreateDonation, DonationWithPhotos, UpdateDonation};
use rebond_db::repositories::{clamp_limit, clamp_offset, DonationRepo, PhotoRepo, UserRepo};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Request body for `PUT /donations/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Request body for `PUT /donations/{id}/association`.
#[derive(Debug, Deserialize)]
pub struct AssignAssociationRequest {
    pub association_user_id: DbId,
}

/// A photo part extracted from a multipart payload.
struct PhotoUpload {
    filename: String,
    content_type: String,
    bytes: Bytes,
}

/// Text fields + photo parts of a donation multipart payload.
#[derive(Default)]
struct DonationForm {
    title: Option<String>,
    description: Option<String>,
    issue_description: Option<String>,
    brand: Option<String>,
    status: Option<String>,
    donor_id: Option<DbId>,
    town_hall_id: Option<DbId>,
    photos: Vec<PhotoUpload>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/donations
///
/// Create a donation with zero or more attached photos. Donor and town
/// hall must resolve to existing users; the reference is generated here
/// and never changes; status starts at `requested` regardless of input.
pub async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DonationWithPhotos>)> {
    let form = parse_donation_form(multipart).await?;

    let title = form
        .title
        .ok_or_else(|| AppError::BadRequest("Missing field 'title'".into()))?;
    let donor_id = form
        .donor_id
        .ok_or_else(|| AppError::BadRequest("Missing field 'donor_id'".into()))?;
    let town_hall_id = form
        .town_hall_id
        .ok_or_else(|| AppError::BadRequest("Missing field 'town_hall_id'".into()))?;

    // Both parties must exist before anything is written.
    if UserRepo::find_by_id(&state.pool, donor_id).await?.is_none() {
        return Err(AppError::Core(CoreError::not_found("User", donor_id)));
    }
    if UserRepo::find_by_id(&state.pool, town_hall_id)
        .await?
        .is_none()
    {
        return Err(AppError::Core(CoreError::not_found("User", town_hall_id)));
    }

    // Blobs first, rows second; orphan blobs are deleted on failure.
    let photo_urls = write_photo_blobs(&state, &form.photos).await?;

    let input = CreateDonation {
        reference: generate_reference(),
        title,
        description: form.description,
        issue_description: form.issue_description,
        brand: form.brand,
        status: DonationStatus::initial().as_str().to_string(),
        donor_id,
        town_hall_id,
    };

    match DonationRepo::create(&state.pool, &input, &photo_urls).await {
        Ok(created) => Ok((StatusCode::CREATED, Json(created))),
        Err(err) => {
            remove_blobs(&state, &photo_urls).await;
            Err(err.into())
        }
    }
}

/// GET /api/v1/donations?skip=&limit=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Vec<DonationWithPhotos>>> {
    let donations = DonationRepo::list(
        &state.pool,
        clamp_offset(params.skip),
        clamp_limit(params.limit),
    )
    .await?;
    Ok(Json(donations))
}

/// GET /api/v1/donations/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DonationWithPhotos>> {
    let donation = DonationRepo::find_by_id_with_photos(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Donation", id)))?;
    Ok(Json(donation))
}

/// GET /api/v1/donations/donor/{user_id}
pub async fn list_by_donor(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<Vec<DonationWithPhotos>>> {
    require_user(&state, user_id, "User").await?;
    Ok(Json(DonationRepo::list_by_donor(&state.pool, user_id).await?))
}

/// GET /api/v1/donations/town-hall/{user_id}
pub async fn list_by_town_hall(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<Vec<DonationWithPhotos>>> {
    require_user(&state, user_id, "TownHall").await?;
    Ok(Json(
        DonationRepo::list_by_town_hall(&state.pool, user_id).await?,
    ))
}

/// GET /api/v1/donations/association/{user_id}
pub async fn list_by_association(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
) -> AppResult<Json<Vec<DonationWithPhotos>>> {
    require_user(&state, user_id, "Association").await?;
    Ok(Json(
        DonationRepo::list_by_association(&state.pool, user_id).await?,
    ))
}

/// PUT /api/v1/donations/{id}
///
/// Partial update. A `status` field anywhere in the payload is rejected
/// with 403 and nothing else from the payload is applied. When photo
/// parts are present, the stored photo set is reconciled to exactly the
/// uploaded set; a payload without photo parts leaves photos untouched.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<DonationWithPhotos>> {
    let form = parse_donation_form(multipart).await?;

    // Status changes only go through the dedicated operation. All-or-
    // nothing: the other fields in this payload are not applied either.
    if form.status.is_some() {
        return Err(AppError::Core(CoreError::Forbidden(
            "Donation status cannot be changed through this endpoint".into(),
        )));
    }

    if DonationRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::Core(CoreError::not_found("Donation", id)));
    }

    let input = UpdateDonation {
        title: form.title,
        description: form.description,
        issue_description: form.issue_description,
        brand: form.brand,
        status: None,
    };

    // Stage blobs for genuinely new URLs only; unchanged URLs keep both
    // their blob and their photo row.
    let mut new_urls: Option<Vec<String>> = None;
    let mut staged: Vec<String> = Vec::new();
    if !form.photos.is_empty() {
        let current: Vec<String> = PhotoRepo::list_by_donation(&state.pool, id)
            .await?
            .into_iter()
            .map(|p| p.url)
            .collect();

        let mut urls = Vec::with_capacity(form.photos.len());
        for photo in &form.photos {
            let url = state.uploads.image_url(&photo.filename);
            if !current.contains(&url) && !staged.contains(&url) {
                state
                    .uploads
                    .save_image(&photo.filename, &photo.content_type, &photo.bytes)
                    .await
                    .map_err(AppError::Core)?;
                staged.push(url.clone());
            }
            urls.push(url);
        }
        new_urls = Some(urls);
    }

    let result =
        DonationRepo::update_with_photos(&state.pool, id, &input, new_urls.as_deref()).await;

    match result {
        Ok(Some((updated, removed_urls))) => {
            remove_blobs(&state, &removed_urls).await;
            Ok(Json(updated))
        }
        Ok(None) => {
            remove_blobs(&state, &staged).await;
            Err(AppError::Core(CoreError::not_found("Donation", id)))
        }
        Err(err) => {
            remove_blobs(&state, &staged).await;
            Err(err.into())
        }
    }
}

/// PUT /api/v1/donations/{id}/status
///
/// Overwrite the lifecycle status. Any state is reachable from any
/// state; only the status value itself is validated.
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateStatusRequest>,
) -> AppResult<Json<DonationWithPhotos>> {
    let status: DonationStatus = input.status.parse().map_err(AppError::Core)?;

    DonationRepo::set_status(&state.pool, id, status.as_str())
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Donation", id)))?;

    let donation = DonationRepo::find_by_id_with_photos(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Donation", id)))?;
    Ok(Json(donation))
}

/// PUT /api/v1/donations/{id}/association
///
/// Assign the recipient association. The donation is checked first, then
/// the user; a failed lookup leaves the donation untouched.
pub async fn assign_association(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<AssignAssociationRequest>,
) -> AppResult<Json<DonationWithPhotos>> {
    if DonationRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::Core(CoreError::not_found("Donation", id)));
    }
    require_user(&state, input.association_user_id, "Association").await?;

    DonationRepo::set_association(&state.pool, id, input.association_user_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Donation", id)))?;

    let donation = DonationRepo::find_by_id_with_photos(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Donation", id)))?;
    Ok(Json(donation))
}

/// PUT /api/v1/donations/{id}/deposited
///
/// Stamp the deposit timestamp with "now". A repeat call overwrites the
/// stamp with a later value.
pub async fn mark_deposited(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DonationWithPhotos>> {
    DonationRepo::set_deposited(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Donation", id)))?;

    let donation = DonationRepo::find_by_id_with_photos(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Donation", id)))?;
    Ok(Json(donation))
}

/// DELETE /api/v1/donations/{id}
///
/// Remove the donation and its photo rows, then clean up the photo blobs
/// best-effort. Returns 204 No Content.
pub async fn delete(State(state): State<AppState>, Path(id): Path<DbId>) -> AppResult<StatusCode> {
    let removed_urls = DonationRepo::delete(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Donation", id)))?;

    remove_blobs(&state, &removed_urls).await;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a donation multipart payload into text fields and photo parts.
///
/// Photo parts (any field carrying a filename) are validated eagerly:
/// a non-`image/*` content type fails the whole request before anything
/// is persisted. Unknown text fields are ignored.
async fn parse_donation_form(mut multipart: Multipart) -> AppResult<DonationForm> {
    let mut form = DonationForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if let Some(filename) = field.file_name() {
            let filename = filename.to_string();
            let content_type = field.content_type().unwrap_or_default().to_string();
            if !content_type.starts_with("image/") {
                return Err(AppError::Core(CoreError::Validation(format!(
                    "File '{filename}' is not a valid image"
                ))));
            }
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            form.photos.push(PhotoUpload {
                filename,
                content_type,
                bytes,
            });
            continue;
        }

        let name = field.name().unwrap_or_default().to_string();
        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        match name.as_str() {
            "title" => form.title = Some(value),
            "description" => form.description = Some(value),
            "issue_description" => form.issue_description = Some(value),
            "brand" => form.brand = Some(value),
            "status" => form.status = Some(value),
            "donor_id" => form.donor_id = Some(parse_id(&name, &value)?),
            "town_hall_id" => form.town_hall_id = Some(parse_id(&name, &value)?),
            _ => {}
        }
    }

    Ok(form)
}

fn parse_id(name: &str, value: &str) -> Result<DbId, AppError> {
    value
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Field '{name}' must be a numeric user id")))
}

/// Write all photo parts to the blob store, returning their URLs. When a
/// write fails, blobs already written for this request are removed.
async fn write_photo_blobs(state: &AppState, photos: &[PhotoUpload]) -> AppResult<Vec<String>> {
    let mut urls = Vec::with_capacity(photos.len());
    for photo in photos {
        match state
            .uploads
            .save_image(&photo.filename, &photo.content_type, &photo.bytes)
            .await
        {
            Ok(url) => urls.push(url),
            Err(err) => {
                remove_blobs(state, &urls).await;
                return Err(AppError::Core(err));
            }
        }
    }
    Ok(urls)
}

/// Best-effort blob cleanup.
async fn remove_blobs(state: &AppState, urls: &[String]) {
    for url in urls {
        state.uploads.remove_by_url(url).await;
    }
}

/// 404 unless the user id resolves to a live user.
async fn require_user(state: &AppState, user_id: DbId, entity: &'static str) -> AppResult<()> {
    if UserRepo::find_by_id(&state.pool, user_id).await?.is_none() {
        return Err(AppError::Core(CoreError::not_found(entity, user_id)));
    }
    Ok(())
}
