//! Data-wiping certificate endpoints.
//!
//! The certificate is rendered once on demand and persisted as a PDF
//! under the upload root; fetching it later just streams the stored
//! file back.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use rebond_core::certificate::render_certificate;
use rebond_core::error::CoreError;
use rebond_core::types::DbId;
use rebond_db::repositories::{DonationRepo, UserRepo};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Request body for `POST /certificates`.
#[derive(Debug, Deserialize)]
pub struct GenerateCertificateRequest {
    pub town_hall_id: DbId,
    pub association_id: DbId,
    pub reference: String,
}

/// Response body for `POST /certificates`.
#[derive(Debug, Serialize)]
pub struct CertificateResponse {
    pub reference: String,
    pub path: String,
}

/// POST /api/v1/certificates
///
/// Render and persist the certificate for a donation. The donation is
/// looked up by reference; both named parties must be live users.
pub async fn generate(
    State(state): State<AppState>,
    Json(input): Json<GenerateCertificateRequest>,
) -> AppResult<(StatusCode, Json<CertificateResponse>)> {
    let town_hall = UserRepo::find_by_id(&state.pool, input.town_hall_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("TownHall", input.town_hall_id)))?;
    let association = UserRepo::find_by_id(&state.pool, input.association_id)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Association", input.association_id)))?;

    let donation = DonationRepo::find_by_reference(&state.pool, &input.reference)
        .await?
        .ok_or_else(|| AppError::Core(CoreError::not_found("Donation", &input.reference)))?;

    let pdf = render_certificate(&town_hall.name, &association.name, &donation.reference)
        .map_err(AppError::Core)?;
    let path = state
        .uploads
        .save_certificate(&donation.reference, &pdf)
        .await
        .map_err(AppError::Core)?;

    Ok((
        StatusCode::CREATED,
        Json(CertificateResponse {
            reference: donation.reference,
            path,
        }),
    ))
}

/// GET /api/v1/certificates/{reference}
///
/// Stream a previously generated certificate. 404 when the donation does
/// not exist or no certificate has been generated for it yet.
pub async fn get_by_reference(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> AppResult<impl IntoResponse> {
    if DonationRepo::find_by_reference(&state.pool, &reference)
        .await?
        .is_none()
    {
        return Err(AppError::Core(CoreError::not_found("Donation", &reference)));
    }

    let bytes = state
        .uploads
        .read_certificate(&reference)
        .await
        .ok_or_else(|| AppError::Core(CoreError::not_found("Certificate", &reference)))?;

    Ok(([(header::CONTENT_TYPE, "application/pdf")], bytes))
}
