//! QR code endpoint: a PNG linking back to the donation's detail URL.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::IntoResponse;
use rebond_core::error::CoreError;
use rebond_core::qr::{donation_url, render_qr_png};
use rebond_core::types::DbId;
use rebond_db::repositories::DonationRepo;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/v1/donations/{id}/qr
pub async fn get_donation_qr(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if DonationRepo::find_by_id(&state.pool, id).await?.is_none() {
        return Err(AppError::Core(CoreError::not_found("Donation", id)));
    }

    let url = donation_url(&state.config.public_base_url, id);
    let png = render_qr_png(&url).map_err(AppError::Core)?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
