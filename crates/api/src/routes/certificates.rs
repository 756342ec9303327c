//! Route definitions for data-wiping certificates.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::certificates;
use crate::state::AppState;

/// Routes mounted at `/certificates`.
///
/// ```text
/// POST /              render and persist a certificate PDF
/// GET  /{reference}   stream a stored certificate
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(certificates::generate))
        .route("/{reference}", get(certificates::get_by_reference))
}
