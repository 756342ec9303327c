//! Route definitions for donations and their sub-resources.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::{donations, qr};
use crate::state::AppState;

/// Routes mounted at `/donations`.
///
/// ```text
/// GET    /                          list (skip/limit pagination)
/// POST   /                          create (multipart: fields + photos)
/// GET    /{id}                      get_by_id
/// PUT    /{id}                      update (multipart, status rejected)
/// DELETE /{id}                      delete
///
/// PUT    /{id}/status               overwrite lifecycle status
/// PUT    /{id}/association          assign recipient association
/// PUT    /{id}/deposited            stamp deposit timestamp
/// GET    /{id}/qr                   QR code PNG for the detail URL
///
/// GET    /donor/{user_id}           donations where the user donates
/// GET    /town-hall/{user_id}       donations collected by the town hall
/// GET    /association/{user_id}     donations assigned to the association
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(donations::list).post(donations::create))
        .route(
            "/{id}",
            get(donations::get_by_id)
                .put(donations::update)
                .delete(donations::delete),
        )
        .route("/{id}/status", put(donations::set_status))
        .route("/{id}/association", put(donations::assign_association))
        .route("/{id}/deposited", put(donations::mark_deposited))
        .route("/{id}/qr", get(qr::get_donation_qr))
        .route("/donor/{user_id}", get(donations::list_by_donor))
        .route("/town-hall/{user_id}", get(donations::list_by_town_hall))
        .route(
            "/association/{user_id}",
            get(donations::list_by_association),
        )
}
