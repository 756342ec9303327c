//! Route definitions for user accounts and authentication.
//!
//! Registration, login and refresh are public; the `/me` routes resolve
//! the caller through the `AuthUser` extractor.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::users;
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// POST   /           register (public)
/// POST   /login      login (public)
/// POST   /refresh    exchange a refresh token (public)
/// GET    /me         current account
/// PUT    /me         partial update of the current account
/// DELETE /me         soft-delete the current account
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(users::register))
        .route("/login", post(users::login))
        .route("/refresh", post(users::refresh))
        .route(
            "/me",
            get(users::me).put(users::update_me).delete(users::delete_me),
        )
}
