pub mod certificates;
pub mod donations;
pub mod health;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /users                            register (public)
/// /users/login                      login (public)
/// /users/refresh                    refresh token exchange (public)
/// /users/me                         get, update, soft-delete (requires auth)
///
/// /donations                        list, create (multipart)
/// /donations/{id}                   get, update (multipart), delete
/// /donations/{id}/status            overwrite lifecycle status (PUT)
/// /donations/{id}/association       assign association (PUT)
/// /donations/{id}/deposited         stamp deposit time (PUT)
/// /donations/{id}/qr                QR code PNG (GET)
/// /donations/donor/{user_id}        filter by donor
/// /donations/town-hall/{user_id}    filter by town hall
/// /donations/association/{user_id}  filter by association
///
/// /certificates                     render + persist certificate (POST)
/// /certificates/{reference}         stored certificate PDF (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Accounts and authentication.
        .nest("/users", users::router())
        // Donation lifecycle (also nests QR and party-filtered lists).
        .nest("/donations", donations::router())
        // Data-wiping certificates.
        .nest("/certificates", certificates::router())
}
