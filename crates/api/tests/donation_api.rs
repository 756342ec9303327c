//! HTTP-level integration tests for the donation lifecycle endpoints:
//! multipart create/update, photo reconciliation, status transitions,
//! party assignment, deletion, and the QR code.

mod common;

use axum::http::{Method, StatusCode};
use axum::Router;
use common::{
    body_bytes, body_json, delete, get, post_json, put_json, send_multipart, MultipartBody,
};
use sqlx::PgPool;

const PNG_A: &[u8] = b"\x89PNG\r\n\x1a\nfake-a";
const PNG_B: &[u8] = b"\x89PNG\r\n\x1a\nfake-b";
const PNG_C: &[u8] = b"\x89PNG\r\n\x1a\nfake-c";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Register a user via the API and return its id.
async fn register_user(app: Router, name: &str, email: &str, role: &str) -> i64 {
    let body = serde_json::json!({
        "name": name,
        "email": email,
        "phone": "0600000000",
        "role": role,
        "password": "s3cret-password!",
    });
    let response = post_json(app, "/api/v1/users", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["user"]["id"].as_i64().unwrap()
}

/// Register the standard donor + town hall pair.
async fn register_parties(app: Router) -> (i64, i64) {
    let donor = register_user(
        app.clone(),
        "Donor",
        "donor@example.com",
        "individual",
    )
    .await;
    let town_hall = register_user(app, "Town Hall", "mairie@example.com", "town_hall").await;
    (donor, town_hall)
}

fn donation_form(donor_id: i64, town_hall_id: i64) -> MultipartBody {
    MultipartBody::new()
        .text("title", "Laptop")
        .text("description", "A well-loved laptop")
        .text("donor_id", &donor_id.to_string())
        .text("town_hall_id", &town_hall_id.to_string())
}

/// Create a donation with two photos and return its JSON.
async fn create_donation(app: Router, donor_id: i64, town_hall_id: i64) -> serde_json::Value {
    let body = donation_form(donor_id, town_hall_id)
        .file("files", "a.png", "image/png", PNG_A)
        .file("files", "b.png", "image/png", PNG_B);
    let response = send_multipart(app, Method::POST, "/api/v1/donations", body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

fn photo_urls(json: &serde_json::Value) -> Vec<String> {
    let mut urls: Vec<String> = json["photos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["url"].as_str().unwrap().to_string())
        .collect();
    urls.sort();
    urls
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Creation persists fields, attaches photos, generates a reference, and
/// starts the lifecycle at `requested`.
#[sqlx::test(migrations = "../../db/migrations")]
async fn create_returns_donation_with_photos(pool: PgPool) {
    let (app, _uploads) = common::build_test_app(pool);
    let (donor, town_hall) = register_parties(app.clone()).await;

    let json = create_donation(app, donor, town_hall).await;

    assert_eq!(json["title"], "Laptop");
    assert_eq!(json["status"], "requested");
    assert_eq!(json["donor_id"], donor);
    assert_eq!(json["town_hall_id"], town_hall);
    assert!(json["association_id"].is_null());
    assert!(json["deposited_at"].is_null());

    // PRD-<yyyymmdd>-<8 hex chars>
    let reference = json["reference"].as_str().unwrap();
    let parts: Vec<&str> = reference.split('-').collect();
    assert_eq!(parts[0], "PRD");
    assert_eq!(parts[1].len(), 8);
    assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
    assert_eq!(parts[2].len(), 8);

    assert_eq!(
        photo_urls(&json),
        vec!["/uploads/images/a.png", "/uploads/images/b.png"]
    );
}

/// A missing donor or town hall fails with 404 before anything is stored.
#[sqlx::test(migrations = "../../db/migrations")]
async fn create_with_unknown_party_is_not_found(pool: PgPool) {
    let (app, _uploads) = common::build_test_app(pool);
    let (donor, _town_hall) = register_parties(app.clone()).await;

    let body = donation_form(donor, 9999);
    let response = send_multipart(app.clone(), Method::POST, "/api/v1/donations", body).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let list = get(app, "/api/v1/donations").await;
    assert_eq!(body_json(list).await.as_array().unwrap().len(), 0);
}

/// A non-image upload fails validation and nothing is persisted.
#[sqlx::test(migrations = "../../db/migrations")]
async fn create_rejects_non_image_uploads(pool: PgPool) {
    let (app, _uploads) = common::build_test_app(pool);
    let (donor, town_hall) = register_parties(app.clone()).await;

    let body = donation_form(donor, town_hall).file("files", "notes.txt", "text/plain", b"hello");
    let response = send_multipart(app.clone(), Method::POST, "/api/v1/donations", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let list = get(app, "/api/v1/donations").await;
    assert_eq!(body_json(list).await.as_array().unwrap().len(), 0);
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// The generic update applies only the provided fields.
#[sqlx::test(migrations = "../../db/migrations")]
async fn update_is_partial(pool: PgPool) {
    let (app, _uploads) = common::build_test_app(pool);
    let (donor, town_hall) = register_parties(app.clone()).await;
    let created = create_donation(app.clone(), donor, town_hall).await;
    let id = created["id"].as_i64().unwrap();

    let body = MultipartBody::new().text("brand", "ThinkPad");
    let response =
        send_multipart(app, Method::PUT, &format!("/api/v1/donations/{id}"), body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["brand"], "ThinkPad");
    assert_eq!(json["title"], "Laptop");
    assert_eq!(json["description"], "A well-loved laptop");
    // Photos are untouched when no files are uploaded.
    assert_eq!(photo_urls(&json).len(), 2);
}

/// A `status` field in the generic update payload is rejected outright and
/// none of the other fields are applied.
#[sqlx::test(migrations = "../../db/migrations")]
async fn update_rejects_status_changes_all_or_nothing(pool: PgPool) {
    let (app, _uploads) = common::build_test_app(pool);
    let (donor, town_hall) = register_parties(app.clone()).await;
    let created = create_donation(app.clone(), donor, town_hall).await;
    let id = created["id"].as_i64().unwrap();

    let body = MultipartBody::new()
        .text("title", "Sneaky title")
        .text("status", "delivered");
    let response = send_multipart(
        app.clone(),
        Method::PUT,
        &format!("/api/v1/donations/{id}"),
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let fetched = body_json(get(app, &format!("/api/v1/donations/{id}")).await).await;
    assert_eq!(fetched["title"], "Laptop");
    assert_eq!(fetched["status"], "requested");
}

/// Uploading a new photo set reconciles by URL: kept, added, removed.
#[sqlx::test(migrations = "../../db/migrations")]
async fn update_reconciles_the_photo_set(pool: PgPool) {
    let (app, _uploads) = common::build_test_app(pool);
    let (donor, town_hall) = register_parties(app.clone()).await;
    let created = create_donation(app.clone(), donor, town_hall).await;
    let id = created["id"].as_i64().unwrap();

    let body = MultipartBody::new()
        .file("files", "b.png", "image/png", PNG_B)
        .file("files", "c.png", "image/png", PNG_C);
    let response = send_multipart(
        app.clone(),
        Method::PUT,
        &format!("/api/v1/donations/{id}"),
        body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(
        photo_urls(&json),
        vec!["/uploads/images/b.png", "/uploads/images/c.png"]
    );
}

/// Updating a donation that does not exist is 404.
#[sqlx::test(migrations = "../../db/migrations")]
async fn update_unknown_donation_is_not_found(pool: PgPool) {
    let (app, _uploads) = common::build_test_app(pool);

    let body = MultipartBody::new().text("title", "Ghost");
    let response = send_multipart(app, Method::PUT, "/api/v1/donations/42", body).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Lifecycle operations
// ---------------------------------------------------------------------------

/// The dedicated status operation accepts any known state, from any state.
#[sqlx::test(migrations = "../../db/migrations")]
async fn set_status_moves_through_the_lifecycle(pool: PgPool) {
    let (app, _uploads) = common::build_test_app(pool);
    let (donor, town_hall) = register_parties(app.clone()).await;
    let created = create_donation(app.clone(), donor, town_hall).await;
    let id = created["id"].as_i64().unwrap();

    for status in [
        "received_by_town_hall",
        "reconditioning",
        "delivered",
        // Walking backwards is allowed.
        "requested",
    ] {
        let response = put_json(
            app.clone(),
            &format!("/api/v1/donations/{id}/status"),
            serde_json::json!({ "status": status }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], status);
    }
}

/// An unknown status value fails validation.
#[sqlx::test(migrations = "../../db/migrations")]
async fn set_status_rejects_unknown_values(pool: PgPool) {
    let (app, _uploads) = common::build_test_app(pool);
    let (donor, town_hall) = register_parties(app.clone()).await;
    let created = create_donation(app.clone(), donor, town_hall).await;
    let id = created["id"].as_i64().unwrap();

    let response = put_json(
        app,
        &format!("/api/v1/donations/{id}/status"),
        serde_json::json!({ "status": "teleported" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Assigning an association fills the third party slot.
#[sqlx::test(migrations = "../../db/migrations")]
async fn assign_association_sets_the_slot(pool: PgPool) {
    let (app, _uploads) = common::build_test_app(pool);
    let (donor, town_hall) = register_parties(app.clone()).await;
    let association = register_user(
        app.clone(),
        "Emmaus",
        "asso@example.com",
        "association",
    )
    .await;
    let created = create_donation(app.clone(), donor, town_hall).await;
    let id = created["id"].as_i64().unwrap();

    let response = put_json(
        app,
        &format!("/api/v1/donations/{id}/association"),
        serde_json::json!({ "association_user_id": association }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["association_id"], association);
}

/// An unknown association user is 404 and the donation is left untouched.
#[sqlx::test(migrations = "../../db/migrations")]
async fn assign_unknown_association_leaves_the_donation_alone(pool: PgPool) {
    let (app, _uploads) = common::build_test_app(pool);
    let (donor, town_hall) = register_parties(app.clone()).await;
    let created = create_donation(app.clone(), donor, town_hall).await;
    let id = created["id"].as_i64().unwrap();

    let response = put_json(
        app.clone(),
        &format!("/api/v1/donations/{id}/association"),
        serde_json::json!({ "association_user_id": 9999 }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let fetched = body_json(get(app, &format!("/api/v1/donations/{id}")).await).await;
    assert!(fetched["association_id"].is_null());
    assert_eq!(fetched["updated_at"], created["updated_at"]);
}

/// Marking deposited stamps the timestamp; a repeat call re-stamps it.
#[sqlx::test(migrations = "../../db/migrations")]
async fn mark_deposited_stamps_now(pool: PgPool) {
    let (app, _uploads) = common::build_test_app(pool);
    let (donor, town_hall) = register_parties(app.clone()).await;
    let created = create_donation(app.clone(), donor, town_hall).await;
    let id = created["id"].as_i64().unwrap();

    let first = put_json(
        app.clone(),
        &format!("/api/v1/donations/{id}/deposited"),
        serde_json::json!({}),
    )
    .await;
    assert_eq!(first.status(), StatusCode::OK);
    let first_stamp = body_json(first).await["deposited_at"].clone();
    assert!(first_stamp.is_string());

    let second = put_json(
        app,
        &format!("/api/v1/donations/{id}/deposited"),
        serde_json::json!({}),
    )
    .await;
    let second_stamp = body_json(second).await["deposited_at"].clone();
    assert!(second_stamp.is_string());
    assert!(second_stamp.as_str() >= first_stamp.as_str());
}

// ---------------------------------------------------------------------------
// Delete, list, filters
// ---------------------------------------------------------------------------

/// Deletion removes the donation and its photos; a follow-up GET is 404.
#[sqlx::test(migrations = "../../db/migrations")]
async fn delete_then_get_is_not_found(pool: PgPool) {
    let (app, _uploads) = common::build_test_app(pool);
    let (donor, town_hall) = register_parties(app.clone()).await;
    let created = create_donation(app.clone(), donor, town_hall).await;
    let id = created["id"].as_i64().unwrap();

    let response = delete(app.clone(), &format!("/api/v1/donations/{id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let fetched = get(app, &format!("/api/v1/donations/{id}")).await;
    assert_eq!(fetched.status(), StatusCode::NOT_FOUND);
}

/// Listing paginates in stable id order.
#[sqlx::test(migrations = "../../db/migrations")]
async fn list_paginates_in_id_order(pool: PgPool) {
    let (app, _uploads) = common::build_test_app(pool);
    let (donor, town_hall) = register_parties(app.clone()).await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let body = donation_form(donor, town_hall);
        let response = send_multipart(app.clone(), Method::POST, "/api/v1/donations", body).await;
        ids.push(body_json(response).await["id"].as_i64().unwrap());
    }

    let page = body_json(get(app, "/api/v1/donations?skip=1&limit=1").await).await;
    let page = page.as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["id"].as_i64().unwrap(), ids[1]);
}

/// Party filters return only donations referencing the user in that slot.
#[sqlx::test(migrations = "../../db/migrations")]
async fn party_filters_match_the_right_slot(pool: PgPool) {
    let (app, _uploads) = common::build_test_app(pool);
    let (donor, town_hall) = register_parties(app.clone()).await;
    let other_donor = register_user(
        app.clone(),
        "Other",
        "other@example.com",
        "individual",
    )
    .await;

    create_donation(app.clone(), donor, town_hall).await;

    let mine = body_json(get(app.clone(), &format!("/api/v1/donations/donor/{donor}")).await).await;
    assert_eq!(mine.as_array().unwrap().len(), 1);

    let theirs = body_json(
        get(
            app.clone(),
            &format!("/api/v1/donations/donor/{other_donor}"),
        )
        .await,
    )
    .await;
    assert_eq!(theirs.as_array().unwrap().len(), 0);

    // The donor never appears in the town-hall slot.
    let as_town_hall = get(app, &format!("/api/v1/donations/town-hall/{donor}")).await;
    assert_eq!(
        body_json(as_town_hall).await.as_array().unwrap().len(),
        0
    );
}

// ---------------------------------------------------------------------------
// End to end
// ---------------------------------------------------------------------------

/// One donation through its whole life: created by a donor for a town
/// hall with two photos, handed to an association, delivered, and
/// finally deleted.
#[sqlx::test(migrations = "../../db/migrations")]
async fn donation_lifecycle_end_to_end(pool: PgPool) {
    let (app, _uploads) = common::build_test_app(pool);
    let (donor, town_hall) = register_parties(app.clone()).await;
    let association = register_user(
        app.clone(),
        "Emmaus",
        "asso@example.com",
        "association",
    )
    .await;

    // Registration: two photos, a fresh reference, lifecycle at the start.
    let created = create_donation(app.clone(), donor, town_hall).await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["status"], "requested");
    assert!(!created["reference"].as_str().unwrap().is_empty());
    assert_eq!(photo_urls(&created).len(), 2);

    // Hand-off to the association.
    let assigned = body_json(
        put_json(
            app.clone(),
            &format!("/api/v1/donations/{id}/association"),
            serde_json::json!({ "association_user_id": association }),
        )
        .await,
    )
    .await;
    assert_eq!(assigned["association_id"], association);

    // Physical drop-off, then the terminal state.
    let deposited = body_json(
        put_json(
            app.clone(),
            &format!("/api/v1/donations/{id}/deposited"),
            serde_json::json!({}),
        )
        .await,
    )
    .await;
    assert!(deposited["deposited_at"].is_string());

    let delivered = body_json(
        put_json(
            app.clone(),
            &format!("/api/v1/donations/{id}/status"),
            serde_json::json!({ "status": "delivered" }),
        )
        .await,
    )
    .await;
    assert_eq!(delivered["status"], "delivered");
    // Earlier steps survive the status change.
    assert_eq!(delivered["association_id"], association);
    assert!(delivered["deposited_at"].is_string());
    assert_eq!(photo_urls(&delivered).len(), 2);

    // Deletion works even after association + terminal status.
    let response = delete(app.clone(), &format!("/api/v1/donations/{id}")).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let fetched = get(app.clone(), &format!("/api/v1/donations/{id}")).await;
    assert_eq!(fetched.status(), StatusCode::NOT_FOUND);

    // And it is gone from the association's list too.
    let remaining = body_json(
        get(app, &format!("/api/v1/donations/association/{association}")).await,
    )
    .await;
    assert_eq!(remaining.as_array().unwrap().len(), 0);
}

// ---------------------------------------------------------------------------
// QR code
// ---------------------------------------------------------------------------

/// The QR endpoint returns a PNG pointing at the donation detail URL.
#[sqlx::test(migrations = "../../db/migrations")]
async fn qr_returns_a_png(pool: PgPool) {
    let (app, _uploads) = common::build_test_app(pool);
    let (donor, town_hall) = register_parties(app.clone()).await;
    let created = create_donation(app.clone(), donor, town_hall).await;
    let id = created["id"].as_i64().unwrap();

    let response = get(app.clone(), &format!("/api/v1/donations/{id}/qr")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "image/png"
    );
    let bytes = body_bytes(response).await;
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

/// QR for a missing donation is 404.
#[sqlx::test(migrations = "../../db/migrations")]
async fn qr_for_unknown_donation_is_not_found(pool: PgPool) {
    let (app, _uploads) = common::build_test_app(pool);
    let response = get(app, "/api/v1/donations/42/qr").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
