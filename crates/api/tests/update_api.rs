//! Integration tests for the partial-update endpoint.

mod common;

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, multipart_request, send};

use annuaire_core::model::{CreateCompany, NewPhone};
use annuaire_core::store::DirectoryStore;
use annuaire_core::types::DbId;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_company(store: &annuaire_core::store::memory::MemoryStore, denomination: &str) -> DbId {
    store
        .insert_company(&CreateCompany {
            denomination: Some(denomination.to_string()),
            ..CreateCompany::default()
        })
        .await
        .unwrap()
        .id
}

// ---------------------------------------------------------------------------
// Test: Scalar update is applied and audited
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_denomination_records_history() {
    let (app, store) = build_test_app();
    let id = seed_company(&store, "A").await;

    let response = send(
        app,
        multipart_request(
            &format!("/api/v1/companies/{id}"),
            &[("denomination", "B")],
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["denomination"], "B");

    let history = json["data"]["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["attribute"], "denomination");
    assert_eq!(history[0]["oldValue"], "A");
    assert_eq!(history[0]["newValue"], "B");
}

// ---------------------------------------------------------------------------
// Test: Numeric fields coerce from form-string values
// ---------------------------------------------------------------------------

#[tokio::test]
async fn numeric_form_values_are_coerced() {
    let (app, store) = build_test_app();
    let id = seed_company(&store, "A").await;

    let response = send(
        app,
        multipart_request(
            &format!("/api/v1/companies/{id}"),
            &[("nombreEmployes", "42"), ("latitude", "33.58")],
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["nombreEmployes"], 42);
    assert_eq!(json["data"]["latitude"], 33.58);
}

// ---------------------------------------------------------------------------
// Test: Unknown attribute key is a 400
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_attribute_returns_400() {
    let (app, store) = build_test_app();
    let id = seed_company(&store, "A").await;

    let response = send(
        app,
        multipart_request(&format!("/api/v1/companies/{id}"), &[("couleur", "bleu")], None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "MALFORMED_INPUT");

    // Nothing was persisted.
    let fresh = store.find_company(id).await.unwrap().unwrap();
    assert_eq!(fresh.denomination.as_deref(), Some("A"));
    assert!(store.changes_by_company(id).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: Dangling sector id is a 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_sector_returns_404() {
    let (app, store) = build_test_app();
    let id = seed_company(&store, "A").await;

    let response = send(
        app,
        multipart_request(&format!("/api/v1/companies/{id}"), &[("sector", "999")], None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Test: Phone reconciliation over the wire
// ---------------------------------------------------------------------------

#[tokio::test]
async fn phones_update_matched_and_insert_unmatched() {
    let (app, store) = build_test_app();
    let id = seed_company(&store, "A").await;
    let phone = store
        .insert_phone(&NewPhone {
            company_id: id,
            numero: Some("1".into()),
        })
        .await
        .unwrap();

    let payload = format!("[{{\"id\":{},\"numero\":\"2\"}},{{\"numero\":\"3\"}}]", phone.id);
    let response = send(
        app,
        multipart_request(
            &format!("/api/v1/companies/{id}"),
            &[("phones", payload.as_str())],
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let phones = json["data"]["phones"].as_array().unwrap();
    assert_eq!(phones.len(), 2);
    assert!(phones
        .iter()
        .any(|p| p["id"] == phone.id && p["numero"] == "2"));
    assert!(phones.iter().any(|p| p["numero"] == "3"));
}

// ---------------------------------------------------------------------------
// Test: Logo file part replaces the blob
// ---------------------------------------------------------------------------

#[tokio::test]
async fn logo_part_replaces_logo_and_is_audited() {
    let (app, store) = build_test_app();
    let id = seed_company(&store, "A").await;

    let response = send(
        app,
        multipart_request(&format!("/api/v1/companies/{id}"), &[], Some(&[1, 2, 3])),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    // Projected as base64.
    assert_eq!(json["data"]["logo"], "AQID");

    let history = json["data"]["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["attribute"], "logo");

    let fresh = store.find_company(id).await.unwrap().unwrap();
    assert_eq!(fresh.logo, Some(vec![1, 2, 3]));
}

// ---------------------------------------------------------------------------
// Test: Idempotent replay adds no history
// ---------------------------------------------------------------------------

#[tokio::test]
async fn replaying_the_same_update_adds_no_history() {
    let (app, store) = build_test_app();
    let id = seed_company(&store, "A").await;

    for _ in 0..2 {
        let response = send(
            app.clone(),
            multipart_request(
                &format!("/api/v1/companies/{id}"),
                &[("denomination", "B")],
                None,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = get(app, &format!("/api/v1/companies/{id}/history")).await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Test: Update of an unknown company is a 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn update_unknown_company_returns_404() {
    let (app, _store) = build_test_app();

    let response = send(
        app,
        multipart_request("/api/v1/companies/999", &[("denomination", "B")], None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
