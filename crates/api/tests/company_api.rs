//! Integration tests for company CRUD, filtering and the lookup endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, build_test_app, delete, get, json_request, send};
use serde_json::json;

use annuaire_core::model::CreateCompany;
use annuaire_core::store::DirectoryStore;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn new_company(denomination: &str, ville: &str) -> CreateCompany {
    CreateCompany {
        denomination: Some(denomination.to_string()),
        ville: Some(ville.to_string()),
        ..CreateCompany::default()
    }
}

// ---------------------------------------------------------------------------
// Test: Create then fetch round trip
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_then_get_company() {
    let (app, _store) = build_test_app();

    let response = send(
        app.clone(),
        json_request(
            Method::POST,
            "/api/v1/companies",
            json!({"denomination": "Atlas SARL", "ville": "Casablanca"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let created = body_json(response).await;
    let id = created["data"]["id"].as_i64().unwrap();
    assert_eq!(created["data"]["denomination"], "Atlas SARL");

    let response = get(app, &format!("/api/v1/companies/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let fetched = body_json(response).await;
    assert_eq!(fetched["data"]["ville"], "Casablanca");
    assert!(fetched["data"]["history"].as_array().unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Test: Creating with a dangling sector id is rejected
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_with_unknown_sector_returns_404() {
    let (app, _store) = build_test_app();

    let response = send(
        app,
        json_request(
            Method::POST,
            "/api/v1/companies",
            json!({"denomination": "Ghost", "sectorId": 999}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Test: Listing with filters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_companies_filters_by_city() {
    let (app, store) = build_test_app();
    store
        .insert_company(&new_company("Atlas SARL", "Casablanca"))
        .await
        .unwrap();
    store
        .insert_company(&new_company("Rif Export", "Rabat"))
        .await
        .unwrap();

    let response = get(app.clone(), "/api/v1/companies?ville=Rabat").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let items = json["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["denomination"], "Rif Export");

    // Unfiltered listing returns both.
    let response = get(app, "/api/v1/companies").await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn list_companies_filters_by_denomination_substring() {
    let (app, store) = build_test_app();
    store
        .insert_company(&new_company("Atlas SARL", "Casablanca"))
        .await
        .unwrap();
    store
        .insert_company(&new_company("Rif Export", "Rabat"))
        .await
        .unwrap();

    let response = get(app, "/api/v1/companies?denomination=atlas").await;
    let json = body_json(response).await;
    let items = json["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["denomination"], "Atlas SARL");
}

// ---------------------------------------------------------------------------
// Test: Distinct cities
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cities_are_distinct_and_sorted() {
    let (app, store) = build_test_app();
    for (denomination, ville) in [("A", "Rabat"), ("B", "Casablanca"), ("C", "Rabat")] {
        store
            .insert_company(&new_company(denomination, ville))
            .await
            .unwrap();
    }

    let response = get(app, "/api/v1/cities").await;
    let json = body_json(response).await;
    assert_eq!(json["data"], json!(["Casablanca", "Rabat"]));
}

// ---------------------------------------------------------------------------
// Test: Delete
// ---------------------------------------------------------------------------

#[tokio::test]
async fn delete_company_then_fetch_returns_404() {
    let (app, store) = build_test_app();
    let company = store
        .insert_company(&new_company("Atlas SARL", "Casablanca"))
        .await
        .unwrap();

    let response = delete(app.clone(), &format!("/api/v1/companies/{}", company.id)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get(app, &format!("/api/v1/companies/{}", company.id)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_unknown_company_returns_404() {
    let (app, _store) = build_test_app();
    let response = delete(app, "/api/v1/companies/999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: Lookup endpoints
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sectors_and_legal_forms_are_listed() {
    let (app, store) = build_test_app();
    let sector = store.put_sector("Textile");
    store.put_legal_form("SARL");

    let response = get(app.clone(), "/api/v1/sectors").await;
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["id"], sector.id);
    assert_eq!(json["data"][0]["nom"], "Textile");

    let response = get(app, "/api/v1/legal-forms").await;
    let json = body_json(response).await;
    assert_eq!(json["data"][0]["nom"], "SARL");
}

// ---------------------------------------------------------------------------
// Test: Child collection listings
// ---------------------------------------------------------------------------

#[tokio::test]
async fn phones_of_unknown_company_return_404() {
    let (app, _store) = build_test_app();
    let response = get(app, "/api/v1/companies/999/phones").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
