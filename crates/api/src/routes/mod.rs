//! Route tables.

use axum::routing::get;
use axum::Router;

use crate::handlers::{company, lookup};
use crate::state::AppState;

pub mod health;

/// All routes nested under `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/companies",
            get(company::list_companies).post(company::create_company),
        )
        .route(
            "/companies/{id}",
            get(company::get_company)
                .put(company::update_company)
                .delete(company::delete_company),
        )
        .route("/companies/{id}/phones", get(company::list_phones))
        .route("/companies/{id}/faxes", get(company::list_faxes))
        .route("/companies/{id}/managers", get(company::list_managers))
        .route("/companies/{id}/history", get(company::list_history))
        .route("/sectors", get(lookup::list_sectors))
        .route("/legal-forms", get(lookup::list_legal_forms))
        .route("/cities", get(lookup::list_cities))
}
