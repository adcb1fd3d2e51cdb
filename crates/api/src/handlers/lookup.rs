//! Handlers for the lookup collections and the distinct-city listing.

use axum::extract::State;
use axum::Json;

use annuaire_core::error::CoreError;
use annuaire_core::view::{LegalFormView, SectorView};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /sectors
pub async fn list_sectors(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<SectorView>>>> {
    let sectors = state.store.list_sectors().await.map_err(CoreError::from)?;
    Ok(Json(DataResponse {
        data: sectors.iter().map(SectorView::from).collect(),
    }))
}

/// GET /legal-forms
pub async fn list_legal_forms(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<LegalFormView>>>> {
    let forms = state
        .store
        .list_legal_forms()
        .await
        .map_err(CoreError::from)?;
    Ok(Json(DataResponse {
        data: forms.iter().map(LegalFormView::from).collect(),
    }))
}

/// GET /cities
///
/// Sorted distinct non-null cities across all companies.
pub async fn list_cities(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<String>>>> {
    let cities = state
        .store
        .distinct_cities()
        .await
        .map_err(CoreError::from)?;
    Ok(Json(DataResponse { data: cities }))
}
