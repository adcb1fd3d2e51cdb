//! Handlers for company CRUD, the partial update, child collections and
//! change history.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use annuaire_core::error::CoreError;
use annuaire_core::model::{Company, CreateCompany};
use annuaire_core::store::CompanyFilter;
use annuaire_core::types::DbId;
use annuaire_core::update::{self, UpdateMap};
use annuaire_core::view::{
    self, ChangeView, CompanyView, FaxView, ManagerView, PhoneView,
};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / query parameter types
// ---------------------------------------------------------------------------

/// Query parameters for company listing. All filters are optional and
/// conjunctive.
#[derive(Debug, Deserialize)]
pub struct CompanyFilterParams {
    pub ville: Option<String>,
    pub denomination: Option<String>,
    pub sector: Option<String>,
    #[serde(rename = "legalForm")]
    pub legal_form: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn load_company(state: &AppState, id: DbId) -> Result<Company, CoreError> {
    state
        .store
        .find_company(id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "company",
            id,
        })
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /companies
///
/// List companies, optionally filtered by city, denomination substring,
/// sector name or legal form name.
pub async fn list_companies(
    State(state): State<AppState>,
    Query(params): Query<CompanyFilterParams>,
) -> AppResult<Json<DataResponse<Vec<CompanyView>>>> {
    let filter = CompanyFilter {
        ville: params.ville,
        denomination: params.denomination,
        sector: params.sector,
        legal_form: params.legal_form,
    };

    let companies = state
        .store
        .list_companies(&filter)
        .await
        .map_err(CoreError::from)?;

    let mut views = Vec::with_capacity(companies.len());
    for company in &companies {
        views.push(view::project(state.store.as_ref(), company).await?);
    }
    Ok(Json(DataResponse { data: views }))
}

/// POST /companies
pub async fn create_company(
    State(state): State<AppState>,
    Json(input): Json<CreateCompany>,
) -> AppResult<(StatusCode, Json<DataResponse<CompanyView>>)> {
    // Dangling lookup ids are rejected up front rather than surfacing as an
    // opaque foreign-key violation.
    if let Some(id) = input.sector_id {
        state
            .store
            .find_sector(id)
            .await
            .map_err(CoreError::from)?
            .ok_or(CoreError::NotFound {
                entity: "sector",
                id,
            })?;
    }
    if let Some(id) = input.legal_form_id {
        state
            .store
            .find_legal_form(id)
            .await
            .map_err(CoreError::from)?
            .ok_or(CoreError::NotFound {
                entity: "legal form",
                id,
            })?;
    }

    let company = state
        .store
        .insert_company(&input)
        .await
        .map_err(CoreError::from)?;
    tracing::info!(company_id = company.id, "Company created");

    let view = view::project(state.store.as_ref(), &company).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: view })))
}

/// GET /companies/{id}
pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<CompanyView>>> {
    let company = load_company(&state, id).await?;
    let view = view::project(state.store.as_ref(), &company).await?;
    Ok(Json(DataResponse { data: view }))
}

/// DELETE /companies/{id}
pub async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = state
        .store
        .delete_company(id)
        .await
        .map_err(CoreError::from)?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "company",
            id,
        }));
    }
    tracing::info!(company_id = id, "Company deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Partial update
// ---------------------------------------------------------------------------

/// PUT /companies/{id}
///
/// Partial update via multipart form. Every text part is one attribute-map
/// entry (raw string value); the optional `logo` file part replaces the
/// company's logo verbatim.
pub async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<Json<DataResponse<CompanyView>>> {
    let mut changes = UpdateMap::new();
    let mut logo: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "logo" {
            let bytes = field.bytes().await.map_err(|e| {
                CoreError::update_failed(
                    "logo",
                    CoreError::Internal(format!("failed to read attachment: {e}")),
                )
            })?;
            logo = Some(bytes.to_vec());
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            changes.insert(name, serde_json::Value::String(text));
        }
    }

    let company = update::apply_update(state.store.as_ref(), id, &changes, logo).await?;
    let view = view::project(state.store.as_ref(), &company).await?;
    Ok(Json(DataResponse { data: view }))
}

// ---------------------------------------------------------------------------
// Child collections & history
// ---------------------------------------------------------------------------

/// GET /companies/{id}/phones
pub async fn list_phones(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<PhoneView>>>> {
    load_company(&state, id).await?;
    let phones = state
        .store
        .phones_by_company(id)
        .await
        .map_err(CoreError::from)?;
    Ok(Json(DataResponse {
        data: phones.iter().map(PhoneView::from).collect(),
    }))
}

/// GET /companies/{id}/faxes
pub async fn list_faxes(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<FaxView>>>> {
    load_company(&state, id).await?;
    let faxes = state
        .store
        .faxes_by_company(id)
        .await
        .map_err(CoreError::from)?;
    Ok(Json(DataResponse {
        data: faxes.iter().map(FaxView::from).collect(),
    }))
}

/// GET /companies/{id}/managers
pub async fn list_managers(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ManagerView>>>> {
    load_company(&state, id).await?;
    let managers = state
        .store
        .managers_by_company(id)
        .await
        .map_err(CoreError::from)?;
    Ok(Json(DataResponse {
        data: managers.iter().map(ManagerView::from).collect(),
    }))
}

/// GET /companies/{id}/history
pub async fn list_history(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ChangeView>>>> {
    load_company(&state, id).await?;
    let history = state
        .store
        .changes_by_company(id)
        .await
        .map_err(CoreError::from)?;
    Ok(Json(DataResponse {
        data: history.iter().map(ChangeView::from).collect(),
    }))
}
