use annuaire_core::error::CoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `annuaire_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => classify_core(core),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Classify a core error into an HTTP status, error code, and message.
///
/// An `UpdateFailed` takes the status of its root cause so callers can
/// distinguish a dangling lookup id (404) from a malformed value (400); any
/// other cause maps to 422.
fn classify_core(err: &CoreError) -> (StatusCode, &'static str, String) {
    match err {
        CoreError::NotFound { entity, id } => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("{entity} with id {id} not found"),
        ),
        CoreError::MalformedInput { .. } => {
            (StatusCode::BAD_REQUEST, "MALFORMED_INPUT", err.to_string())
        }
        CoreError::UpdateFailed { key, .. } => {
            let root = err.root_cause();
            let (status, code) = match root {
                CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                CoreError::MalformedInput { .. } => (StatusCode::BAD_REQUEST, "MALFORMED_INPUT"),
                CoreError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORE_FAILURE"),
                _ => (StatusCode::UNPROCESSABLE_ENTITY, "UPDATE_FAILED"),
            };
            let message = match root {
                CoreError::Store(e) => {
                    tracing::error!(error = %e, key = %key, "Update aborted by store failure");
                    format!("update failed on '{key}': storage error")
                }
                other => format!("update failed on '{key}': {other}"),
            };
            (status, code, message)
        }
        CoreError::Store(e) => {
            tracing::error!(error = %e, "Store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_FAILURE",
                "A storage error occurred".to_string(),
            )
        }
        CoreError::Internal(msg) => {
            tracing::error!(error = %msg, "Internal core error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            )
        }
    }
}
