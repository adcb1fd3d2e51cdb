use std::sync::Arc;

use annuaire_core::store::DirectoryStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// The directory store collaborator. PostgreSQL in production, the
    /// in-memory store in tests.
    pub store: Arc<dyn DirectoryStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
