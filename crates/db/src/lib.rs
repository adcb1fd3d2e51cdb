//! PostgreSQL persistence for the annuaire backend.
//!
//! [`PgDirectoryStore`] implements the core's `DirectoryStore` trait over a
//! connection pool. Schema lives in `migrations/` and is applied at startup
//! via [`run_migrations`].

use sqlx::postgres::PgPoolOptions;

pub mod store;

pub use store::PgDirectoryStore;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Cheap connectivity probe, run once at startup.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply the embedded migrations.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::debug!("database migrations applied");
    Ok(())
}
