use axum::extract::FromRef;
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};
use std::sync::Arc;

use shared_types::{AppConfig, AppError, StorageBackend};

use crate::auth::JwtKeys;
use crate::error_convert::SqlxErrorExt;
use crate::service::Core;
use crate::storage::{MemoryStore, PgStore, Storage};

/// Shared application state passed to Axum handlers via `State`.
/// Derives `FromRef` so handlers and middleware can extract either part.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub core: Core,
    pub auth: JwtKeys,
}

/// Create a connection pool from `DATABASE_URL`.
/// Uses `connect_lazy` so no connections open until the first query.
pub fn create_pool() -> Result<Pool<Postgres>, AppError> {
    let database_url = std::env::var("DATABASE_URL")
        .map_err(|_| AppError::internal("DATABASE_URL must be set for the postgres backend"))?;

    let max_connections: u32 = std::env::var("DATABASE_MAX_CONNECTIONS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(10);

    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect_lazy(&database_url)
        .map_err(SqlxErrorExt::into_app_error)
}

/// Run database migrations against the given pool.
pub async fn run_migrations(pool: &Pool<Postgres>) -> Result<(), AppError> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to run database migrations: {e}")))
}

/// Open the store selected by `[storage] backend`. Postgres is migrated here.
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn Storage>, AppError> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StorageBackend::Postgres => {
            let pool = create_pool()?;
            run_migrations(&pool).await?;
            tracing::info!("Connected to PostgreSQL");
            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}
