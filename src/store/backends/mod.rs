//! Backend implementations of [`DocumentStore`].
//!
//! | Backend | Module | Use |
//! |---------|--------|-----|
//! | In-process ordered maps | [`memory`] | tests, local runs |
//! | PostgreSQL `JSONB` table | [`postgres`] | deployments |
//!
//! Both backends share the semantics documented on
//! [`StructuredQuery`](crate::store::StructuredQuery).

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use crate::config::{Backend, StoreConfig};
use crate::context::AppStore;
use crate::error::AppError;
use crate::store::DocumentStore;

/// Builds the configured backend.
pub async fn connect(config: &StoreConfig) -> Result<AppStore, AppError> {
    match config.backend {
        Backend::Memory => {
            tracing::info!("Using in-memory document store");
            Ok(Arc::new(memory::MemoryStore::new()) as Arc<dyn DocumentStore>)
        }
        Backend::Postgres => {
            let uri = config.uri.as_deref().ok_or_else(|| {
                AppError::InvalidConfig("store.uri is required for the postgres backend".into())
            })?;
            tracing::info!("Connecting to PostgreSQL document store");
            let client = postgres::PostgresStore::connect(uri, config.pool_size).await?;
            Ok(Arc::new(client) as Arc<dyn DocumentStore>)
        }
    }
}
