//! Init command handler.

use color_eyre::Result;

use crate::config::{Backend, Config};
use crate::error::AppError;
use crate::store::backends::postgres::PostgresStore;

use super::App;

impl App {
    /// Run the init command to create the document table.
    pub async fn run_init(&self) -> Result<()> {
        let config = Config::load()?;

        if config.store.backend == Backend::Memory {
            tracing::info!("Memory backend selected, nothing to initialize");
            return Ok(());
        }

        let uri = config.store.uri.as_deref().ok_or_else(|| {
            AppError::InvalidConfig("store.uri is required for the postgres backend".into())
        })?;

        tracing::info!("Connecting to PostgreSQL");
        let store = PostgresStore::connect(uri, config.store.pool_size)
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to connect: {}", e))?;

        store
            .ensure_schema()
            .await
            .map_err(|e| color_eyre::eyre::eyre!("Failed to create schema: {}", e))?;
        tracing::info!("Document table ready");

        Ok(())
    }
}
