//! Application context providing dependency injection root.
//!
//! Built once at startup and handed to every repository and service, in place
//! of process-wide collection handles.

use std::sync::Arc;

use crate::config::Config;
use crate::di::FromRef;
use crate::error::AppError;
use crate::services::{CredentialIssuer, Detached, UploadSink};
use crate::store::{backends, DocumentStore};

/// Shared document store handle.
pub type AppStore = Arc<dyn DocumentStore>;
/// Shared credential issuer handle.
pub type AppCredentials = Arc<dyn CredentialIssuer>;
/// Shared upload sink handle.
pub type AppUploads = Arc<dyn UploadSink>;

/// Root application context for dependency injection.
///
/// Each field is extractable via `FromRef`, enabling compile-time dependency
/// resolution with `Context::resolve`.
#[derive(Clone)]
pub struct Context {
    /// Document store client.
    pub store: AppStore,
    /// Application configuration.
    pub config: Arc<Config>,
    /// Account provider kept in step with user entities.
    pub credentials: AppCredentials,
    /// Public file storage for avatars and product images.
    pub uploads: AppUploads,
}

crate::provide!(Context {
    store: AppStore,
    config: Arc<Config>,
    credentials: AppCredentials,
    uploads: AppUploads,
});

impl Context {
    /// Creates a context with detached external collaborators.
    pub fn new(store: AppStore, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
            credentials: Arc::new(Detached),
            uploads: Arc::new(Detached),
        }
    }

    /// Connects the configured store backend.
    pub async fn from_config(config: Config) -> Result<Self, AppError> {
        let store = backends::connect(&config.store).await?;
        Ok(Self::new(store, config))
    }

    pub fn with_credentials(mut self, credentials: AppCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_uploads(mut self, uploads: AppUploads) -> Self {
        self.uploads = uploads;
        self
    }

    /// Resolves any dependency constructible from this context.
    pub fn resolve<T: FromRef<Self>>(&self) -> T {
        T::from_ref(self)
    }
}
