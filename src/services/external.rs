//! Collaborators outside the catalog core.
//!
//! The account provider and the public file storage are reached through these
//! narrow traits. [`Detached`] stands in for both when nothing is wired.

use std::path::Path;

use async_trait::async_trait;

use crate::error::AppError;

/// Fields for a new provider account.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub email: String,
    pub password: Option<String>,
    pub display_name: String,
    pub photo_url: Option<String>,
}

/// Changes pushed to an existing provider account. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct AccountUpdate {
    pub email: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Account provider keyed by the same id as the user entity.
#[async_trait]
pub trait CredentialIssuer: Send + Sync {
    /// Creates an enabled account and returns its id.
    async fn create_account(&self, account: NewAccount) -> Result<String, AppError>;

    async fn update_account(&self, id: &str, update: AccountUpdate) -> Result<(), AppError>;

    async fn disable_account(&self, id: &str) -> Result<(), AppError>;
}

/// Public storage for uploaded files.
#[async_trait]
pub trait UploadSink: Send + Sync {
    /// Stores `file` as `folder/name` and returns its public URL.
    async fn upload(&self, file: &Path, folder: &str, name: &str) -> Result<String, AppError>;
}

/// Placeholder collaborator that fails every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Detached;

#[async_trait]
impl CredentialIssuer for Detached {
    async fn create_account(&self, _account: NewAccount) -> Result<String, AppError> {
        Err(AppError::External("no credential issuer configured".to_string()))
    }

    async fn update_account(&self, _id: &str, _update: AccountUpdate) -> Result<(), AppError> {
        Err(AppError::External("no credential issuer configured".to_string()))
    }

    async fn disable_account(&self, _id: &str) -> Result<(), AppError> {
        Err(AppError::External("no credential issuer configured".to_string()))
    }
}

#[async_trait]
impl UploadSink for Detached {
    async fn upload(&self, _file: &Path, _folder: &str, _name: &str) -> Result<String, AppError> {
        Err(AppError::External("no upload sink configured".to_string()))
    }
}
