//! Application error types and their request-boundary classification.

use thiserror::Error;

use crate::models::EntityKind;

/// Application-level errors for the catalog store.
#[derive(Error, Debug)]
pub enum AppError {
    // Store errors
    #[error("Store connection error: {0}")]
    Connection(String),

    #[error("Store query error on '{collection}': {message}")]
    Query { message: String, collection: String },

    #[error("Document does not exist: {0}")]
    DocumentNotFound(String),

    #[error("Malformed document at '{path}': {message}")]
    MalformedDocument { path: String, message: String },

    #[error("Invalid document path: {0}")]
    InvalidPath(String),

    #[error("Invalid prefix for field '{field}': {reason}")]
    InvalidPrefix { field: String, reason: String },

    #[error("Invalid criteria value for field '{field}': {reason}")]
    InvalidCriteria { field: String, reason: String },

    /// The primary write landed but the nested copy under the owner did not.
    #[error("Mirrored write to '{mirror}' failed after primary write to '{primary}': {source}")]
    MirrorDiverged {
        primary: String,
        mirror: String,
        #[source]
        source: Box<AppError>,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Domain errors
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Role not found: {0}")]
    RoleNotFound(String),

    #[error("The {kind} named '{name}' already exists")]
    DuplicateName { kind: EntityKind, name: String },

    #[error("The email {0} is already in use")]
    DuplicateEmail(String),

    #[error("Not the author of {kind} {id}")]
    Unauthorized { kind: EntityKind, id: String },

    #[error("User is blocked: {0}")]
    UserBlocked(String),

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // Collaborators outside the core (credential issuer, upload sink)
    #[error("External service error: {0}")]
    External(String),

    // Config errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used by callers at the request boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A looked-up entity is missing or soft-deleted.
    NotFound,
    /// The underlying store failed (network, permission, malformed query or data).
    StoreFailure,
    /// Duplicate name/email, wrong author, blocked account.
    Conflict,
    /// The caller supplied something unusable.
    Invalid,
    /// A collaborator outside the core failed.
    External,
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::UserNotFound(_)
            | AppError::CategoryNotFound(_)
            | AppError::ProductNotFound(_)
            | AppError::RoleNotFound(_) => ErrorKind::NotFound,
            AppError::Connection(_)
            | AppError::Query { .. }
            | AppError::DocumentNotFound(_)
            | AppError::MalformedDocument { .. }
            | AppError::MirrorDiverged { .. } => ErrorKind::StoreFailure,
            AppError::DuplicateName { .. }
            | AppError::DuplicateEmail(_)
            | AppError::Unauthorized { .. }
            | AppError::UserBlocked(_) => ErrorKind::Conflict,
            AppError::InvalidPath(_)
            | AppError::InvalidPrefix { .. }
            | AppError::InvalidCriteria { .. }
            | AppError::UnknownCollection(_)
            | AppError::Validation(_) => ErrorKind::Invalid,
            AppError::External(_) => ErrorKind::External,
            AppError::Serialization(_)
            | AppError::Config(_)
            | AppError::InvalidConfig(_)
            | AppError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Connection(_) => "CONNECTION_ERROR",
            AppError::Query { .. } => "QUERY_ERROR",
            AppError::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
            AppError::MalformedDocument { .. } => "MALFORMED_DOCUMENT",
            AppError::InvalidPath(_) => "INVALID_PATH",
            AppError::InvalidPrefix { .. } => "INVALID_PREFIX",
            AppError::InvalidCriteria { .. } => "INVALID_CRITERIA",
            AppError::MirrorDiverged { .. } => "MIRROR_DIVERGED",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::UserNotFound(_) => "USER_NOT_FOUND",
            AppError::CategoryNotFound(_) => "CATEGORY_NOT_FOUND",
            AppError::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            AppError::RoleNotFound(_) => "ROLE_NOT_FOUND",
            AppError::DuplicateName { kind, .. } => match kind {
                EntityKind::User => "DUPLICATE_USER",
                EntityKind::Category => "DUPLICATE_CATEGORY",
                EntityKind::Product => "DUPLICATE_PRODUCT",
                EntityKind::Role => "DUPLICATE_ROLE",
            },
            AppError::DuplicateEmail(_) => "DUPLICATE_EMAIL",
            AppError::Unauthorized { kind, .. } => match kind {
                EntityKind::Category => "CATEGORY_UNAUTHORIZED",
                EntityKind::Product => "PRODUCT_UNAUTHORIZED",
                EntityKind::User | EntityKind::Role => "UNAUTHORIZED",
            },
            AppError::UserBlocked(_) => "USER_BLOCKED",
            AppError::UnknownCollection(_) => "UNKNOWN_COLLECTION",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::External(_) => "EXTERNAL_ERROR",
            AppError::Config(_) | AppError::InvalidConfig(_) => "CONFIG_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True when the error only affected the nested copy.
    pub fn is_mirror_divergence(&self) -> bool {
        matches!(self, AppError::MirrorDiverged { .. })
    }
}
