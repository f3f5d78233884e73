//! Core traits for document store abstraction.
//!
//! - [`DocumentStore`] - the store client capability every backend implements
//! - [`DocumentConverter`] - bidirectional entity/document mapping

use async_trait::async_trait;

use crate::error::AppError;
use crate::store::document::{Document, DocumentStream, Fields};
use crate::store::filter::StructuredQuery;
use crate::store::path::{CollectionPath, DocumentPath};

/// A schemaless document store addressed by materialized paths.
///
/// Supports point reads and writes plus equality/range queries over a single
/// collection. There is no multi-document transaction and no substring
/// predicate.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Reserves a new unique id for a document in `collection`.
    ///
    /// The document does not exist until it is written with [`set`](Self::set).
    fn allocate_id(&self, collection: &CollectionPath) -> String {
        let _ = collection;
        generate_id()
    }

    /// Reads a document. A missing document is `Ok(None)`.
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, AppError>;

    /// Creates or fully replaces a document.
    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<(), AppError>;

    /// Merges top-level `fields` into an existing document.
    ///
    /// # Errors
    ///
    /// [`AppError::DocumentNotFound`] when the document does not exist.
    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), AppError>;

    /// Removes a document. Removing a missing document succeeds.
    async fn delete(&self, path: &DocumentPath) -> Result<(), AppError>;

    /// Runs a query and returns a stream of matching documents.
    async fn run_query(&self, query: StructuredQuery) -> Result<DocumentStream<'_>, AppError>;
}

/// Maps an in-memory entity to and from its flat document form.
pub trait DocumentConverter: Sized {
    /// Flat field map; transient handles are omitted.
    fn to_document(&self) -> Result<Fields, AppError>;

    /// Rebuilds the entity and reattaches the document's location.
    fn from_document(document: Document) -> Result<Self, AppError>;

    /// Stable identity used for deduplication.
    fn document_id(&self) -> &str;
}

/// Generates a new document id (ULID).
pub fn generate_id() -> String {
    ulid::Ulid::new().to_string()
}

/// True when `value` has the shape of an id produced by [`generate_id`].
pub fn is_generated_id(value: &str) -> bool {
    ulid::Ulid::from_string(value).is_ok()
}
