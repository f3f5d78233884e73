//! In-process document store backed by ordered maps.
//!
//! Documents are grouped by collection path and kept ordered by id, which
//! gives queries the same default ordering as the PostgreSQL backend.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use crate::error::AppError;
use crate::store::document::{Document, DocumentStream, Fields};
use crate::store::filter::StructuredQuery;
use crate::store::path::{CollectionPath, DocumentPath};
use crate::store::traits::DocumentStore;

type Collections = BTreeMap<String, BTreeMap<String, Fields>>;

/// Document store living entirely in process memory.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents directly inside `collection`.
    pub fn count(&self, collection: &CollectionPath) -> Result<usize, AppError> {
        let guard = self.read()?;
        Ok(guard
            .get(&collection.to_string())
            .map(BTreeMap::len)
            .unwrap_or(0))
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>, AppError> {
        self.collections
            .read()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>, AppError> {
        self.collections
            .write()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, AppError> {
        let guard = self.read()?;
        let fields = guard
            .get(&path.collection().to_string())
            .and_then(|docs| docs.get(path.id()))
            .cloned();
        Ok(fields.map(|fields| Document::new(path.clone(), fields)))
    }

    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<(), AppError> {
        tracing::debug!(path = %path, "set");
        let mut guard = self.write()?;
        guard
            .entry(path.collection().to_string())
            .or_default()
            .insert(path.id().to_string(), fields);
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), AppError> {
        tracing::debug!(path = %path, fields = fields.len(), "update");
        let mut guard = self.write()?;
        let existing = guard
            .get_mut(&path.collection().to_string())
            .and_then(|docs| docs.get_mut(path.id()))
            .ok_or_else(|| AppError::DocumentNotFound(path.to_string()))?;
        existing.extend(fields);
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), AppError> {
        tracing::debug!(path = %path, "delete");
        let mut guard = self.write()?;
        if let Some(docs) = guard.get_mut(&path.collection().to_string()) {
            docs.remove(path.id());
        }
        Ok(())
    }

    async fn run_query(&self, query: StructuredQuery) -> Result<DocumentStream<'_>, AppError> {
        let guard = self.read()?;
        let documents: Vec<Document> = match guard.get(&query.collection.to_string()) {
            Some(docs) => {
                let matching = docs
                    .iter()
                    .filter(|(_, fields)| query.matches(fields))
                    .skip(query.offset.unwrap_or(0));
                let page: Vec<_> = match query.limit {
                    Some(limit) => matching.take(limit).collect(),
                    None => matching.collect(),
                };
                page.into_iter()
                    .map(|(id, fields)| Document::new(query.collection.doc(id), fields.clone()))
                    .collect()
            }
            None => Vec::new(),
        };
        Ok(Box::pin(futures::stream::iter(documents.into_iter().map(Ok))))
    }
}
