//! Shared fixtures: a store whose writes can be made to fail under a path
//! prefix, and recording fakes for the external collaborators.

#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use catalog_store::config::Config;
use catalog_store::context::{AppStore, Context};
use catalog_store::error::AppError;
use catalog_store::services::{AccountUpdate, CredentialIssuer, NewAccount, UploadSink};
use catalog_store::store::backends::memory::MemoryStore;
use catalog_store::store::{
    generate_id, CollectionPath, Document, DocumentPath, DocumentStream, DocumentStore, Fields,
    StructuredQuery,
};

/// In-memory store that fails writes whose path starts with a prefix.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    failing: Mutex<Option<String>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes_under(&self, prefix: &str) {
        *self.failing.lock().unwrap() = Some(prefix.to_string());
    }

    pub fn heal(&self) {
        *self.failing.lock().unwrap() = None;
    }

    pub fn count(&self, collection: &CollectionPath) -> usize {
        self.inner.count(collection).unwrap()
    }

    fn check(&self, path: &DocumentPath) -> Result<(), AppError> {
        match self.failing.lock().unwrap().as_deref() {
            Some(prefix) if path.to_string().starts_with(prefix) => {
                Err(AppError::Connection(format!("injected failure at {}", path)))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get(&self, path: &DocumentPath) -> Result<Option<Document>, AppError> {
        self.inner.get(path).await
    }

    async fn set(&self, path: &DocumentPath, fields: Fields) -> Result<(), AppError> {
        self.check(path)?;
        self.inner.set(path, fields).await
    }

    async fn update(&self, path: &DocumentPath, fields: Fields) -> Result<(), AppError> {
        self.check(path)?;
        self.inner.update(path, fields).await
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), AppError> {
        self.check(path)?;
        self.inner.delete(path).await
    }

    async fn run_query(&self, query: StructuredQuery) -> Result<DocumentStream<'_>, AppError> {
        self.inner.run_query(query).await
    }
}

/// Credential issuer that records calls and hands out fresh ids.
#[derive(Default)]
pub struct FakeCredentials {
    pub calls: Mutex<Vec<String>>,
}

impl FakeCredentials {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CredentialIssuer for FakeCredentials {
    async fn create_account(&self, account: NewAccount) -> Result<String, AppError> {
        let id = generate_id();
        self.calls
            .lock()
            .unwrap()
            .push(format!("create {} {}", id, account.email));
        Ok(id)
    }

    async fn update_account(&self, id: &str, _update: AccountUpdate) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(format!("update {}", id));
        Ok(())
    }

    async fn disable_account(&self, id: &str) -> Result<(), AppError> {
        self.calls.lock().unwrap().push(format!("disable {}", id));
        Ok(())
    }
}

/// Upload sink returning predictable URLs.
pub struct FakeUploads;

#[async_trait]
impl UploadSink for FakeUploads {
    async fn upload(&self, _file: &Path, folder: &str, name: &str) -> Result<String, AppError> {
        Ok(format!("https://cdn.test/{}/{}", folder, name))
    }
}

pub struct Harness {
    pub store: Arc<FlakyStore>,
    pub credentials: Arc<FakeCredentials>,
    pub ctx: Context,
}

/// Context over a fresh flaky store with fake collaborators.
pub fn harness() -> Harness {
    let store = Arc::new(FlakyStore::new());
    let credentials = Arc::new(FakeCredentials::default());
    let ctx = Context::new(store.clone() as AppStore, Config::default())
        .with_credentials(credentials.clone())
        .with_uploads(Arc::new(FakeUploads));
    Harness {
        store,
        credentials,
        ctx,
    }
}

pub fn fields(value: serde_json::Value) -> Fields {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Fields::new(),
    }
}
