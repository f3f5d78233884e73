//! Generic repository: locators, dual-write replication and reconciliation.
//!
//! Every mutation writes the primary copy first and the mirror nested under
//! the owning user second. The two writes are not atomic: when the second one
//! fails the primary effect stays and the caller gets
//! [`AppError::MirrorDiverged`]. [`Repository::reconcile`] rewrites a mirror
//! from its primary copy.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use serde::Serialize;

use crate::config::{Collections, Config};
use crate::context::{AppStore, Context};
use crate::di::FromRef;
use crate::error::AppError;
use crate::models::{Entity, SoftDelete};
use crate::store::{
    CollectionPath, Criteria, Document, DocumentPath, QueryBuilder, QueryOptions, StructuredQuery,
};

/// Repository for one entity type.
pub struct Repository<T> {
    store: AppStore,
    config: Arc<Config>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            config: self.config.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T: Entity> FromRef<Context> for Repository<T> {
    fn from_ref(ctx: &Context) -> Self {
        Self::new(ctx.store.clone(), ctx.config.clone())
    }
}

/// Result of comparing one mirror with its primary copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ReconcileOutcome {
    /// Mirror matches the primary, or the entity has no mirror.
    InSync,
    /// Mirror was missing or stale and has been rewritten.
    Repaired { mirror: String },
    /// No primary document with that id.
    MissingPrimary,
}

/// Summary of a collection-wide reconciliation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ReconcileReport {
    pub collection: String,
    pub scanned: usize,
    pub in_sync: usize,
    /// Mirror paths that were rewritten.
    pub repaired: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl<T: Entity> Repository<T> {
    pub fn new(store: AppStore, config: Arc<Config>) -> Self {
        Self {
            store,
            config,
            _entity: PhantomData,
        }
    }

    /// The primary, flat collection of `T`.
    pub fn collection(&self) -> CollectionPath {
        CollectionPath::root(self.collections().name_of(T::KIND))
    }

    pub(crate) fn collections(&self) -> &Collections {
        &self.config.collections
    }

    /// Reserves an id for an entity that has not been written yet.
    pub fn new_id(&self) -> String {
        self.store.allocate_id(&self.collection())
    }

    /// Empty query over the primary collection.
    pub fn query(&self) -> QueryBuilder<'_, T> {
        self.query_in(self.collection())
    }

    /// Empty query over any collection holding `T` documents.
    pub(crate) fn query_in(&self, collection: CollectionPath) -> QueryBuilder<'_, T> {
        QueryBuilder::new(self.store.as_ref(), collection)
    }

    // ========================================================================
    // Locators
    // ========================================================================

    /// Point lookup. A missing document is `Ok(None)`; an empty id or one
    /// containing `/` is [`AppError::InvalidPath`].
    pub async fn find_by_id(&self, id: &str) -> Result<Option<T>, AppError> {
        let path = self.collection().try_doc(id)?;
        tracing::debug!(path = %path, "find_by_id");
        self.store
            .get(&path)
            .await?
            .map(T::from_document)
            .transpose()
    }

    /// Paginated scan of the primary collection.
    pub async fn find_all(&self, options: QueryOptions) -> Result<Vec<T>, AppError> {
        self.query().with_options(options).fetch_all().await
    }

    pub fn where_equal(&self, criteria: Criteria, options: QueryOptions) -> QueryBuilder<'_, T> {
        self.query().where_equal(criteria).with_options(options)
    }

    /// First record matching every pair, if any.
    pub async fn where_equal_one(&self, criteria: Criteria) -> Result<Option<T>, AppError> {
        self.query().where_equal(criteria).fetch_one().await
    }

    pub fn where_starts_with(
        &self,
        criteria: Criteria,
        options: QueryOptions,
    ) -> QueryBuilder<'_, T> {
        self.query().where_starts_with(criteria).with_options(options)
    }

    /// Union substring search over the whole primary collection.
    pub async fn where_either_contains(
        &self,
        criteria: Criteria,
        options: QueryOptions,
    ) -> Result<Vec<T>, AppError> {
        self.query().either_contains(criteria, options).await
    }

    // ========================================================================
    // Replicated writes
    // ========================================================================

    /// Normalizes and writes the entity, then its mirror.
    pub async fn save(&self, entity: &mut T) -> Result<(), AppError> {
        entity.normalize();
        let fields = entity.to_document()?;
        let primary = self.primary_path(entity);

        self.store.set(&primary, fields.clone()).await?;

        if let Some(mirror) = entity.mirror_path(self.collections()) {
            self.store
                .set(&mirror, fields)
                .await
                .map_err(|e| diverged(&primary, &mirror, e))?;
        }

        tracing::info!(kind = T::KIND.as_str(), id = entity.document_id(), "saved");
        Ok(())
    }

    /// Applies `patch`, normalizes and updates both copies at the same id.
    ///
    /// When the patch moves the mirror (a product changing category) the new
    /// mirror is written before the old one is removed.
    pub async fn update(&self, entity: &mut T, patch: T::Patch) -> Result<(), AppError> {
        let previous_mirror = entity.mirror_path(self.collections());

        entity.apply(patch);
        entity.normalize();
        let fields = entity.to_document()?;
        let primary = self.primary_path(entity);

        self.store.update(&primary, fields.clone()).await?;

        match (previous_mirror, entity.mirror_path(self.collections())) {
            (Some(old), Some(new)) if old != new => {
                self.store
                    .set(&new, fields)
                    .await
                    .map_err(|e| diverged(&primary, &new, e))?;
                self.store
                    .delete(&old)
                    .await
                    .map_err(|e| diverged(&primary, &old, e))?;
                tracing::info!(from = %old, to = %new, "moved mirror");
            }
            (_, Some(mirror)) => {
                self.store
                    .update(&mirror, fields)
                    .await
                    .map_err(|e| diverged(&primary, &mirror, e))?;
            }
            (_, None) => {}
        }

        tracing::info!(kind = T::KIND.as_str(), id = entity.document_id(), "updated");
        Ok(())
    }

    /// Loads, patches and writes back both copies. Absent id is `Ok(None)`.
    pub async fn find_by_id_and_update(
        &self,
        id: &str,
        patch: T::Patch,
    ) -> Result<Option<T>, AppError> {
        let Some(mut entity) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        self.update(&mut entity, patch).await?;
        Ok(Some(entity))
    }

    // ========================================================================
    // Reconciliation
    // ========================================================================

    /// Rewrites the mirror of `id` from its primary copy when they differ.
    pub async fn reconcile(&self, id: &str) -> Result<ReconcileOutcome, AppError> {
        match self.store.get(&self.collection().try_doc(id)?).await? {
            Some(primary) => self.reconcile_document(primary).await,
            None => Ok(ReconcileOutcome::MissingPrimary),
        }
    }

    /// Reconciles every document of the primary collection.
    pub async fn reconcile_all(&self) -> Result<ReconcileReport, AppError> {
        let collection = self.collection();
        let started_at = Utc::now();

        let documents: Vec<Document> = self
            .store
            .run_query(StructuredQuery::new(collection.clone()))
            .await?
            .try_collect()
            .await?;

        let mut report = ReconcileReport {
            collection: collection.to_string(),
            scanned: documents.len(),
            in_sync: 0,
            repaired: Vec::new(),
            started_at,
            finished_at: started_at,
        };

        for document in documents {
            match self.reconcile_document(document).await? {
                ReconcileOutcome::Repaired { mirror } => report.repaired.push(mirror),
                ReconcileOutcome::InSync | ReconcileOutcome::MissingPrimary => report.in_sync += 1,
            }
        }

        report.finished_at = Utc::now();
        tracing::info!(
            collection = %report.collection,
            scanned = report.scanned,
            repaired = report.repaired.len(),
            "reconciled"
        );
        Ok(report)
    }

    async fn reconcile_document(&self, primary: Document) -> Result<ReconcileOutcome, AppError> {
        let entity = T::from_document(primary.clone())?;
        let Some(mirror) = entity.mirror_path(self.collections()) else {
            return Ok(ReconcileOutcome::InSync);
        };

        let current = self.store.get(&mirror).await?;
        if current.as_ref().map(Document::fields) == Some(primary.fields()) {
            return Ok(ReconcileOutcome::InSync);
        }

        let (_, fields) = primary.into_parts();
        self.store.set(&mirror, fields).await?;
        tracing::warn!(mirror = %mirror, "repaired diverged mirror");
        Ok(ReconcileOutcome::Repaired {
            mirror: mirror.to_string(),
        })
    }

    /// The loaded handle when it points into the primary collection,
    /// otherwise the primary path derived from the id.
    fn primary_path(&self, entity: &T) -> DocumentPath {
        let collection = self.collection();
        match entity.reference() {
            Some(path) if path.collection() == &collection => path.clone(),
            _ => collection.doc(entity.document_id()),
        }
    }
}

impl<T: SoftDelete> Repository<T> {
    /// Flags the entity as deleted in both copies. Repeating it is a no-op.
    pub async fn soft_delete(&self, entity: &mut T) -> Result<(), AppError> {
        self.update(entity, T::deactivation()).await
    }
}

fn diverged(primary: &DocumentPath, mirror: &DocumentPath, source: AppError) -> AppError {
    tracing::warn!(
        primary = %primary,
        mirror = %mirror,
        error = %source,
        "mirrored write failed after primary write"
    );
    AppError::MirrorDiverged {
        primary: primary.to_string(),
        mirror: mirror.to_string(),
        source: Box::new(source),
    }
}
