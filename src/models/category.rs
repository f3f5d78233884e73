//! Category model: a user-owned grouping of products.

use serde::{Deserialize, Serialize};

use super::{default_true, from_fields, sentence_case, to_fields, Entity, EntityKind, Reference, SoftDelete};
use crate::config::Collections;
use crate::error::AppError;
use crate::store::{CollectionPath, Document, DocumentConverter, DocumentPath, Fields};

/// Subcollection holding category mirrors under a user document.
pub const SUBCOLLECTION: &str = "categories";

/// A product category owned by a user.
///
/// Stored flat in the categories collection and mirrored at
/// `users/{user}/categories/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub lower: String,
    /// Owning user's id.
    pub user: String,
    #[serde(default = "default_true")]
    pub state: bool,
    #[serde(skip)]
    pub reference: Reference,
}

/// Partial update for a [`Category`]. Ownership cannot be changed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub state: Option<bool>,
}

impl Category {
    /// Builds an active category. `id` comes from the store's id allocator.
    pub fn new(id: String, name: &str, user: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            lower: name.to_string(),
            user: user.to_string(),
            state: true,
            reference: Reference::default(),
        }
    }

    /// `users/{user}/categories` for the given owner.
    pub fn mirror_collection(collections: &Collections, user: &str) -> CollectionPath {
        CollectionPath::root(&collections.users)
            .doc(user)
            .child(SUBCOLLECTION)
    }
}

impl DocumentConverter for Category {
    fn to_document(&self) -> Result<Fields, AppError> {
        to_fields(self)
    }

    fn from_document(document: Document) -> Result<Self, AppError> {
        let (mut category, reference): (Self, _) = from_fields(document)?;
        category.reference = reference;
        Ok(category)
    }

    fn document_id(&self) -> &str {
        &self.id
    }
}

impl Entity for Category {
    type Patch = CategoryPatch;

    const KIND: EntityKind = EntityKind::Category;

    fn normalize(&mut self) {
        self.name = sentence_case(&self.name);
        self.lower = self.name.to_lowercase();
    }

    fn apply(&mut self, patch: CategoryPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(state) = patch.state {
            self.state = state;
        }
    }

    fn mirror_path(&self, collections: &Collections) -> Option<DocumentPath> {
        Some(Self::mirror_collection(collections, &self.user).doc(&self.id))
    }

    fn reference(&self) -> Option<&DocumentPath> {
        self.reference.path()
    }
}

impl SoftDelete for Category {
    fn is_active(&self) -> bool {
        self.state
    }

    fn deactivation() -> CategoryPatch {
        CategoryPatch {
            state: Some(false),
            ..Default::default()
        }
    }
}
