//! Product model, nested two levels under its owner.

use serde::{Deserialize, Serialize};

use super::category::Category;
use super::{default_true, finite_number, from_fields, sentence_case, to_fields, Entity, EntityKind, Reference, SoftDelete};
use crate::config::Collections;
use crate::error::AppError;
use crate::store::{CollectionPath, Document, DocumentConverter, DocumentPath, Fields};

/// Subcollection holding product mirrors under a category mirror.
pub const SUBCOLLECTION: &str = "products";

fn default_description() -> String {
    "No description".to_string()
}

/// A product belonging to a category and owned by a user.
///
/// Mirrored at `users/{user}/categories/{category}/products/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub lower: String,
    pub user: String,
    /// Owning category's id.
    pub category: String,
    #[serde(default, serialize_with = "finite_number")]
    pub price: f64,
    /// Public image URL; empty when none was uploaded.
    #[serde(default)]
    pub img: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default = "default_true")]
    pub state: bool,
    #[serde(skip)]
    pub reference: Reference,
}

/// Partial update for a [`Product`].
///
/// Changing `category` moves the nested mirror under the new category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub img: Option<String>,
    pub description: Option<String>,
    pub available: Option<bool>,
    pub state: Option<bool>,
}

impl Product {
    pub fn new(id: String, name: &str, user: &str, category: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            lower: name.to_string(),
            user: user.to_string(),
            category: category.to_string(),
            price: 0.0,
            img: String::new(),
            description: default_description(),
            available: true,
            state: true,
            reference: Reference::default(),
        }
    }

    /// `users/{user}/categories/{category}/products`.
    pub fn mirror_collection(collections: &Collections, user: &str, category: &str) -> CollectionPath {
        Category::mirror_collection(collections, user)
            .doc(category)
            .child(SUBCOLLECTION)
    }
}

impl DocumentConverter for Product {
    fn to_document(&self) -> Result<Fields, AppError> {
        to_fields(self)
    }

    fn from_document(document: Document) -> Result<Self, AppError> {
        let (mut product, reference): (Self, _) = from_fields(document)?;
        product.reference = reference;
        Ok(product)
    }

    fn document_id(&self) -> &str {
        &self.id
    }
}

impl Entity for Product {
    type Patch = ProductPatch;

    const KIND: EntityKind = EntityKind::Product;

    fn normalize(&mut self) {
        self.name = sentence_case(&self.name);
        self.lower = self.name.to_lowercase();
    }

    fn apply(&mut self, patch: ProductPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(img) = patch.img {
            self.img = img;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(available) = patch.available {
            self.available = available;
        }
        if let Some(state) = patch.state {
            self.state = state;
        }
    }

    fn mirror_path(&self, collections: &Collections) -> Option<DocumentPath> {
        Some(Self::mirror_collection(collections, &self.user, &self.category).doc(&self.id))
    }

    fn reference(&self) -> Option<&DocumentPath> {
        self.reference.path()
    }
}

impl SoftDelete for Product {
    fn is_active(&self) -> bool {
        self.state
    }

    fn deactivation() -> ProductPatch {
        ProductPatch {
            state: Some(false),
            ..Default::default()
        }
    }
}
