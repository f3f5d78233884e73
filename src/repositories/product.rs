//! Product lookups and reads from the per-user, per-category mirror.

use crate::criteria;
use crate::error::AppError;
use crate::models::{lookup_key, Category, Product};

use super::Repository;

pub type ProductRepository = Repository<Product>;

impl Repository<Product> {
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Product>, AppError> {
        self.where_equal_one(criteria!(lower = lookup_key(name))).await
    }

    /// Products mirrored at `users/{user}/categories/{category}/products`.
    pub async fn products_of(&self, user: &str, category: &str) -> Result<Vec<Product>, AppError> {
        let collection = Product::mirror_collection(self.collections(), user, category);
        self.query_in(collection).fetch_all().await
    }

    /// Products of `category`, read from its owner's subtree.
    pub async fn products_in(&self, category: &Category) -> Result<Vec<Product>, AppError> {
        self.products_of(&category.user, &category.id).await
    }
}
