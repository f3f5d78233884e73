//! Category lookups and reads from the per-user mirror.

use crate::criteria;
use crate::error::AppError;
use crate::models::{lookup_key, Category, User};

use super::Repository;

pub type CategoryRepository = Repository<Category>;

impl Repository<Category> {
    /// Finds a category by its normalized name.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Category>, AppError> {
        self.where_equal_one(criteria!(lower = lookup_key(name))).await
    }

    /// Categories mirrored under `user`, read from `users/{id}/categories`.
    pub async fn categories_of(&self, user: &User) -> Result<Vec<Category>, AppError> {
        let collection = Category::mirror_collection(self.collections(), &user.id);
        self.query_in(collection).fetch_all().await
    }
}
