//! Category use cases with their validation rules.

use crate::criteria;
use crate::error::AppError;
use crate::models::{lookup_key, Category, CategoryPatch, EntityKind, Product, User};
use crate::repositories::{CategoryRepository, ProductRepository};
use crate::store::QueryOptions;

/// Service for category listing, creation, updates and soft deletion.
#[derive(Clone)]
pub struct CategoryService {
    categories: CategoryRepository,
    products: ProductRepository,
}

crate::from_context!(CategoryService {
    categories,
    products
});

impl CategoryService {
    pub async fn list_active(&self, options: QueryOptions) -> Result<Vec<Category>, AppError> {
        self.categories
            .where_equal(criteria!(state = true), options)
            .fetch_all()
            .await
    }

    /// Prefix match on the normalized name.
    pub async fn search_by_name(
        &self,
        name: &str,
        options: QueryOptions,
    ) -> Result<Vec<Category>, AppError> {
        self.categories
            .where_starts_with(criteria!(lower = lookup_key(name)), options)
            .fetch_all()
            .await
    }

    /// An active category.
    ///
    /// # Errors
    ///
    /// [`AppError::CategoryNotFound`] when missing or soft-deleted.
    pub async fn get(&self, id: &str) -> Result<Category, AppError> {
        match self.categories.find_by_id(id).await? {
            Some(category) if category.state => Ok(category),
            _ => Err(AppError::CategoryNotFound(id.to_string())),
        }
    }

    /// Products of an active category, read from its owner's subtree.
    pub async fn products(&self, id: &str) -> Result<Vec<Product>, AppError> {
        let category = self.get(id).await?;
        self.products.products_in(&category).await
    }

    pub async fn create(&self, author: &User, name: &str) -> Result<Category, AppError> {
        self.ensure_unique_name(name, None).await?;

        let mut category = Category::new(self.categories.new_id(), name, &author.id);
        self.categories.save(&mut category).await?;
        Ok(category)
    }

    pub async fn update(
        &self,
        author: &User,
        id: &str,
        patch: CategoryPatch,
    ) -> Result<Category, AppError> {
        let mut category = self.get(id).await?;
        ensure_author(&category, author)?;
        if let Some(name) = &patch.name {
            self.ensure_unique_name(name, Some(id)).await?;
        }

        self.categories.update(&mut category, patch).await?;
        Ok(category)
    }

    /// Soft delete in both copies.
    pub async fn delete(&self, author: &User, id: &str) -> Result<Category, AppError> {
        let mut category = self.get(id).await?;
        ensure_author(&category, author)?;

        self.categories.soft_delete(&mut category).await?;
        Ok(category)
    }

    /// Fails when another category already uses the normalized `name`.
    async fn ensure_unique_name(&self, name: &str, current: Option<&str>) -> Result<(), AppError> {
        match self.categories.find_by_name(name).await? {
            Some(existing) if Some(existing.id.as_str()) != current => Err(AppError::DuplicateName {
                kind: EntityKind::Category,
                name: existing.name,
            }),
            _ => Ok(()),
        }
    }
}

fn ensure_author(category: &Category, author: &User) -> Result<(), AppError> {
    if category.user != author.id {
        return Err(AppError::Unauthorized {
            kind: EntityKind::Category,
            id: category.id.clone(),
        });
    }
    Ok(())
}
