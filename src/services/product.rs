//! Product use cases with their validation rules.

use std::path::PathBuf;

use crate::context::AppUploads;
use crate::criteria;
use crate::error::AppError;
use crate::models::{lookup_key, EntityKind, Product, ProductPatch, User};
use crate::repositories::{CategoryRepository, ProductRepository};
use crate::store::QueryOptions;

const IMAGE_FOLDER: &str = "products";

/// Input for creating a product. `category` is a category name.
#[derive(Debug, Clone, Default)]
pub struct NewProduct {
    pub name: String,
    pub category: String,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub available: Option<bool>,
    /// Local image to upload before saving.
    pub image: Option<PathBuf>,
}

/// Changes to a product. `category` is a category name.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub description: Option<String>,
    pub available: Option<bool>,
    pub image: Option<PathBuf>,
}

#[derive(Clone)]
pub struct ProductService {
    products: ProductRepository,
    categories: CategoryRepository,
    uploads: AppUploads,
}

crate::from_context!(ProductService {
    products,
    categories,
    uploads
});

impl ProductService {
    pub async fn list_active(&self, options: QueryOptions) -> Result<Vec<Product>, AppError> {
        self.products
            .where_equal(criteria!(state = true), options)
            .fetch_all()
            .await
    }

    pub async fn search_by_name(
        &self,
        name: &str,
        options: QueryOptions,
    ) -> Result<Vec<Product>, AppError> {
        self.products
            .where_starts_with(criteria!(lower = lookup_key(name)), options)
            .fetch_all()
            .await
    }

    /// An active product; missing or soft-deleted is [`AppError::ProductNotFound`].
    pub async fn get(&self, id: &str) -> Result<Product, AppError> {
        match self.products.find_by_id(id).await? {
            Some(product) if product.state => Ok(product),
            _ => Err(AppError::ProductNotFound(id.to_string())),
        }
    }

    pub async fn create(&self, author: &User, input: NewProduct) -> Result<Product, AppError> {
        ensure_price(input.price)?;
        self.ensure_unique_name(&input.name, None).await?;
        let category = self.resolve_category(&input.category).await?;

        let mut product = Product::new(self.products.new_id(), &input.name, &author.id, &category);
        if let Some(price) = input.price {
            product.price = price;
        }
        if let Some(description) = input.description {
            product.description = description;
        }
        if let Some(available) = input.available {
            product.available = available;
        }
        if let Some(image) = &input.image {
            product.img = self.uploads.upload(image, IMAGE_FOLDER, &product.id).await?;
        }

        self.products.save(&mut product).await?;
        Ok(product)
    }

    pub async fn update(
        &self,
        author: &User,
        id: &str,
        changes: ProductChanges,
    ) -> Result<Product, AppError> {
        ensure_price(changes.price)?;
        let mut product = self.get(id).await?;
        ensure_author(&product, author)?;
        if let Some(name) = &changes.name {
            self.ensure_unique_name(name, Some(id)).await?;
        }

        let category = match &changes.category {
            Some(name) => Some(self.resolve_category(name).await?),
            None => None,
        };
        let img = match &changes.image {
            Some(image) => Some(self.uploads.upload(image, IMAGE_FOLDER, id).await?),
            None => None,
        };

        let patch = ProductPatch {
            name: changes.name,
            category,
            price: changes.price,
            img,
            description: changes.description,
            available: changes.available,
            state: None,
        };
        self.products.update(&mut product, patch).await?;
        Ok(product)
    }

    pub async fn delete(&self, author: &User, id: &str) -> Result<Product, AppError> {
        let mut product = self.get(id).await?;
        ensure_author(&product, author)?;

        self.products.soft_delete(&mut product).await?;
        Ok(product)
    }

    /// Category id for a category name.
    async fn resolve_category(&self, name: &str) -> Result<String, AppError> {
        self.categories
            .find_by_name(name)
            .await?
            .map(|category| category.id)
            .ok_or_else(|| AppError::CategoryNotFound(name.to_string()))
    }

    async fn ensure_unique_name(&self, name: &str, current: Option<&str>) -> Result<(), AppError> {
        match self.products.find_by_name(name).await? {
            Some(existing) if Some(existing.id.as_str()) != current => Err(AppError::DuplicateName {
                kind: EntityKind::Product,
                name: existing.name,
            }),
            _ => Ok(()),
        }
    }
}

fn ensure_author(product: &Product, author: &User) -> Result<(), AppError> {
    if product.user != author.id {
        return Err(AppError::Unauthorized {
            kind: EntityKind::Product,
            id: product.id.clone(),
        });
    }
    Ok(())
}

fn ensure_price(price: Option<f64>) -> Result<(), AppError> {
    match price {
        Some(price) if !price.is_finite() => Err(AppError::Validation(format!(
            "price must be a finite number, got {}",
            price
        ))),
        _ => Ok(()),
    }
}
