//! Free-text search across the catalog collections.
//!
//! The store has no substring index, so this runs the union "contains" search
//! over each collection: results scale with the collection, not the match set.

use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::criteria;
use crate::error::AppError;
use crate::models::{lookup_key, Category, EntityKind, Product, User};
use crate::repositories::{CategoryRepository, ProductRepository, UserRepository};
use crate::store::{is_generated_id, Criteria, QueryOptions};

/// Matches of one search, tagged by collection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase", tag = "collection", content = "results")]
pub enum SearchResults {
    Users(Vec<User>),
    Categories(Vec<Category>),
    Products(Vec<Product>),
}

impl SearchResults {
    pub fn len(&self) -> usize {
        match self {
            SearchResults::Users(users) => users.len(),
            SearchResults::Categories(categories) => categories.len(),
            SearchResults::Products(products) => products.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone)]
pub struct SearchService {
    users: UserRepository,
    categories: CategoryRepository,
    products: ProductRepository,
    config: Arc<Config>,
}

crate::from_context!(SearchService {
    users,
    categories,
    products,
    config
});

impl SearchService {
    /// Searches `collection` for `term`.
    ///
    /// A term shaped like a document id matches ids; any other term is
    /// lowered and matched as a substring of:
    /// - users: name, email
    /// - categories: name
    /// - products: name, description
    pub async fn search(
        &self,
        collection: &str,
        term: &str,
        options: QueryOptions,
    ) -> Result<SearchResults, AppError> {
        let kind = self
            .config
            .collections
            .kind_of(&collection.to_lowercase())
            .ok_or_else(|| AppError::UnknownCollection(collection.to_string()))?;

        let criteria = search_criteria(kind, term);
        tracing::debug!(collection = %kind, term, fields = criteria.len(), "search");

        let results = match kind {
            EntityKind::User => SearchResults::Users(
                self.users.where_either_contains(criteria, options).await?,
            ),
            EntityKind::Category => SearchResults::Categories(
                self.categories
                    .where_either_contains(criteria, options)
                    .await?,
            ),
            EntityKind::Product => SearchResults::Products(
                self.products.where_either_contains(criteria, options).await?,
            ),
            EntityKind::Role => return Err(AppError::UnknownCollection(collection.to_string())),
        };
        Ok(results)
    }
}

fn search_criteria(kind: EntityKind, term: &str) -> Criteria {
    if is_generated_id(term) {
        return criteria!(id = term);
    }
    let needle = lookup_key(term);
    match kind {
        EntityKind::User => criteria!(lower = &needle, email = &needle),
        EntityKind::Product => criteria!(lower = &needle, description = &needle),
        EntityKind::Category | EntityKind::Role => criteria!(lower = &needle),
    }
}
