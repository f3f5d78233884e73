//! Document store abstraction.
//!
//! This module provides a backend-agnostic interface over a schemaless
//! document store addressed by materialized paths, plus a typed query
//! builder on top of it.
//!
//! # Architecture
//!
//! - [`DocumentStore`] - point reads/writes and equality/range queries
//! - [`DocumentConverter`] - entity <-> flat document mapping
//! - [`QueryBuilder`] - fluent, typed queries with prefix and union search
//! - [`backends`] - memory and PostgreSQL implementations
//!
//! # Example
//!
//! ```ignore
//! use catalog_store::criteria;
//! use catalog_store::store::{CollectionPath, QueryBuilder};
//!
//! let products: Vec<Product> = QueryBuilder::new(store, CollectionPath::root("products"))
//!     .where_equal(criteria!(state = true))
//!     .where_starts_with(criteria!(lower = "cof"))
//!     .limit(10)
//!     .fetch_all()
//!     .await?;
//! ```

mod criteria;
mod document;
mod filter;
mod path;
mod query;
mod traits;

pub mod backends;

pub use criteria::{Criteria, CriteriaValue, QueryOptions};
pub use document::{Document, DocumentStream, Fields};
pub use filter::{compare_values, Filter, FilterOp, StructuredQuery};
pub use path::{CollectionPath, DocumentPath};
pub use query::{prefix_upper_bound, QueryBuilder};
pub use traits::{generate_id, is_generated_id, DocumentConverter, DocumentStore};
