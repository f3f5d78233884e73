//! catalog-store - data layer for a user/category/product catalog
//!
//! Entities live in flat collections and are mirrored under their owning
//! user (`users/{uid}/categories/{cid}/products/{pid}`) for per-user reads.
//! The store only indexes equality and ranges, so prefix search runs as a
//! range and substring search runs client-side.

pub mod cli;
pub mod config;
pub mod context;
pub mod di;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;
pub mod store;

pub use di::FromRef;
