//! Data access layer over the document store.
//!
//! One generic [`Repository`] serves every entity type; per-type modules add
//! name lookups and reads from the mirrored subtree. Repositories resolve
//! from the [`Context`](crate::context::Context) via `FromRef`.

mod category;
mod entity;
mod product;
mod user;

pub use category::CategoryRepository;
pub use entity::{ReconcileOutcome, ReconcileReport, Repository};
pub use product::ProductRepository;
pub use user::{RoleRepository, UserRepository};
