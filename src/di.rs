//! Dependency injection infrastructure.
//!
//! This module provides compile-time dependency injection using the `FromRef`
//! trait and two declarative macros.
//!
//! # Overview
//!
//! - `FromRef<T>`: Trait for extracting a value from a reference to `T`
//! - [`provide!`](crate::provide): makes each field of a context extractable via `FromRef`
//! - [`from_context!`](crate::from_context): implements `FromRef<Context>` for a
//!   struct by resolving each of its fields
//!
//! # Example
//!
//! ```ignore
//! use catalog_store::di::FromRef;
//!
//! #[derive(Clone)]
//! pub struct CategoryService {
//!     categories: CategoryRepository,
//!     products: ProductRepository,
//! }
//!
//! catalog_store::from_context!(CategoryService { categories, products });
//!
//! // Usage
//! let service = CategoryService::from_ref(&ctx);
//! ```

/// Trait for extracting a value from a reference to another type.
///
/// This is the core trait for compile-time dependency injection.
/// Types that implement `FromRef<T>` can be extracted from `&T`.
pub trait FromRef<T> {
    fn from_ref(input: &T) -> Self;
}

/// Blanket implementation: any Clone type can be extracted from itself.
impl<T: Clone> FromRef<T> for T {
    fn from_ref(input: &T) -> Self {
        input.clone()
    }
}

/// Implements `FromRef<$ctx>` for the type of every listed field by cloning it.
#[macro_export]
macro_rules! provide {
    ($ctx:ty { $($field:ident: $ty:ty),* $(,)? }) => {
        $(
            impl $crate::di::FromRef<$ctx> for $ty {
                fn from_ref(input: &$ctx) -> Self {
                    input.$field.clone()
                }
            }
        )*
    };
}

/// Implements `FromRef<Context>` for a struct whose fields are all resolvable
/// from the application [`Context`](crate::context::Context).
#[macro_export]
macro_rules! from_context {
    ($ty:ident { $($field:ident),* $(,)? }) => {
        impl $crate::di::FromRef<$crate::context::Context> for $ty {
            fn from_ref(ctx: &$crate::context::Context) -> Self {
                Self {
                    $($field: $crate::di::FromRef::from_ref(ctx)),*
                }
            }
        }
    };
}
