//! Business logic services for the catalog.
//!
//! Services orchestrate repositories and enforce the validation rules that
//! guard every write (duplicate names and emails, authorship, missing or
//! disabled entities). They resolve from the context via `FromRef`.

mod category;
mod external;
mod product;
mod search;
mod user;

pub use category::CategoryService;
pub use external::{AccountUpdate, CredentialIssuer, Detached, NewAccount, UploadSink};
pub use product::{NewProduct, ProductChanges, ProductService};
pub use search::{SearchResults, SearchService};
pub use user::{Identity, NewUser, UserChanges, UserService};
