//! Domain models for the catalog.
//!
//! Each entity is an independent record type implementing [`Entity`], so the
//! repository and query builder stay generic over the record type.

mod category;
mod name;
mod product;
mod role;
mod user;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::config::Collections;
use crate::error::AppError;
use crate::store::{Document, DocumentConverter, DocumentPath, Fields};

pub use category::{Category, CategoryPatch};
pub use name::{collapse_whitespace, lookup_key, sentence_case, title_case, upper_case};
pub use product::{Product, ProductPatch};
pub use role::{Role, RolePatch};
pub use user::{User, UserPatch};

/// Entity type tag used in errors and collection lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Category,
    Product,
    Role,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Category => "category",
            EntityKind::Product => "product",
            EntityKind::Role => "role",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transient handle to the document an entity was loaded from.
///
/// Never serialized, and ignored by equality so converted entities compare
/// equal to the ones they were built from.
#[derive(Debug, Clone, Default)]
pub struct Reference(Option<DocumentPath>);

impl Reference {
    pub fn new(path: DocumentPath) -> Self {
        Self(Some(path))
    }

    pub fn path(&self) -> Option<&DocumentPath> {
        self.0.as_ref()
    }
}

impl PartialEq for Reference {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

/// A persisted record type.
///
/// Implementors own their fields, normalize themselves before every write and
/// know where their denormalized mirror lives.
pub trait Entity: DocumentConverter + Clone + Send + Sync + 'static {
    /// Partial update; `None` fields are left untouched.
    type Patch: Send;

    const KIND: EntityKind;

    /// Recomputes derived fields (`name` casing, `lower`).
    fn normalize(&mut self);

    /// Overwrites the fields set in `patch`. Does not normalize.
    fn apply(&mut self, patch: Self::Patch);

    /// Location of the copy nested under the owning user, if the entity has one.
    fn mirror_path(&self, collections: &Collections) -> Option<DocumentPath>;

    /// Handle attached by [`DocumentConverter::from_document`].
    fn reference(&self) -> Option<&DocumentPath>;
}

/// Entities removed by flagging `state = false` instead of deleting.
pub trait SoftDelete: Entity {
    fn is_active(&self) -> bool;

    /// Patch that flags the entity as deleted.
    fn deactivation() -> Self::Patch;
}

/// Writes a float field, failing on NaN and infinities instead of storing
/// `null`.
pub(crate) fn finite_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if !value.is_finite() {
        return Err(serde::ser::Error::custom(format!(
            "{} is not a finite number",
            value
        )));
    }
    serializer.serialize_f64(*value)
}

/// Serializes an entity into its flat field map.
pub(crate) fn to_fields<T: Serialize>(entity: &T) -> Result<Fields, AppError> {
    match serde_json::to_value(entity)? {
        JsonValue::Object(fields) => Ok(fields),
        other => Err(AppError::Internal(format!(
            "entity serialized to a non-object value: {}",
            other
        ))),
    }
}

/// Deserializes a stored document, backfilling `id` from the path and
/// `lower` from `name` for documents written without them.
pub(crate) fn from_fields<T: DeserializeOwned>(
    document: Document,
) -> Result<(T, Reference), AppError> {
    let (path, mut fields) = document.into_parts();

    if !fields.contains_key("id") {
        fields.insert("id".to_string(), JsonValue::String(path.id().to_string()));
    }
    if !fields.contains_key("lower") {
        if let Some(JsonValue::String(name)) = fields.get("name") {
            let lower = lookup_key(name);
            fields.insert("lower".to_string(), JsonValue::String(lower));
        }
    }

    let entity = serde_json::from_value(JsonValue::Object(fields)).map_err(|e| {
        AppError::MalformedDocument {
            path: path.to_string(),
            message: e.to_string(),
        }
    })?;
    Ok((entity, Reference::new(path)))
}

pub(crate) fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CollectionPath;

    #[test]
    fn test_reference_is_ignored_by_equality() {
        let loaded = Reference::new(CollectionPath::root("users").doc("u1"));
        assert_eq!(loaded, Reference::default());
        assert!(Reference::default().path().is_none());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(EntityKind::Category.to_string(), "category");
    }
}
