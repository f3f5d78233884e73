//! Role model, referenced by id from users.

use serde::{Deserialize, Serialize};

use super::{from_fields, to_fields, upper_case, Entity, EntityKind, Reference};
use crate::config::Collections;
use crate::error::AppError;
use crate::store::{Document, DocumentConverter, DocumentPath, Fields};

/// A named role such as `ADMIN_ROLE`. Stored flat, never mirrored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    #[serde(skip_serializing)]
    pub id: String,
    pub name: String,
    #[serde(skip)]
    pub reference: Reference,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RolePatch {
    pub name: Option<String>,
}

impl Role {
    pub fn new(id: String, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            reference: Reference::default(),
        }
    }
}

impl DocumentConverter for Role {
    fn to_document(&self) -> Result<Fields, AppError> {
        to_fields(self)
    }

    fn from_document(document: Document) -> Result<Self, AppError> {
        let (mut role, reference): (Self, _) = from_fields(document)?;
        role.reference = reference;
        Ok(role)
    }

    fn document_id(&self) -> &str {
        &self.id
    }
}

impl Entity for Role {
    type Patch = RolePatch;

    const KIND: EntityKind = EntityKind::Role;

    fn normalize(&mut self) {
        self.name = upper_case(&self.name);
    }

    fn apply(&mut self, patch: RolePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
    }

    fn mirror_path(&self, _collections: &Collections) -> Option<DocumentPath> {
        None
    }

    fn reference(&self) -> Option<&DocumentPath> {
        self.reference.path()
    }
}
