//! User model. The user document is the root of each owner's mirrored subtree.

use serde::{Deserialize, Serialize};

use super::{default_true, from_fields, title_case, to_fields, Entity, EntityKind, Reference, SoftDelete};
use crate::config::Collections;
use crate::error::AppError;
use crate::store::{Document, DocumentConverter, DocumentPath, Fields};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub lower: String,
    pub email: String,
    #[serde(default)]
    pub avatar: String,
    /// Role id.
    pub role: String,
    #[serde(default)]
    pub online: bool,
    /// Created through an identity provider sign-in.
    #[serde(default)]
    pub google: bool,
    #[serde(default = "default_true")]
    pub state: bool,
    #[serde(skip)]
    pub reference: Reference,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<String>,
    pub online: Option<bool>,
    pub state: Option<bool>,
}

impl User {
    pub fn new(id: String, name: &str, email: &str, role: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            lower: name.to_string(),
            email: email.to_string(),
            avatar: String::new(),
            role: role.to_string(),
            online: false,
            google: false,
            state: true,
            reference: Reference::default(),
        }
    }
}

impl DocumentConverter for User {
    fn to_document(&self) -> Result<Fields, AppError> {
        to_fields(self)
    }

    fn from_document(document: Document) -> Result<Self, AppError> {
        let (mut user, reference): (Self, _) = from_fields(document)?;
        user.reference = reference;
        Ok(user)
    }

    fn document_id(&self) -> &str {
        &self.id
    }
}

impl Entity for User {
    type Patch = UserPatch;

    const KIND: EntityKind = EntityKind::User;

    fn normalize(&mut self) {
        self.name = title_case(&self.name);
        self.lower = self.name.to_lowercase();
    }

    fn apply(&mut self, patch: UserPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(avatar) = patch.avatar {
            self.avatar = avatar;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(online) = patch.online {
            self.online = online;
        }
        if let Some(state) = patch.state {
            self.state = state;
        }
    }

    fn mirror_path(&self, _collections: &Collections) -> Option<DocumentPath> {
        None
    }

    fn reference(&self) -> Option<&DocumentPath> {
        self.reference.path()
    }
}

impl SoftDelete for User {
    fn is_active(&self) -> bool {
        self.state
    }

    fn deactivation() -> UserPatch {
        UserPatch {
            state: Some(false),
            ..Default::default()
        }
    }
}
