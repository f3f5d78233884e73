//! User use cases, kept in step with the external account provider.
//!
//! The provider account is created first so the user entity can reuse its id.
//! Deleting a user disables the account, then soft-deletes the entity.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::context::{AppCredentials, AppUploads};
use crate::criteria;
use crate::error::AppError;
use crate::models::{Category, User, UserPatch};
use crate::repositories::{CategoryRepository, RoleRepository, UserRepository};
use crate::services::external::{AccountUpdate, NewAccount};
use crate::store::QueryOptions;

const AVATAR_FOLDER: &str = "users";

/// Input for registering a user with a password. `role` is a role name.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub avatar: Option<PathBuf>,
}

/// Changes to a user. `role` is a role name.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub avatar: Option<PathBuf>,
}

/// A verified identity from an external sign-in provider.
#[derive(Debug, Clone)]
pub struct Identity {
    pub name: String,
    pub email: String,
    pub picture: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    users: UserRepository,
    roles: RoleRepository,
    categories: CategoryRepository,
    credentials: AppCredentials,
    uploads: AppUploads,
    config: Arc<Config>,
}

crate::from_context!(UserService {
    users,
    roles,
    categories,
    credentials,
    uploads,
    config
});

impl UserService {
    /// Active users; without a limit the configured page size applies.
    pub async fn list(&self, options: QueryOptions) -> Result<Vec<User>, AppError> {
        let options = QueryOptions {
            limit: options
                .effective_limit()
                .or(Some(self.config.defaults.page_limit)),
            skip: options.skip,
        };
        self.users
            .where_equal(criteria!(state = true), options)
            .fetch_all()
            .await
    }

    /// An active user; missing or soft-deleted is [`AppError::UserNotFound`].
    pub async fn get(&self, id: &str) -> Result<User, AppError> {
        match self.users.find_by_id(id).await? {
            Some(user) if user.state => Ok(user),
            _ => Err(AppError::UserNotFound(id.to_string())),
        }
    }

    pub async fn categories(&self, id: &str) -> Result<Vec<Category>, AppError> {
        let user = self.get(id).await?;
        self.categories.categories_of(&user).await
    }

    pub async fn create(&self, input: NewUser) -> Result<User, AppError> {
        self.ensure_unique_email(&input.email, None).await?;
        let role = self.resolve_role(&input.role).await?;

        let id = self
            .credentials
            .create_account(NewAccount {
                email: input.email.clone(),
                password: Some(input.password),
                display_name: input.name.clone(),
                photo_url: None,
            })
            .await?;

        let mut user = User::new(id, &input.name, &input.email, &role);
        if let Some(avatar) = &input.avatar {
            user.avatar = self.uploads.upload(avatar, AVATAR_FOLDER, &user.id).await?;
        }

        self.users.save(&mut user).await?;
        Ok(user)
    }

    pub async fn update(&self, id: &str, changes: UserChanges) -> Result<User, AppError> {
        let mut user = self.get(id).await?;
        if let Some(email) = &changes.email {
            self.ensure_unique_email(email, Some(id)).await?;
        }

        let role = match &changes.role {
            Some(name) => Some(self.resolve_role(name).await?),
            None => None,
        };
        let avatar = match &changes.avatar {
            Some(file) => Some(self.uploads.upload(file, AVATAR_FOLDER, id).await?),
            None => None,
        };

        self.credentials
            .update_account(
                id,
                AccountUpdate {
                    email: changes.email.clone(),
                    password: changes.password,
                    display_name: changes.name.clone(),
                    photo_url: avatar.clone(),
                },
            )
            .await?;

        let patch = UserPatch {
            name: changes.name,
            email: changes.email,
            avatar,
            role,
            ..Default::default()
        };
        self.users.update(&mut user, patch).await?;
        Ok(user)
    }

    /// Disables the provider account, then soft-deletes the user.
    pub async fn delete(&self, id: &str) -> Result<User, AppError> {
        let mut user = self.get(id).await?;

        self.credentials.disable_account(id).await?;
        self.users.soft_delete(&mut user).await?;
        Ok(user)
    }

    /// Finds the user for a provider identity, registering it on first sign-in
    /// with the configured default role.
    ///
    /// # Errors
    ///
    /// [`AppError::UserBlocked`] when the user exists but is soft-deleted.
    pub async fn sign_in_with_identity(&self, identity: Identity) -> Result<User, AppError> {
        let user = match self.users.find_by_email(&identity.email).await? {
            Some(user) => user,
            None => {
                let id = self
                    .credentials
                    .create_account(NewAccount {
                        email: identity.email.clone(),
                        password: None,
                        display_name: identity.name.clone(),
                        photo_url: identity.picture.clone(),
                    })
                    .await?;

                let mut user = User::new(
                    id,
                    &identity.name,
                    &identity.email,
                    &self.config.defaults.default_role,
                );
                user.avatar = identity.picture.unwrap_or_default();
                user.google = true;
                self.users.save(&mut user).await?;
                user
            }
        };

        if !user.state {
            return Err(AppError::UserBlocked(user.id));
        }
        Ok(user)
    }

    /// Role id for a role name.
    async fn resolve_role(&self, name: &str) -> Result<String, AppError> {
        self.roles
            .find_by_name(name)
            .await?
            .map(|role| role.id)
            .ok_or_else(|| AppError::RoleNotFound(name.to_string()))
    }

    async fn ensure_unique_email(&self, email: &str, current: Option<&str>) -> Result<(), AppError> {
        match self.users.find_by_email(email).await? {
            Some(existing) if Some(existing.id.as_str()) != current => {
                Err(AppError::DuplicateEmail(email.to_string()))
            }
            _ => Ok(()),
        }
    }
}
