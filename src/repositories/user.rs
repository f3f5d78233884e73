use crate::criteria;
use crate::error::AppError;
use crate::models::{Role, User};

use super::Repository;

pub type UserRepository = Repository<User>;
pub type RoleRepository = Repository<Role>;

impl Repository<User> {
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.where_equal_one(criteria!(email = email)).await
    }
}

impl Repository<Role> {
    /// Finds a role by name; names are stored upper-cased.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Role>, AppError> {
        let name = crate::models::upper_case(name);
        self.where_equal_one(criteria!(name = &name)).await
    }
}
