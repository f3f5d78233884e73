//! List command handler.

use color_eyre::Result;

use crate::error::AppError;
use crate::models::EntityKind;
use crate::services::{CategoryService, ProductService, UserService};
use crate::store::QueryOptions;

use super::{print_json, App};

impl App {
    pub async fn run_list(
        &self,
        collection: &str,
        limit: Option<usize>,
        skip: Option<usize>,
    ) -> Result<()> {
        let ctx = self.context().await?;
        let options = QueryOptions { limit, skip };

        match ctx.config.collections.kind_of(collection) {
            Some(EntityKind::User) => {
                let users = ctx.resolve::<UserService>().list(options).await?;
                print_json(&users)
            }
            Some(EntityKind::Category) => {
                let categories = ctx.resolve::<CategoryService>().list_active(options).await?;
                print_json(&categories)
            }
            Some(EntityKind::Product) => {
                let products = ctx.resolve::<ProductService>().list_active(options).await?;
                print_json(&products)
            }
            Some(EntityKind::Role) | None => {
                Err(AppError::UnknownCollection(collection.to_string()).into())
            }
        }
    }
}
