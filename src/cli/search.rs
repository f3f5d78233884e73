//! Search command handler.

use color_eyre::Result;

use crate::services::SearchService;
use crate::store::QueryOptions;

use super::{print_json, App};

impl App {
    pub async fn run_search(
        &self,
        collection: &str,
        term: &str,
        limit: Option<usize>,
        skip: Option<usize>,
    ) -> Result<()> {
        let ctx = self.context().await?;
        let service: SearchService = ctx.resolve();

        let results = service
            .search(collection, term, QueryOptions { limit, skip })
            .await?;
        tracing::info!(matches = results.len(), "Search complete");

        print_json(&results)
    }
}
