//! Reconcile command handler.

use color_eyre::Result;

use crate::repositories::{CategoryRepository, ProductRepository};

use super::{print_json, App, MirroredCollection};

impl App {
    pub async fn run_reconcile(&self, target: MirroredCollection) -> Result<()> {
        let ctx = self.context().await?;

        let report = match target {
            MirroredCollection::Categories => {
                ctx.resolve::<CategoryRepository>().reconcile_all().await?
            }
            MirroredCollection::Products => {
                ctx.resolve::<ProductRepository>().reconcile_all().await?
            }
        };

        if !report.repaired.is_empty() {
            tracing::warn!(repaired = report.repaired.len(), "Mirrors were out of sync");
        }
        print_json(&report)
    }
}
