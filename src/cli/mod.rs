//! CLI module for catalog-store.
//!
//! Subcommands:
//! - `init`: Create the document table on the postgres backend
//! - `search`: Union substring search over a collection
//! - `list`: Active records of a collection
//! - `reconcile`: Rewrite diverged mirrors from their primary copies

mod init;
mod list;
mod reconcile;
mod search;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::config::Config;
use crate::context::Context;

/// catalog-store - document data layer for users, categories and products
#[derive(Parser)]
#[command(name = "catalog-store")]
#[command(about = "Catalog data layer over a document store with per-user mirrors")]
#[command(version)]
pub struct App {
    /// Run in verbose mode
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the document table (postgres backend)
    Init,

    /// Search a collection for a term or an id
    Search {
        /// Collection name (users, categories, products)
        collection: String,
        /// Search term, or a document id
        term: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        skip: Option<usize>,
    },

    /// List active records of a collection
    List {
        /// Collection name (users, categories, products)
        collection: String,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        skip: Option<usize>,
    },

    /// Repair mirrors that diverged from their primary copies
    Reconcile {
        #[arg(value_enum)]
        target: MirroredCollection,
    },
}

/// Collections whose entities are mirrored under their owner.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MirroredCollection {
    Categories,
    Products,
}

impl App {
    /// Run the CLI application.
    pub async fn run(self) -> color_eyre::Result<()> {
        match self.command {
            Command::Init => self.run_init().await,
            Command::Search {
                ref collection,
                ref term,
                limit,
                skip,
            } => self.run_search(collection, term, limit, skip).await,
            Command::List {
                ref collection,
                limit,
                skip,
            } => self.run_list(collection, limit, skip).await,
            Command::Reconcile { target } => self.run_reconcile(target).await,
        }
    }

    /// Loads configuration and connects the configured store.
    async fn context(&self) -> color_eyre::Result<Context> {
        let config = Config::load()?;
        tracing::info!(backend = ?config.store.backend, "Loaded configuration");
        Ok(Context::from_config(config).await?)
    }
}

/// Prints a value as pretty JSON on stdout.
fn print_json<T: Serialize>(value: &T) -> color_eyre::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
