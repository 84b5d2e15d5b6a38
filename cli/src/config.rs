use std::time::Duration;

use anyhow::anyhow;
use clap::{Parser, Subcommand};
use items_core::form::to_iso_instant;
use items_core::{Item, ItemStatus, QueryConfig, UnknownStatus};
use uuid::Uuid;

/// Terminal front end for the items API.
#[derive(Debug, Parser)]
#[command(name = "items", version)]
pub struct Cli {
    /// Base URL of the items API.
    #[arg(long, env = "ITEMS_API_URL", default_value = "http://localhost:3000")]
    pub api_url: String,

    /// Seconds before a cached page is refetched.
    #[arg(long, env = "ITEMS_STALE_SECS", default_value_t = 60)]
    pub stale_secs: u64,

    /// Per-request timeout in seconds.
    #[arg(long, env = "ITEMS_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Command,
}

/// Filter shared by every command that looks at a page of the table.
#[derive(Debug, clap::Args)]
pub struct PageArgs {
    /// URL search string carrying the page, e.g. "?page=2".
    #[arg(long, default_value = "")]
    pub search: String,

    /// Which items to list.
    #[arg(long, default_value = "todo", value_parser = parse_status)]
    pub status: ItemStatus,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show one page of items.
    List(PageArgs),
    /// Create an item.
    Add {
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Calendar date, YYYY-MM-DD.
        #[arg(long, default_value = "")]
        due_date: String,
    },
    /// Mark an item on the given page as complete.
    Complete {
        id: Uuid,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Change fields of an item on the given page. Omitted fields are kept.
    Edit {
        id: Uuid,
        #[command(flatten)]
        edits: ItemEdits,
        #[command(flatten)]
        page: PageArgs,
    },
    /// Delete an item on the given page.
    Delete {
        id: Uuid,
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Debug, clap::Args)]
pub struct ItemEdits {
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    /// Calendar date, YYYY-MM-DD. An empty value clears it.
    #[arg(long)]
    pub due_date: Option<String>,
}

impl ItemEdits {
    /// The full record to send back: `item` with the given fields replaced.
    pub fn apply(&self, item: &Item) -> anyhow::Result<Item> {
        let mut edited = item.clone();
        if let Some(title) = &self.title {
            edited.title = title.clone();
        }
        if let Some(description) = &self.description {
            edited.description = Some(description.clone());
        }
        if let Some(due_date) = &self.due_date {
            edited.due_date = if due_date.trim().is_empty() {
                None
            } else {
                let instant = to_iso_instant(due_date)
                    .ok_or_else(|| anyhow!("Due Date: Due date must be a valid date."))?;
                Some(instant)
            };
        }
        Ok(edited)
    }
}

fn parse_status(raw: &str) -> Result<ItemStatus, UnknownStatus> {
    raw.parse()
}

impl Cli {
    pub fn query_config(&self) -> QueryConfig {
        QueryConfig {
            stale_time: Duration::from_secs(self.stale_secs),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
