//! Cursor Table - Demo Entry Point
//!
//! Drives a table over an in-memory user list and logs each navigation step.
//! Pass a TOML config path as the first argument to override the defaults.

use anyhow::Context;
use cursor_table::config::default_config_path;
use cursor_table::source::{CursorStyle, MemoryRow, MemorySource};
use cursor_table::{CursorSource, CursorTable, TableConfig};
use std::path::PathBuf;

#[derive(Clone, Debug)]
struct DemoUser {
    id: u32,
    name: String,
    email: String,
    role: &'static str,
}

impl MemoryRow for DemoUser {
    fn matches_search(&self, search: &str) -> bool {
        self.name.to_lowercase().contains(search) || self.email.contains(search)
    }

    fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(format!("{:06}", self.id)),
            "name" => Some(self.name.clone()),
            "email" => Some(self.email.clone()),
            "role" => Some(self.role.to_string()),
            _ => None,
        }
    }
}

fn demo_users() -> Vec<DemoUser> {
    const NAMES: [&str; 8] = ["Ada", "Grace", "Alan", "Edsger", "Barbara", "Ken", "Dennis", "Frances"];
    (0..57)
        .map(|id| {
            let first = NAMES[id as usize % NAMES.len()];
            DemoUser {
                id,
                name: format!("{first} {id}"),
                email: format!("{}{id}@example.com", first.to_lowercase()),
                role: if id % 7 == 0 { "admin" } else { "member" },
            }
        })
        .collect()
}

fn load_config() -> anyhow::Result<TableConfig> {
    let path = match std::env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => default_config_path().context("Failed to locate config directory")?,
    };
    let config = TableConfig::load(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    if config.filter_spec("role").is_some() {
        Ok(config)
    } else {
        Ok(config.with_filter("role", "all"))
    }
}

fn log_page<S: CursorSource>(table: &CursorTable<S>, step: &str) {
    let (page, count, rows, query) = table.read(|s| {
        (s.page_index() + 1, s.page_count(), s.rows().len(), s.query_string())
    });
    tracing::info!("{step}: page {page}/{count}, {rows} rows, ?{query}");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting cursor table demo...");

    let config = load_config()?;
    let source = MemorySource::new(demo_users()).with_cursor_style(CursorStyle::Opaque);
    let table = CursorTable::new(source, config).context("Invalid table config")?;
    let events = table.subscribe();

    table.refresh().await?;
    log_page(&table, "Loaded");

    table.go_next().await?;
    log_page(&table, "Next");

    table.go_last().await;
    log_page(&table, "Last");

    table.go_previous().await?;
    log_page(&table, "Previous");

    table.set_filter("role", "admin").await?;
    log_page(&table, "Admins");

    table.set_filter("role", "all").await?;
    table.toggle_sort("name").await?;
    log_page(&table, "Sorted by name");

    table.search("ada").await?;
    log_page(&table, "Search");

    table.go_first().await?;
    log_page(&table, "First");

    tracing::info!("{} events emitted", events.try_iter().count());
    Ok(())
}
