//! Table Configuration
//!
//! Page size, cache bounds, debounce window and the filter schema of a table
//! instance. Stored as TOML, loaded from an explicit path or from the platform
//! config directory.

use crate::constants::{
    CONFIG_FILE_NAME, DEFAULT_MAX_CACHED_PAGES, DEFAULT_PAGE_SIZE, DEFAULT_PAGE_SIZE_OPTIONS,
    DEFAULT_SEARCH_DEBOUNCE_MS, RESERVED_PARAMS,
};
use crate::error::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// A caller-defined filter parameter and its default value
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FilterSpec {
    /// URL parameter name (e.g. "role")
    pub key: String,
    /// Value used when the parameter is absent (e.g. "all")
    pub default: String,
}

impl FilterSpec {
    pub fn new(key: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            default: default.into(),
        }
    }
}

/// Configuration of a single table session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Page size used when the URL does not name one
    pub default_page_size: usize,
    /// Page sizes accepted from the URL or `set_page_size`
    pub page_size_options: Vec<usize>,
    /// Upper bound on cached pages
    pub max_cached_pages: usize,
    /// Debounce window for search input
    pub search_debounce_ms: u64,
    /// Whether adjacent pages are fetched in the background
    pub prefetch: bool,
    /// Optional per-request timeout; `None` waits indefinitely
    pub request_timeout_ms: Option<u64>,
    /// Filter parameters, in declaration order
    pub filters: Vec<FilterSpec>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            page_size_options: DEFAULT_PAGE_SIZE_OPTIONS.to_vec(),
            max_cached_pages: DEFAULT_MAX_CACHED_PAGES,
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
            prefetch: true,
            request_timeout_ms: None,
            filters: Vec::new(),
        }
    }
}

impl TableConfig {
    /// Add a filter parameter
    pub fn with_filter(mut self, key: impl Into<String>, default: impl Into<String>) -> Self {
        self.filters.push(FilterSpec::new(key, default));
        self
    }

    /// Set the default page size
    pub fn with_page_size(mut self, size: usize) -> Self {
        self.default_page_size = size;
        self
    }

    /// Set the cache bound
    pub fn with_max_cached_pages(mut self, max: usize) -> Self {
        self.max_cached_pages = max;
        self
    }

    /// Disable background prefetching
    pub fn without_prefetch(mut self) -> Self {
        self.prefetch = false;
        self
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Whether `size` is an accepted page size
    pub fn accepts_page_size(&self, size: usize) -> bool {
        size > 0 && (size == self.default_page_size || self.page_size_options.contains(&size))
    }

    /// Default value of every filter key
    pub fn default_filters(&self) -> BTreeMap<String, String> {
        self.filters
            .iter()
            .map(|f| (f.key.clone(), f.default.clone()))
            .collect()
    }

    pub fn filter_spec(&self, key: &str) -> Option<&FilterSpec> {
        self.filters.iter().find(|f| f.key == key)
    }

    /// Check sizes and the filter schema
    pub fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 {
            return Err(Error::invalid("default_page_size must be positive"));
        }
        if self.page_size_options.contains(&0) {
            return Err(Error::invalid("page_size_options may not contain 0"));
        }
        if self.max_cached_pages == 0 {
            return Err(Error::invalid("max_cached_pages must be positive"));
        }

        let mut seen = HashSet::new();
        for filter in &self.filters {
            if filter.key.is_empty() {
                return Err(Error::invalid("filter key may not be empty"));
            }
            if RESERVED_PARAMS.contains(&filter.key.as_str()) {
                return Err(Error::invalid(format!(
                    "filter key '{}' shadows a reserved parameter",
                    filter.key
                )));
            }
            if !seen.insert(filter.key.as_str()) {
                return Err(Error::invalid(format!(
                    "duplicate filter key '{}'",
                    filter.key
                )));
            }
        }

        Ok(())
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: TableConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from the platform config directory
    pub fn load_default() -> Result<Self> {
        Self::load(&default_config_path()?)
    }
}

/// Location of the config file
///
/// - **Linux**: `~/.config/cursor-table/table.toml`
/// - **macOS**: `~/Library/Application Support/dev.cursor-table.cursor-table/table.toml`
/// - **Windows**: `C:\Users\<User>\AppData\Roaming\cursor-table\cursor-table\config\table.toml`
pub fn default_config_path() -> Result<PathBuf> {
    let Some(project_dirs) = ProjectDirs::from("dev", "cursor-table", "cursor-table") else {
        return Err(Error::invalid("Could not determine project directories"));
    };
    Ok(project_dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = TableConfig::from_toml(
            r#"
            default_page_size = 20
            page_size_options = [20, 40]
            max_cached_pages = 6
            search_debounce_ms = 150
            prefetch = false
            request_timeout_ms = 5000

            [[filters]]
            key = "role"
            default = "all"
            "#,
        )
        .expect("valid config");

        assert_eq!(config.default_page_size, 20);
        assert_eq!(config.max_cached_pages, 6);
        assert!(!config.prefetch);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.default_filters().get("role").map(String::as_str), Some("all"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = TableConfig::from_toml("  ").expect("defaults");
        assert_eq!(config.default_page_size, DEFAULT_PAGE_SIZE);
        assert!(config.prefetch);
    }

    #[test]
    fn test_reserved_filter_key_rejected() {
        let config = TableConfig::default().with_filter("cursor", "x");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_filter_key_rejected() {
        let config = TableConfig::default()
            .with_filter("role", "all")
            .with_filter("role", "admin");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_accepts_page_size() {
        let config = TableConfig::default();
        assert!(config.accepts_page_size(20));
        assert!(!config.accepts_page_size(0));
        assert!(!config.accepts_page_size(7));
    }
}
