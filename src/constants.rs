//! Table Constants
//!
//! Centralized defaults and canonical URL parameter names.

/// Default number of rows per page
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Page sizes offered when none are configured
pub const DEFAULT_PAGE_SIZE_OPTIONS: [usize; 4] = [10, 20, 50, 100];

/// Maximum number of pages kept in the page cache
pub const DEFAULT_MAX_CACHED_PAGES: usize = 10;

/// Search input debounce window
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 300;

/// Canonical URL parameter names
pub const PARAM_SEARCH: &str = "search";
pub const PARAM_SORT: &str = "sort";
pub const PARAM_PAGE: &str = "page";
pub const PARAM_PAGE_SIZE: &str = "page_size";
pub const PARAM_CURSOR: &str = "cursor";

/// Parameter names that filter keys may not shadow
pub const RESERVED_PARAMS: [&str; 5] = [
    PARAM_SEARCH,
    PARAM_SORT,
    PARAM_PAGE,
    PARAM_PAGE_SIZE,
    PARAM_CURSOR,
];

/// Prefix marking a base64url-encoded cursor
pub const CURSOR_B64_PREFIX: &str = "b64.";

/// Config file name inside the platform config directory
pub const CONFIG_FILE_NAME: &str = "table.toml";
