//! Cursor Table Library
//!
//! State engine for tables backed by cursor-paginated queries: URL state,
//! page cache, cursor chain hydration, prefetching and reset rules.

pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod paging;
pub mod query;
pub mod source;
pub mod state;

pub use config::{FilterSpec, TableConfig};
pub use domain::{CursorListResult, PageEnd, QueryIdentity, SortDirection, SortSpec};
pub use error::{Error, Result};
pub use source::{CountArgs, CursorSource, LastPage, ListArgs};
pub use state::{CursorTable, TableEvent, TableState};
