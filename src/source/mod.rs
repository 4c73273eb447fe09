//! Cursor Source
//!
//! Abstraction over the backend that serves cursor-paginated lists. The table
//! only ever talks to a source through this trait.

mod memory;

pub use memory::*;

use crate::domain::{CursorListResult, QueryIdentity, SortSpec};
use crate::error::Result;
use std::collections::BTreeMap;
use std::future::Future;

/// Arguments of a list query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListArgs {
    /// `None` requests the first page
    pub cursor: Option<String>,
    pub page_size: usize,
    pub search: String,
    pub filters: BTreeMap<String, String>,
    pub sort_by: Option<SortSpec>,
}

impl ListArgs {
    pub fn new(identity: &QueryIdentity, cursor: Option<String>) -> Self {
        Self {
            cursor,
            page_size: identity.page_size,
            search: identity.search.clone(),
            filters: identity.filters.clone(),
            sort_by: identity.sort_by.clone(),
        }
    }
}

/// Arguments of a count query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountArgs {
    pub search: String,
    pub filters: BTreeMap<String, String>,
    pub sort_by: Option<SortSpec>,
}

impl From<&QueryIdentity> for CountArgs {
    fn from(identity: &QueryIdentity) -> Self {
        Self {
            search: identity.search.clone(),
            filters: identity.filters.clone(),
            sort_by: identity.sort_by.clone(),
        }
    }
}

/// Location of the final page, as reported by a last-page resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastPage {
    /// 0-based page index
    pub page_index: usize,
    /// Cursor that fetches the page; `None` for the first page
    pub cursor: Option<String>,
}

/// Backend serving cursor-paginated rows
pub trait CursorSource: Send + Sync + 'static {
    type Row: Clone + Send + Sync + 'static;

    /// Fetch one page
    fn list(
        &self,
        args: ListArgs,
    ) -> impl Future<Output = Result<CursorListResult<Self::Row>>> + Send;

    /// Total number of rows matching the query
    fn count(&self, args: CountArgs) -> impl Future<Output = Result<u64>> + Send;

    /// Locate the last page directly
    ///
    /// `Ok(None)` means the source cannot resolve it; the table then walks
    /// forward page by page.
    fn resolve_last_page(
        &self,
        _args: CountArgs,
        _page_size: usize,
    ) -> impl Future<Output = Result<Option<LastPage>>> + Send {
        async { Ok(None) }
    }
}
