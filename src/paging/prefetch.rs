//! Prefetch Candidates
//!
//! Adjacent pages worth fetching in the background. Only exact, cheap
//! lookups qualify: no candidate ever requires hydrating the cursor chain.

use super::cache::PageCache;
use super::cursors::CursorChain;
use crate::domain::CursorListResult;

/// A page to fetch speculatively
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefetchCandidate {
    pub index: usize,
    /// `None` fetches the first page
    pub cursor: Option<String>,
}

/// The page after the current one, if it exists and is not cached yet
pub fn get_next_prefetch_candidate<T>(
    current_index: usize,
    current: Option<&CursorListResult<T>>,
    cache: &PageCache<T>,
) -> Option<PrefetchCandidate> {
    let cursor = current?.continue_cursor()?;
    let index = current_index.checked_add(1)?;
    if cache.contains(index) {
        return None;
    }
    Some(PrefetchCandidate {
        index,
        cursor: Some(cursor.to_string()),
    })
}

/// The page before the current one, if its cursor is known and it is not cached
pub fn get_previous_prefetch_candidate<T>(
    current_index: usize,
    cursors: &CursorChain,
    cache: &PageCache<T>,
) -> Option<PrefetchCandidate> {
    let index = current_index.checked_sub(1)?;
    if cache.contains(index) {
        return None;
    }
    let cursor = cursors.cursor_for(index)?;
    Some(PrefetchCandidate {
        index,
        cursor: cursor.map(str::to_string),
    })
}
