//! Change Detection
//!
//! Structural changes that invalidate cached pages without changing the
//! query identity: the data under a cursor moved, or the row count changed.

use crate::domain::CursorListResult;

/// Shape of the current page, compared between consecutive loads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSnapshot {
    pub index: usize,
    pub cursor: Option<String>,
    pub continue_cursor: Option<String>,
    pub is_done: bool,
    pub item_count: usize,
}

impl PageSnapshot {
    pub fn of<T>(index: usize, cursor: Option<&str>, page: &CursorListResult<T>) -> Self {
        Self {
            index,
            cursor: cursor.map(str::to_string),
            continue_cursor: page.continue_cursor().map(str::to_string),
            is_done: page.is_done(),
            item_count: page.len(),
        }
    }
}

/// Same page fetched with the same cursor, but it now ends differently
///
/// Happens when rows are inserted or deleted underneath an unchanged cursor.
/// Different index or cursor means navigation, not a boundary change.
pub fn has_page_boundary_changed(prev: Option<&PageSnapshot>, next: &PageSnapshot) -> bool {
    let Some(prev) = prev else {
        return false;
    };
    if prev.index != next.index || prev.cursor != next.cursor {
        return false;
    }
    prev.continue_cursor != next.continue_cursor
        || prev.is_done != next.is_done
        || prev.item_count != next.item_count
}

/// Both counts known and different
pub fn has_total_count_changed(prev: Option<u64>, next: Option<u64>) -> bool {
    match (prev, next) {
        (Some(prev), Some(next)) => prev != next,
        _ => false,
    }
}
