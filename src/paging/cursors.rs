//! Cursor Chain
//!
//! Page index -> cursor needed to fetch that page. Cursors are opaque, so the
//! chain only grows by observing continuation cursors of fetched pages.

use std::collections::BTreeMap;

/// Known cursors by page index
///
/// The first page never needs a cursor and is not stored. Any other index
/// missing from the map is unknown, so memory follows the cursors learned
/// rather than the highest page index seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CursorChain {
    cursors: BTreeMap<usize, String>,
}

impl CursorChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor that fetches page `index`
    ///
    /// `Some(None)` for the first page, `Some(Some(cursor))` when known and
    /// `None` when the cursor has not been observed yet.
    pub fn cursor_for(&self, index: usize) -> Option<Option<&str>> {
        if index == 0 {
            return Some(None);
        }
        self.cursors.get(&index).map(|cursor| Some(cursor.as_str()))
    }

    pub fn is_known(&self, index: usize) -> bool {
        self.cursor_for(index).is_some()
    }

    /// Record the cursor of page `index`
    ///
    /// Re-recording the same value keeps the tail; a different value replaces
    /// the tail because every later cursor was derived from the old one.
    pub fn record(&mut self, index: usize, cursor: &str) {
        if index == 0 || self.cursor_for(index) == Some(Some(cursor)) {
            return;
        }
        *self = build_next_page_cursors(self, index, cursor);
    }

    /// Keep only cursors of pages below `end`
    pub fn truncated(&self, end: usize) -> Self {
        let cursors = self
            .cursors
            .range(..end)
            .map(|(index, cursor)| (*index, cursor.clone()))
            .collect();
        Self { cursors }
    }

    /// Number of known cursors, not counting the first page
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    /// Highest page index with a known cursor
    pub fn last_index(&self) -> Option<usize> {
        self.cursors.last_key_value().map(|(index, _)| *index)
    }

    /// Known `(index, cursor)` pairs in ascending page order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.cursors
            .iter()
            .map(|(index, cursor)| (*index, cursor.as_str()))
    }
}

/// Chain where `next_index` holds `cursor` and every later entry is dropped
///
/// Earlier entries are kept; indices between them stay unknown.
pub fn build_next_page_cursors(
    existing: &CursorChain,
    next_index: usize,
    cursor: impl Into<String>,
) -> CursorChain {
    let mut chain = existing.truncated(next_index);
    if next_index > 0 {
        chain.cursors.insert(next_index, cursor.into());
    }
    chain
}
