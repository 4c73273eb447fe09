//! CursorListResult - One page of a cursor-paginated list

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// How a fetched page ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEnd {
    /// More rows follow; resume with this cursor
    Continue(String),
    /// This is the last page
    Done,
}

/// A single page returned by a list query
///
/// The continuation cursor exists exactly when the page is not the last one.
/// On the wire this is `{ items, continueCursor, isDone }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "WireListResult<T>",
    into = "WireListResult<T>",
    bound(
        serialize = "T: Clone + Serialize",
        deserialize = "T: Deserialize<'de>"
    )
)]
pub struct CursorListResult<T> {
    pub items: Vec<T>,
    pub end: PageEnd,
}

impl<T> CursorListResult<T> {
    /// A page followed by more rows
    pub fn page(items: Vec<T>, continue_cursor: impl Into<String>) -> Self {
        Self {
            items,
            end: PageEnd::Continue(continue_cursor.into()),
        }
    }

    /// The final page
    pub fn done(items: Vec<T>) -> Self {
        Self {
            items,
            end: PageEnd::Done,
        }
    }

    pub fn continue_cursor(&self) -> Option<&str> {
        match &self.end {
            PageEnd::Continue(cursor) => Some(cursor),
            PageEnd::Done => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.end, PageEnd::Done)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireListResult<T> {
    items: Vec<T>,
    continue_cursor: Option<String>,
    is_done: bool,
}

impl<T> TryFrom<WireListResult<T>> for CursorListResult<T> {
    type Error = Error;

    fn try_from(wire: WireListResult<T>) -> Result<Self, Self::Error> {
        match (wire.continue_cursor, wire.is_done) {
            (Some(cursor), false) => Ok(Self::page(wire.items, cursor)),
            (None, true) => Ok(Self::done(wire.items)),
            (Some(_), true) => Err(Error::invalid("finished page carries a continuation cursor")),
            (None, false) => Err(Error::invalid("unfinished page has no continuation cursor")),
        }
    }
}

impl<T> From<CursorListResult<T>> for WireListResult<T> {
    fn from(result: CursorListResult<T>) -> Self {
        let (continue_cursor, is_done) = match result.end {
            PageEnd::Continue(cursor) => (Some(cursor), false),
            PageEnd::Done => (None, true),
        };
        Self {
            items: result.items,
            continue_cursor,
            is_done,
        }
    }
}
