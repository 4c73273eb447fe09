//! Table Events
//!
//! Notifications emitted by the table state to UI layers. Subscribers receive
//! them over crossbeam channels; a dropped receiver is pruned on next send.

use crossbeam_channel::{Receiver, Sender};

/// Events emitted by a table session
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableEvent {
    /// The URL query string changed
    UrlChanged {
        query: String,
        /// Whether the change created a history entry (vs. replacing one)
        pushed: bool,
    },

    /// The current page's rows were (re)loaded
    PageLoaded {
        page_index: usize,
        item_count: usize,
        is_done: bool,
    },

    /// Query identity changed; pagination restarted at page 1
    PaginationReset,

    /// Cached pages were dropped after a structural change
    CacheInvalidated {
        /// Pages left in the cache
        kept: usize,
    },

    /// The total row count changed or became known
    TotalCountChanged { total: Option<u64> },

    LoadingChanged { loading: bool },

    JumpingToLastPageChanged { active: bool },

    ResolvingPreviousPageChanged { active: bool },
}

/// Fan-out of [`TableEvent`]s to any number of subscribers
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<TableEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    pub fn subscribe(&mut self) -> Receiver<TableEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.subscribers.push(tx);
        rx
    }

    pub fn emit(&mut self, event: TableEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
