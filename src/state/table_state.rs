//! Table State
//!
//! Synchronous state machine behind a cursor-paginated table: URL state, page
//! cache, cursor chain, query identity snapshot and loading flags. Derived
//! values (`rows`, `page_count`, ...) are computed on demand. All I/O lives in
//! [`CursorTable`](super::CursorTable); this type only applies results.

use super::events::{EventBus, TableEvent};
use crate::config::TableConfig;
use crate::domain::{CursorListResult, QueryIdentity, SortDirection, SortSpec, has_query_identity_changed};
use crate::error::{Error, Result};
use crate::paging::{
    CachedPage, CursorChain, PageCache, PageSnapshot, PrefetchCandidate,
    get_next_prefetch_candidate, get_previous_prefetch_candidate, has_page_boundary_changed,
    has_total_count_changed,
};
use crate::query::{UrlHistory, UrlState};
use crate::source::{CountArgs, ListArgs};
use crossbeam_channel::Receiver;
use std::sync::Arc;
use tracing::{debug, info};

/// How a URL change is recorded in the session history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    /// New history entry
    Push,
    /// Overwrite the current entry
    Replace,
    /// The history already points at the new URL (back/forward)
    Keep,
}

/// State of a single table session
pub struct TableState<T> {
    config: TableConfig,
    /// Single source of truth for the current page
    url: UrlState,
    /// Identity of the result set the cache and chain belong to
    identity: QueryIdentity,
    cache: PageCache<T>,
    cursors: CursorChain,
    /// Rows on screen; may come from the cache before the fetch completes
    current: Option<CachedPage<T>>,
    /// Shape of the last fetched current page
    current_snapshot: Option<PageSnapshot>,
    total_count: Option<u64>,
    /// Page loads started and not yet finished
    loads_in_flight: usize,
    is_jumping_to_last_page: bool,
    is_resolving_previous_page: bool,
    last_error: Option<Arc<str>>,
    history: UrlHistory,
    events: EventBus,
}

impl<T> TableState<T> {
    /// Fresh session on the first page
    pub fn new(config: TableConfig) -> Result<Self> {
        config.validate()?;
        let url = UrlState::initial(&config);
        let identity = url.identity();
        let history = UrlHistory::new(url.to_query_string(&config));

        Ok(Self {
            config,
            url,
            identity,
            cache: PageCache::new(),
            cursors: CursorChain::new(),
            current: None,
            current_snapshot: None,
            total_count: None,
            loads_in_flight: 0,
            is_jumping_to_last_page: false,
            is_resolving_previous_page: false,
            last_error: None,
            history,
            events: EventBus::new(),
        })
    }

    /// Session restored from a query string (page load, bookmark, shared link)
    pub fn from_query(config: TableConfig, query: &str) -> Result<Self> {
        let mut state = Self::new(config)?;
        state.apply_url(query, HistoryMode::Replace);
        Ok(state)
    }

    // ==================== Getters ====================

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn url(&self) -> &UrlState {
        &self.url
    }

    /// Current query string, without the leading `?`
    pub fn query_string(&self) -> String {
        self.url.to_query_string(&self.config)
    }

    /// A single URL parameter as it appears in the query string
    pub fn url_param(&self, name: &str) -> Option<String> {
        self.url.param(name, &self.config)
    }

    /// Identity snapshot the cache and cursor chain belong to
    pub fn identity(&self) -> &QueryIdentity {
        &self.identity
    }

    /// Whether a snapshot taken before an await still describes this session
    pub fn is_identity_current(&self, snapshot: &QueryIdentity) -> bool {
        !has_query_identity_changed(snapshot, &self.identity)
    }

    pub fn page_index(&self) -> usize {
        self.url.page_index()
    }

    pub fn page_size(&self) -> usize {
        self.url.page_size
    }

    /// Cursor that fetches the current page
    pub fn current_cursor(&self) -> Option<&str> {
        self.url.cursor.as_deref()
    }

    pub fn current_page(&self) -> Option<&CachedPage<T>> {
        self.current.as_ref()
    }

    pub fn rows(&self) -> &[T] {
        self.current
            .as_ref()
            .map(|page| page.items.as_slice())
            .unwrap_or(&[])
    }

    /// Number of pages, exact when the total is known
    ///
    /// Without a total this is the number of pages known to exist: up to the
    /// current one, plus one more if the current page continues.
    pub fn page_count(&self) -> usize {
        match self.total_count {
            Some(total) => {
                let size = self.url.page_size.max(1) as u64;
                (total.div_ceil(size) as usize).max(1)
            }
            None => {
                let more = usize::from(self.can_next_page());
                self.page_index().saturating_add(1).saturating_add(more)
            }
        }
    }

    pub fn can_next_page(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|page| page.continue_cursor().is_some())
    }

    pub fn can_previous_page(&self) -> bool {
        self.page_index() > 0
    }

    pub fn total_count(&self) -> Option<u64> {
        self.total_count
    }

    pub fn is_loading(&self) -> bool {
        self.loads_in_flight > 0
    }

    pub fn is_jumping_to_last_page(&self) -> bool {
        self.is_jumping_to_last_page
    }

    pub fn is_resolving_previous_page(&self) -> bool {
        self.is_resolving_previous_page
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn cache(&self) -> &PageCache<T> {
        &self.cache
    }

    pub fn cursors(&self) -> &CursorChain {
        &self.cursors
    }

    pub fn history(&self) -> &UrlHistory {
        &self.history
    }

    /// The URL names a page whose cursor is unknown
    pub fn needs_hydration(&self) -> bool {
        self.page_index() > 0 && self.url.cursor.is_none()
    }

    /// Arguments for fetching a page of the current query
    pub fn list_args(&self, cursor: Option<String>) -> ListArgs {
        ListArgs::new(&self.identity, cursor)
    }

    pub fn count_args(&self) -> CountArgs {
        CountArgs::from(&self.identity)
    }

    pub fn next_prefetch_candidate(&self) -> Option<PrefetchCandidate> {
        get_next_prefetch_candidate(
            self.page_index(),
            self.current.as_deref(),
            &self.cache,
        )
    }

    pub fn previous_prefetch_candidate(&self) -> Option<PrefetchCandidate> {
        get_previous_prefetch_candidate(self.page_index(), &self.cursors, &self.cache)
    }

    pub fn subscribe(&mut self) -> Receiver<TableEvent> {
        self.events.subscribe()
    }

    // ==================== Query Setters ====================

    /// Change the search text; returns whether pagination was reset
    pub fn set_search(&mut self, search: impl Into<String>) -> bool {
        let search = search.into();
        if self.url.search == search {
            return false;
        }
        self.url.search = search;
        self.apply_query_change()
    }

    /// Change a configured filter; unknown keys are rejected
    pub fn set_filter(&mut self, key: &str, value: impl Into<String>) -> Result<bool> {
        if self.config.filter_spec(key).is_none() {
            return Err(Error::invalid(format!("unknown filter key '{key}'")));
        }
        let value = value.into();
        if self.url.filters.get(key) == Some(&value) {
            return Ok(false);
        }
        self.url.filters.insert(key.to_string(), value);
        Ok(self.apply_query_change())
    }

    pub fn set_sort(&mut self, sort: Option<SortSpec>) -> bool {
        if self.url.sort == sort {
            return false;
        }
        self.url.sort = sort;
        self.apply_query_change()
    }

    /// Cycle a column through ascending, descending and unsorted
    pub fn toggle_sort(&mut self, field: &str) -> bool {
        let next = match &self.url.sort {
            Some(sort) if sort.field == field => match sort.direction {
                SortDirection::Asc => Some(SortSpec::desc(field)),
                SortDirection::Desc => None,
            },
            _ => Some(SortSpec::asc(field)),
        };
        self.set_sort(next)
    }

    pub fn set_page_size(&mut self, size: usize) -> Result<bool> {
        if !self.config.accepts_page_size(size) {
            return Err(Error::invalid(format!("unsupported page size {size}")));
        }
        if self.url.page_size == size {
            return Ok(false);
        }
        self.url.page_size = size;
        Ok(self.apply_query_change())
    }

    fn apply_query_change(&mut self) -> bool {
        let reset = self.sync_identity();
        self.commit_url(HistoryMode::Push);
        reset
    }

    /// Reset pagination if the URL now describes another result set
    pub fn sync_identity(&mut self) -> bool {
        if !has_query_identity_changed(&self.identity, &self.url.identity()) {
            return false;
        }
        self.reset_pagination();
        true
    }

    /// Back to page 1 with an empty cache and cursor chain
    pub fn reset_pagination(&mut self) {
        info!("Query changed, resetting pagination");
        self.url.page = 1;
        self.url.cursor = None;
        self.discard_pages();
        self.identity = self.url.identity();
        self.events.emit(TableEvent::PaginationReset);
    }

    fn discard_pages(&mut self) {
        self.cache.clear();
        self.cursors = CursorChain::new();
        self.current = None;
        self.current_snapshot = None;
    }

    // ==================== Navigation ====================

    /// Move the URL to `index`, showing a cached copy of the page if present
    ///
    /// The page being left is cached first.
    pub fn move_to(&mut self, index: usize, cursor: Option<String>, mode: HistoryMode) -> bool {
        let cursor = if index == 0 { None } else { cursor };
        let Some(page) = index.checked_add(1) else {
            return false;
        };
        if self.page_index() == index && self.url.cursor == cursor {
            return false;
        }

        self.cache_current();
        if let Some(cursor) = &cursor {
            self.cursors.record(index, cursor);
        }
        self.url.page = page;
        self.url.cursor = cursor;
        self.current = self.cache.get(index).cloned();
        debug!("Moved to page {page}");
        self.commit_url(mode);
        true
    }

    fn cache_current(&mut self) {
        if let Some(page) = self.current.clone() {
            self.cache.cache_page(
                self.page_index(),
                page,
                self.page_index(),
                self.config.max_cached_pages,
            );
        }
    }

    pub fn go_first(&mut self) -> bool {
        self.move_to(0, None, HistoryMode::Push)
    }

    /// Advance one page; only possible when the current page continues
    pub fn go_next(&mut self) -> bool {
        let Some(next_cursor) = self
            .current
            .as_ref()
            .and_then(|page| page.continue_cursor())
            .map(str::to_string)
        else {
            return false;
        };

        let next_index = self.page_index() + 1;
        self.move_to(next_index, Some(next_cursor), HistoryMode::Push)
    }

    /// Go back one page when its cursor is already known
    ///
    /// Returns `false` on the first page or when the cursor must be hydrated.
    pub fn go_previous_known(&mut self) -> bool {
        let Some(index) = self.page_index().checked_sub(1) else {
            return false;
        };
        let Some(cursor) = self.cursors.cursor_for(index).map(|c| c.map(str::to_string)) else {
            return false;
        };

        self.move_to(index, cursor, HistoryMode::Push)
    }

    // ==================== Results ====================

    /// Apply a freshly fetched page
    ///
    /// If it is the current page, it becomes visible and is checked for a
    /// boundary change; otherwise it is only cached.
    pub fn apply_page(&mut self, index: usize, cursor: Option<&str>, page: CursorListResult<T>) {
        let is_current = index == self.page_index() && cursor == self.current_cursor();
        if !is_current {
            self.store_page(index, cursor, page);
            return;
        }

        let snapshot = PageSnapshot::of(index, cursor, &page);
        let page = Arc::new(page);

        if has_page_boundary_changed(self.current_snapshot.as_ref(), &snapshot) {
            info!(
                "Page {} changed under its cursor, rebuilding from it",
                index.saturating_add(1)
            );
            self.cache.clear();
            self.cache.insert(index, Arc::clone(&page));
            self.cursors = self.cursors.truncated(index.saturating_add(1));
            self.events.emit(TableEvent::CacheInvalidated { kept: 1 });
        } else {
            self.cache.cache_page(
                index,
                Arc::clone(&page),
                index,
                self.config.max_cached_pages,
            );
        }

        if let Some(cursor) = cursor {
            self.cursors.record(index, cursor);
        }
        if let (Some(next), Some(next_index)) = (page.continue_cursor(), index.checked_add(1)) {
            self.cursors.record(next_index, next);
        }

        self.events.emit(TableEvent::PageLoaded {
            page_index: index,
            item_count: page.len(),
            is_done: page.is_done(),
        });
        self.current = Some(page);
        self.current_snapshot = Some(snapshot);
        self.last_error = None;
    }

    /// Cache a page fetched off-screen (prefetch, hydration, last-page walk)
    ///
    /// The page's continuation extends the cursor chain when the cursor it
    /// was fetched with matches the chain.
    pub fn store_page(
        &mut self,
        index: usize,
        cursor: Option<&str>,
        page: CursorListResult<T>,
    ) -> CachedPage<T> {
        let page = Arc::new(page);
        if self.cursors.cursor_for(index) == Some(cursor) {
            if let (Some(next), Some(next_index)) = (page.continue_cursor(), index.checked_add(1)) {
                self.cursors.record(next_index, next);
            }
        }
        self.cache.cache_page(
            index,
            Arc::clone(&page),
            self.page_index(),
            self.config.max_cached_pages,
        );
        page
    }

    /// Record a cursor learned while walking
    pub fn record_cursor(&mut self, index: usize, cursor: &str) {
        self.cursors.record(index, cursor);
    }

    /// Apply a new total row count
    ///
    /// A change between two known counts keeps only the current page cached.
    pub fn set_total_count(&mut self, total: Option<u64>) {
        if has_total_count_changed(self.total_count, total) {
            info!(
                "Total count changed from {:?} to {:?}, trimming cache",
                self.total_count, total
            );
            self.cache.retain_only(self.page_index());
            self.events.emit(TableEvent::CacheInvalidated {
                kept: self.cache.len(),
            });
        }
        if self.total_count != total {
            self.total_count = total;
            self.events.emit(TableEvent::TotalCountChanged { total });
        }
    }

    pub fn set_error(&mut self, message: impl Into<Arc<str>>) {
        self.last_error = Some(message.into());
    }

    // ==================== Flags ====================

    /// Count a page load as started
    ///
    /// `is_loading` turns on with the first of overlapping loads.
    pub fn begin_load(&mut self) {
        self.loads_in_flight += 1;
        if self.loads_in_flight == 1 {
            self.events.emit(TableEvent::LoadingChanged { loading: true });
        }
    }

    /// Count a page load as finished
    ///
    /// `is_loading` turns off only once every started load has finished.
    pub fn finish_load(&mut self) {
        let Some(remaining) = self.loads_in_flight.checked_sub(1) else {
            return;
        };
        self.loads_in_flight = remaining;
        if remaining == 0 {
            self.events.emit(TableEvent::LoadingChanged { loading: false });
        }
    }

    pub fn set_jumping_to_last_page(&mut self, active: bool) {
        if self.is_jumping_to_last_page != active {
            self.is_jumping_to_last_page = active;
            self.events.emit(TableEvent::JumpingToLastPageChanged { active });
        }
    }

    pub fn set_resolving_previous_page(&mut self, active: bool) {
        if self.is_resolving_previous_page != active {
            self.is_resolving_previous_page = active;
            self.events
                .emit(TableEvent::ResolvingPreviousPageChanged { active });
        }
    }

    // ==================== URL Sync ====================

    /// Adopt a query string as the new URL state
    ///
    /// A malformed cursor resets pagination. A different query identity
    /// drops the cache and chain but keeps the page the URL names, since its
    /// cursor was issued for that query.
    pub fn apply_url(&mut self, query: &str, mode: HistoryMode) {
        let parsed = UrlState::parse(query, &self.config);
        self.url = parsed.state;

        if parsed.malformed_cursor {
            info!("Discarding malformed cursor from URL");
            self.reset_pagination();
            self.commit_url(HistoryMode::Replace);
            return;
        }

        if has_query_identity_changed(&self.identity, &self.url.identity()) {
            self.discard_pages();
            self.identity = self.url.identity();
            self.events.emit(TableEvent::PaginationReset);
        }

        if let Some(cursor) = self.url.cursor.clone() {
            self.cursors.record(self.page_index(), &cursor);
        }
        self.current = self.cache.get(self.page_index()).cloned();
        self.commit_url(mode);
    }

    /// Step back in the session history and apply that URL
    pub fn history_back(&mut self) -> bool {
        let Some(query) = self.history.back().map(str::to_string) else {
            return false;
        };
        self.apply_url(&query, HistoryMode::Keep);
        true
    }

    /// Step forward in the session history and apply that URL
    pub fn history_forward(&mut self) -> bool {
        let Some(query) = self.history.forward().map(str::to_string) else {
            return false;
        };
        self.apply_url(&query, HistoryMode::Keep);
        true
    }

    fn commit_url(&mut self, mode: HistoryMode) {
        let query = self.query_string();
        match mode {
            HistoryMode::Push => self.history.push(query.clone()),
            HistoryMode::Replace => self.history.replace(query.clone()),
            HistoryMode::Keep => {}
        }
        self.events.emit(TableEvent::UrlChanged {
            query,
            pushed: mode == HistoryMode::Push,
        });
    }
}

impl<T> std::fmt::Debug for TableState<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableState")
            .field("url", &self.url)
            .field("cached_pages", &self.cache.len())
            .field("cursors", &self.cursors.len())
            .field("total_count", &self.total_count)
            .field("loads_in_flight", &self.loads_in_flight)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{PARAM_CURSOR, PARAM_PAGE};

    fn config() -> TableConfig {
        TableConfig::default().with_filter("role", "all")
    }

    fn rows(start: u32) -> Vec<u32> {
        (start..start + 10).collect()
    }

    /// State sitting on page `pages` of a walk through pages c1..cN
    fn walked(pages: usize) -> TableState<u32> {
        let mut state = TableState::new(config()).expect("state");
        for index in 0..pages {
            let cursor = state.current_cursor().map(str::to_string);
            let page = CursorListResult::page(rows(index as u32 * 10), format!("c{}", index + 1));
            state.apply_page(index, cursor.as_deref(), page);
            if index + 1 < pages {
                assert!(state.go_next());
            }
        }
        state
    }

    #[test]
    fn test_go_next_extends_chain_and_url() {
        let mut state = TableState::new(config()).expect("state");
        assert_eq!(
            state.identity().canonical(),
            r#"{"search":"","pageSize":10,"filters":{"role":"all"},"sortBy":null}"#
        );

        state.apply_page(0, None, CursorListResult::page(rows(0), "c1"));
        assert!(state.go_next());

        assert_eq!(state.cursors().iter().collect::<Vec<_>>(), vec![(1, "c1")]);
        assert_eq!(state.url_param(PARAM_PAGE).as_deref(), Some("2"));
        assert_eq!(state.url_param(PARAM_CURSOR).as_deref(), Some("c1"));
    }

    #[test]
    fn test_go_next_requires_continuation() {
        let mut state = TableState::new(config()).expect("state");
        assert!(!state.go_next());
        state.apply_page(0, None, CursorListResult::done(rows(0)));
        assert!(!state.go_next());
        assert!(!state.can_next_page());
    }

    #[test]
    fn test_search_change_resets_pagination() {
        let mut state = walked(3);
        assert_eq!(state.page_index(), 2);
        assert!(!state.cache().is_empty());

        assert!(state.set_search("ada"));
        assert_eq!(state.url_param(PARAM_PAGE).as_deref(), Some("1"));
        assert_eq!(state.url_param(PARAM_CURSOR), None);
        assert!(state.cache().is_empty());
        assert!(state.cursors().is_empty());
        assert!(state.rows().is_empty());
    }

    #[test]
    fn test_unchanged_search_is_noop() {
        let mut state = walked(2);
        assert!(!state.set_search(""));
        assert_eq!(state.page_index(), 1);
    }

    #[test]
    fn test_filter_and_sort_reset() {
        let mut state = walked(2);
        assert!(state.set_filter("role", "admin").expect("known key"));
        assert_eq!(state.page_index(), 0);
        assert!(state.set_filter("missing", "x").is_err());

        let mut state = walked(2);
        assert!(state.toggle_sort("email"));
        assert_eq!(state.url().sort, Some(SortSpec::asc("email")));
        assert_eq!(state.page_index(), 0);
        state.toggle_sort("email");
        assert_eq!(state.url().sort, Some(SortSpec::desc("email")));
        state.toggle_sort("email");
        assert_eq!(state.url().sort, None);
    }

    #[test]
    fn test_page_size_validated() {
        let mut state = walked(2);
        assert!(state.set_page_size(7).is_err());
        assert!(state.set_page_size(20).expect("accepted"));
        assert_eq!(state.page_index(), 0);
    }

    #[test]
    fn test_go_previous_known_and_first() {
        let mut state = walked(3);
        assert!(state.go_previous_known());
        assert_eq!(state.page_index(), 1);
        assert_eq!(state.current_cursor(), Some("c1"));
        assert_eq!(state.rows().first(), Some(&10));

        assert!(state.go_first());
        assert_eq!(state.page_index(), 0);
        assert_eq!(state.current_cursor(), None);
        assert!(!state.go_previous_known());
    }

    #[test]
    fn test_boundary_change_rebuilds_from_current() {
        let mut state = walked(3);
        state.go_previous_known();
        state.apply_page(1, Some("c1"), CursorListResult::page(rows(10), "c2"));
        assert!(state.cache().len() > 1);

        // Same page, same cursor, but a row was deleted underneath
        state.apply_page(1, Some("c1"), CursorListResult::page(rows(11), "c2x"));
        assert_eq!(state.cache().indices().collect::<Vec<_>>(), vec![1]);
        assert_eq!(
            state.cursors().iter().collect::<Vec<_>>(),
            vec![(1, "c1"), (2, "c2x")]
        );
        assert_eq!(state.page_index(), 1);
    }

    #[test]
    fn test_total_count_change_trims_cache() {
        let mut state = walked(3);
        state.set_total_count(Some(30));
        let cached = state.cache().len();
        assert!(cached > 1);
        assert_eq!(state.page_count(), 3);

        state.set_total_count(Some(31));
        assert_eq!(state.cache().indices().collect::<Vec<_>>(), vec![2]);
        assert_eq!(state.page_count(), 4);

        state.set_total_count(None);
        assert_eq!(state.cache().len(), 1);
    }

    #[test]
    fn test_page_count_without_total() {
        let mut state = TableState::new(config()).expect("state");
        assert_eq!(state.page_count(), 1);
        state.apply_page(0, None, CursorListResult::page(rows(0), "c1"));
        assert_eq!(state.page_count(), 2);
    }

    #[test]
    fn test_stale_page_only_cached() {
        let mut state = walked(1);
        state.apply_page(4, Some("c4"), CursorListResult::done(rows(40)));
        assert_eq!(state.page_index(), 0);
        assert!(state.cache().contains(4));
        assert_eq!(state.rows().first(), Some(&0));
    }

    #[test]
    fn test_from_query_restores_page() {
        let state = TableState::<u32>::from_query(config(), "page=3&cursor=c2&role=admin")
            .expect("state");
        assert_eq!(state.page_index(), 2);
        assert_eq!(state.cursors().cursor_for(2), Some(Some("c2")));
        assert!(!state.needs_hydration());

        let state = TableState::<u32>::from_query(config(), "page=3").expect("state");
        assert!(state.needs_hydration());
    }

    #[test]
    fn test_from_query_huge_page_keeps_one_cursor() {
        let state = TableState::<u32>::from_query(
            TableConfig::default(),
            "page=18446744073709551615&cursor=abc",
        )
        .expect("state");
        assert_eq!(state.page_index(), usize::MAX - 1);
        assert_eq!(state.cursors().len(), 1);
        assert_eq!(state.cursors().cursor_for(usize::MAX - 1), Some(Some("abc")));
        assert!(!state.needs_hydration());
    }

    #[test]
    fn test_last_representable_page_does_not_overflow() {
        let mut state = TableState::<u32>::from_query(
            TableConfig::default(),
            "page=18446744073709551615&cursor=abc",
        )
        .expect("state");
        let index = state.page_index();
        state.apply_page(index, Some("abc"), CursorListResult::page(rows(0), "next"));
        assert_eq!(state.cursors().cursor_for(usize::MAX), Some(Some("next")));

        state.store_page(usize::MAX, Some("next"), CursorListResult::page(rows(10), "beyond"));
        assert_eq!(state.cursors().len(), 2);
        // Page usize::MAX + 1 has no URL representation
        assert!(!state.go_next());
        assert_eq!(state.page_index(), usize::MAX - 1);
        assert_eq!(state.page_count(), usize::MAX);
    }

    #[test]
    fn test_overlapping_loads_keep_loading() {
        let mut state = TableState::<u32>::new(config()).expect("state");
        let rx = state.subscribe();

        state.begin_load();
        state.begin_load();
        state.finish_load();
        assert!(state.is_loading());
        state.finish_load();
        assert!(!state.is_loading());
        state.finish_load();
        assert!(!state.is_loading());

        let loading: Vec<TableEvent> = rx
            .try_iter()
            .filter(|e| matches!(e, TableEvent::LoadingChanged { .. }))
            .collect();
        assert_eq!(
            loading,
            vec![
                TableEvent::LoadingChanged { loading: true },
                TableEvent::LoadingChanged { loading: false },
            ]
        );
    }

    #[test]
    fn test_malformed_cursor_resets() {
        let state = TableState::<u32>::from_query(config(), "page=4&cursor=b64.%25%25")
            .expect("state");
        assert_eq!(state.page_index(), 0);
        assert_eq!(state.query_string(), "page=1&page_size=10");
    }

    #[test]
    fn test_history_back_restores_url() {
        let mut state = walked(3);
        assert!(state.history_back());
        assert_eq!(state.page_index(), 1);
        assert_eq!(state.current_cursor(), Some("c1"));
        assert!(state.history_forward());
        assert_eq!(state.page_index(), 2);
    }

    #[test]
    fn test_events_emitted() {
        let mut state = TableState::new(config()).expect("state");
        let rx = state.subscribe();
        state.apply_page(0, None, CursorListResult::page(rows(0), "c1"));
        state.go_next();

        let events: Vec<TableEvent> = rx.try_iter().collect();
        assert!(events.contains(&TableEvent::PageLoaded {
            page_index: 0,
            item_count: 10,
            is_done: false
        }));
        assert!(events.iter().any(|e| matches!(e, TableEvent::UrlChanged { pushed: true, .. })));
    }

    #[test]
    fn test_prefetch_candidates() {
        let mut state = walked(2);
        assert_eq!(
            state.next_prefetch_candidate(),
            Some(PrefetchCandidate {
                index: 2,
                cursor: Some("c2".into())
            })
        );
        // Page 0 was cached on the way forward
        assert_eq!(state.previous_prefetch_candidate(), None);

        state.apply_page(1, Some("c1"), CursorListResult::done(rows(10)));
        assert_eq!(state.next_prefetch_candidate(), None);
    }
}
