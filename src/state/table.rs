//! Cursor Table
//!
//! Async driver around [`TableState`]. Issues list/count queries against a
//! [`CursorSource`], hydrates unknown cursors, prefetches neighbours and
//! applies results. Every operation snapshots the query identity before it
//! awaits and drops its results if the identity changed meanwhile.

use super::debounce::Debouncer;
use super::events::TableEvent;
use super::table_state::{HistoryMode, TableState};
use crate::config::TableConfig;
use crate::domain::{CursorListResult, QueryIdentity, SortSpec};
use crate::error::{Error, Result};
use crate::paging::PrefetchCandidate;
use crate::source::{CursorSource, ListArgs};
use ahash::AHashSet;
use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A page position reached by walking the cursor chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReachedPage {
    pub index: usize,
    /// `None` for the first page
    pub cursor: Option<String>,
}

impl ReachedPage {
    fn first() -> Self {
        Self {
            index: 0,
            cursor: None,
        }
    }
}

/// Next move of a hydration walk
enum HydrationStep {
    /// The next cursor is already in the chain
    Known(String),
    /// The page is cached; its continuation (if any) is the next cursor
    Cached(Option<String>),
    Fetch(ListArgs),
    /// The query changed under the walk
    Stale,
}

/// Cloneable handle to a table session
///
/// Clones share the source, the state and the search debouncer.
pub struct CursorTable<S: CursorSource> {
    source: Arc<S>,
    state: Arc<Mutex<TableState<S::Row>>>,
    debouncer: Debouncer,
    request_timeout: Option<Duration>,
}

impl<S: CursorSource> Clone for CursorTable<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            state: Arc::clone(&self.state),
            debouncer: self.debouncer.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

impl<S: CursorSource> CursorTable<S> {
    /// Session on the first page; nothing is fetched until [`refresh`](Self::refresh)
    pub fn new(source: S, config: TableConfig) -> Result<Self> {
        Self::with_query(source, config, "")
    }

    /// Session restored from a query string
    pub fn with_query(source: S, config: TableConfig, query: &str) -> Result<Self> {
        Self::from_shared(Arc::new(source), config, query)
    }

    pub fn from_shared(source: Arc<S>, config: TableConfig, query: &str) -> Result<Self> {
        let debouncer = Debouncer::new(config.search_debounce());
        let request_timeout = config.request_timeout();
        let state = TableState::from_query(config, query)?;

        Ok(Self {
            source,
            state: Arc::new(Mutex::new(state)),
            debouncer,
            request_timeout,
        })
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    /// Inspect the state under the lock
    pub fn read<R>(&self, f: impl FnOnce(&TableState<S::Row>) -> R) -> R {
        f(&self.state.lock())
    }

    fn update<R>(&self, f: impl FnOnce(&mut TableState<S::Row>) -> R) -> R {
        f(&mut self.state.lock())
    }

    pub fn subscribe(&self) -> Receiver<TableEvent> {
        self.update(|s| s.subscribe())
    }

    // ==================== Snapshots ====================

    pub fn rows(&self) -> Vec<S::Row> {
        self.read(|s| s.rows().to_vec())
    }

    pub fn page_index(&self) -> usize {
        self.read(|s| s.page_index())
    }

    pub fn page_count(&self) -> usize {
        self.read(|s| s.page_count())
    }

    pub fn total_count(&self) -> Option<u64> {
        self.read(|s| s.total_count())
    }

    pub fn can_next_page(&self) -> bool {
        self.read(|s| s.can_next_page())
    }

    pub fn can_previous_page(&self) -> bool {
        self.read(|s| s.can_previous_page())
    }

    pub fn is_loading(&self) -> bool {
        self.read(|s| s.is_loading())
    }

    pub fn query_string(&self) -> String {
        self.read(|s| s.query_string())
    }

    // ==================== Requests ====================

    async fn with_timeout<R>(
        &self,
        operation: &str,
        request: impl Future<Output = Result<R>>,
    ) -> Result<R> {
        let Some(limit) = self.request_timeout else {
            return request.await;
        };
        tokio::time::timeout(limit, request)
            .await
            .unwrap_or_else(|_| {
                Err(Error::Timeout {
                    message: format!("{operation} took longer than {limit:?}"),
                })
            })
    }

    async fn fetch_page(&self, args: ListArgs) -> Result<CursorListResult<S::Row>> {
        self.with_timeout("list", self.source.list(args)).await
    }

    /// Load the page the URL names, resolving its cursor first if needed,
    /// together with the row count, then prefetch the neighbours
    pub async fn refresh(&self) -> Result<()> {
        if self.read(|s| s.needs_hydration()) {
            self.resolve_url_page().await?;
            // Superseded while resolving; whoever replaced the URL reloads it
            if self.read(|s| s.needs_hydration()) {
                debug!("Page cursor still unresolved, skipping load");
                return Ok(());
            }
        }

        let (page, count) = futures::join!(self.load_current(), self.refresh_total_count());
        page?;
        if let Err(e) = count {
            warn!("Failed to count rows: {e}");
        }

        self.prefetch().await;
        Ok(())
    }

    /// Fetch the current page and make it visible
    pub async fn load_current(&self) -> Result<()> {
        let (identity, index, cursor, args) = self.update(|s| {
            s.begin_load();
            let cursor = s.current_cursor().map(str::to_string);
            let args = s.list_args(cursor.clone());
            (s.identity().clone(), s.page_index(), cursor, args)
        });

        let result = self.fetch_page(args).await;

        self.update(|s| {
            s.finish_load();
            match result {
                Ok(page) if s.is_identity_current(&identity) => {
                    s.apply_page(index, cursor.as_deref(), page);
                    Ok(())
                }
                Ok(_) => {
                    debug!("Dropping page {} of a superseded query", index + 1);
                    Ok(())
                }
                Err(e) => {
                    warn!("Failed to load page {}: {e}", index + 1);
                    s.set_error(e.to_string());
                    Err(e)
                }
            }
        })
    }

    pub async fn refresh_total_count(&self) -> Result<()> {
        let (identity, args) = self.read(|s| (s.identity().clone(), s.count_args()));
        let total = self
            .with_timeout("count", self.source.count(args))
            .await?;

        self.update(|s| {
            if s.is_identity_current(&identity) {
                s.set_total_count(Some(total));
            } else {
                debug!("Dropping row count of a superseded query");
            }
        });
        Ok(())
    }

    /// Fetch the pages next to the current one in the background
    ///
    /// Failures only cost the speculative fetch and are not reported.
    pub async fn prefetch(&self) {
        let planned = self.read(|s| {
            if !s.config().prefetch {
                return None;
            }
            let plan = |candidate: PrefetchCandidate| {
                let args = s.list_args(candidate.cursor.clone());
                (candidate, args)
            };
            Some((
                s.identity().clone(),
                s.next_prefetch_candidate().map(plan),
                s.previous_prefetch_candidate().map(plan),
            ))
        });
        let Some((identity, next, previous)) = planned else {
            return;
        };

        let (next, previous) =
            futures::join!(self.prefetch_one(next), self.prefetch_one(previous));

        self.update(|s| {
            if !s.is_identity_current(&identity) {
                debug!("Dropping prefetched pages of a superseded query");
                return;
            }
            for (candidate, page) in [next, previous].into_iter().flatten() {
                debug!("Prefetched page {}", candidate.index.saturating_add(1));
                s.store_page(candidate.index, candidate.cursor.as_deref(), page);
            }
        });
    }

    async fn prefetch_one(
        &self,
        planned: Option<(PrefetchCandidate, ListArgs)>,
    ) -> Option<(PrefetchCandidate, CursorListResult<S::Row>)> {
        let (candidate, args) = planned?;
        match self.fetch_page(args).await {
            Ok(page) => Some((candidate, page)),
            Err(e) => {
                debug!(
                    "Prefetch of page {} failed: {e}",
                    candidate.index.saturating_add(1)
                );
                None
            }
        }
    }

    // ==================== Query ====================

    /// Apply a search immediately
    pub async fn set_search(&self, search: impl Into<String>) -> Result<()> {
        let search = search.into();
        if self.update(|s| s.set_search(search)) {
            self.refresh().await?;
        }
        Ok(())
    }

    /// Apply a search once typing pauses for the configured debounce window
    ///
    /// The handle resolves to `false` when a later call superseded this one.
    pub fn search(&self, search: impl Into<String>) -> JoinHandle<bool> {
        let table = self.clone();
        let search = search.into();
        self.debouncer.call(async move {
            if let Err(e) = table.set_search(search).await {
                warn!("Search failed: {e}");
            }
        })
    }

    pub async fn set_filter(&self, key: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        if self.update(|s| s.set_filter(key, value))? {
            self.refresh().await?;
        }
        Ok(())
    }

    pub async fn set_sort(&self, sort: Option<SortSpec>) -> Result<()> {
        if self.update(|s| s.set_sort(sort)) {
            self.refresh().await?;
        }
        Ok(())
    }

    pub async fn toggle_sort(&self, field: &str) -> Result<()> {
        if self.update(|s| s.toggle_sort(field)) {
            self.refresh().await?;
        }
        Ok(())
    }

    pub async fn set_page_size(&self, size: usize) -> Result<()> {
        if self.update(|s| s.set_page_size(size))? {
            self.refresh().await?;
        }
        Ok(())
    }

    // ==================== Navigation ====================

    async fn after_navigation(&self) -> Result<()> {
        self.load_current().await?;
        self.prefetch().await;
        Ok(())
    }

    pub async fn go_first(&self) -> Result<bool> {
        if !self.update(|s| s.go_first()) {
            return Ok(false);
        }
        self.after_navigation().await?;
        Ok(true)
    }

    pub async fn go_next(&self) -> Result<bool> {
        if !self.update(|s| s.go_next()) {
            return Ok(false);
        }
        self.after_navigation().await?;
        Ok(true)
    }

    /// Go back one page, hydrating its cursor when it is not known
    pub async fn go_previous(&self) -> Result<bool> {
        if self.update(|s| s.go_previous_known()) {
            self.after_navigation().await?;
            return Ok(true);
        }
        let Some(target) = self.read(|s| s.page_index().checked_sub(1)) else {
            return Ok(false);
        };

        self.update(|s| s.set_resolving_previous_page(true));
        let result = self.go_to_page(target).await;
        self.update(|s| s.set_resolving_previous_page(false));
        result
    }

    /// Jump to page `index` (0-based)
    ///
    /// Past the end, this lands on the last reachable page.
    pub async fn go_to_page(&self, index: usize) -> Result<bool> {
        let known = self.read(|s| {
            s.cursors()
                .cursor_for(index)
                .map(|cursor| cursor.map(str::to_string))
        });
        let target = match known {
            Some(cursor) => ReachedPage { index, cursor },
            None => match self.hydrate_cursor_path_to_page(index).await? {
                Some(reached) => reached,
                None => return Ok(false),
            },
        };

        if !self.update(|s| s.move_to(target.index, target.cursor, HistoryMode::Push)) {
            return Ok(false);
        }
        self.after_navigation().await?;
        Ok(true)
    }

    /// Jump to the last page
    ///
    /// Errors are logged, not returned; the table stays on the last page it
    /// managed to reach.
    pub async fn go_last(&self) {
        self.update(|s| s.set_jumping_to_last_page(true));
        if let Err(e) = self.jump_to_last_page().await {
            error!("Failed to jump to the last page: {e}");
        }
        self.update(|s| s.set_jumping_to_last_page(false));
    }

    async fn jump_to_last_page(&self) -> Result<()> {
        let (identity, count_args, page_size) =
            self.read(|s| (s.identity().clone(), s.count_args(), s.page_size()));

        let resolved = self
            .with_timeout(
                "resolve_last_page",
                self.source.resolve_last_page(count_args, page_size),
            )
            .await?;

        if let Some(last) = resolved {
            info!(
                "Source resolved the last page as page {}",
                last.page_index.saturating_add(1)
            );
            let moved = self.update(|s| {
                s.is_identity_current(&identity)
                    && s.move_to(last.page_index, last.cursor, HistoryMode::Push)
            });
            if moved {
                self.after_navigation().await?;
            }
            return Ok(());
        }

        let mut reached = self.read(|s| ReachedPage {
            index: s.page_index(),
            cursor: s.current_cursor().map(str::to_string),
        });
        let walk = self.walk_to_last_page(&identity, &mut reached).await;

        let moved = self.update(|s| {
            s.is_identity_current(&identity)
                && s.move_to(reached.index, reached.cursor.clone(), HistoryMode::Push)
        });
        if moved {
            self.after_navigation().await?;
        }
        walk
    }

    /// Follow continuation cursors from `reached` until a page is done
    ///
    /// `reached` always holds the last page that was actually obtained.
    async fn walk_to_last_page(
        &self,
        identity: &QueryIdentity,
        reached: &mut ReachedPage,
    ) -> Result<()> {
        let mut seen: AHashSet<String> = reached.cursor.iter().cloned().collect();
        let mut candidate = reached.clone();
        let mut round_trips = 0usize;

        loop {
            let Some(cached) = self.read(|s| {
                s.is_identity_current(identity)
                    .then(|| s.cache().get(candidate.index).cloned())
            }) else {
                warn!("Query changed while looking for the last page");
                return Ok(());
            };

            let page = match cached {
                Some(page) => page,
                None => {
                    round_trips += 1;
                    let args = self.read(|s| s.list_args(candidate.cursor.clone()));
                    let page = self.fetch_page(args).await?;
                    let stored = self.update(|s| {
                        s.is_identity_current(identity).then(|| {
                            s.store_page(candidate.index, candidate.cursor.as_deref(), page)
                        })
                    });
                    let Some(page) = stored else {
                        warn!("Query changed while looking for the last page");
                        return Ok(());
                    };
                    page
                }
            };
            *reached = candidate.clone();

            let (Some(next), Some(next_index)) = (page.continue_cursor(), reached.index.checked_add(1))
            else {
                break;
            };
            if !seen.insert(next.to_string()) {
                warn!("Cursor {next} repeated after page {next_index}, stopping there");
                break;
            }
            self.update(|s| {
                if s.is_identity_current(identity) {
                    s.record_cursor(next_index, next);
                }
            });
            candidate = ReachedPage {
                index: next_index,
                cursor: Some(next.to_string()),
            };
        }

        debug!(
            "Last page is page {} ({round_trips} round trips)",
            reached.index.saturating_add(1)
        );
        Ok(())
    }

    /// Find the cursor of page `target` by walking forward from the first page
    ///
    /// Known cursors and cached pages are reused. Returns the page actually
    /// reached, which is earlier than `target` when the data ends first, or
    /// `None` if the query changed during the walk.
    pub async fn hydrate_cursor_path_to_page(&self, target: usize) -> Result<Option<ReachedPage>> {
        let identity = self.read(|s| s.identity().clone());
        let mut reached = ReachedPage::first();
        let mut fetches = 0usize;

        while reached.index < target {
            let step = self.read(|s| {
                if !s.is_identity_current(&identity) {
                    return HydrationStep::Stale;
                }
                if let Some(Some(next)) = s.cursors().cursor_for(reached.index + 1) {
                    return HydrationStep::Known(next.to_string());
                }
                match s.cache().get(reached.index) {
                    Some(page) => HydrationStep::Cached(page.continue_cursor().map(str::to_string)),
                    None => HydrationStep::Fetch(s.list_args(reached.cursor.clone())),
                }
            });

            let next = match step {
                HydrationStep::Known(cursor) => Some(cursor),
                HydrationStep::Cached(cursor) => cursor,
                HydrationStep::Stale => return Ok(None),
                HydrationStep::Fetch(args) => {
                    fetches += 1;
                    let page = self.fetch_page(args).await?;
                    let next = page.continue_cursor().map(str::to_string);
                    let current = self.update(|s| {
                        let current = s.is_identity_current(&identity);
                        if current {
                            s.store_page(reached.index, reached.cursor.as_deref(), page);
                        }
                        current
                    });
                    if !current {
                        warn!("Query changed while resolving page {}", target + 1);
                        return Ok(None);
                    }
                    next
                }
            };

            let Some(next) = next else {
                debug!(
                    "Page {} is the last one, page {} does not exist",
                    reached.index + 1,
                    target + 1
                );
                break;
            };
            self.update(|s| {
                if s.is_identity_current(&identity) {
                    s.record_cursor(reached.index + 1, &next);
                }
            });
            reached = ReachedPage {
                index: reached.index + 1,
                cursor: Some(next),
            };
        }

        if !self.read(|s| s.is_identity_current(&identity)) {
            return Ok(None);
        }
        debug!("Resolved page {} with {fetches} fetches", reached.index + 1);
        Ok(Some(reached))
    }

    /// Resolve a URL page that arrived without its cursor
    async fn resolve_url_page(&self) -> Result<()> {
        let target = self.page_index();
        info!("Resolving cursor for page {}", target + 1);

        let Some(reached) = self.hydrate_cursor_path_to_page(target).await? else {
            return Ok(());
        };
        if reached.index < target {
            info!(
                "Page {} is past the end, showing page {}",
                target + 1,
                reached.index + 1
            );
        }
        self.update(|s| s.move_to(reached.index, reached.cursor, HistoryMode::Replace));
        Ok(())
    }

    // ==================== URL ====================

    /// Apply a query string as if it was entered in the address bar
    pub async fn navigate(&self, query: &str) -> Result<()> {
        self.update(|s| s.apply_url(query, HistoryMode::Push));
        self.refresh().await
    }

    pub async fn back(&self) -> Result<bool> {
        if !self.update(|s| s.history_back()) {
            return Ok(false);
        }
        self.refresh().await?;
        Ok(true)
    }

    pub async fn forward(&self) -> Result<bool> {
        if !self.update(|s| s.history_forward()) {
            return Ok(false);
        }
        self.refresh().await?;
        Ok(true)
    }
}

impl<S: CursorSource> std::fmt::Debug for CursorTable<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CursorTable")
            .field("state", &*self.state.lock())
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}
