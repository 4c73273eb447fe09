//! MemorySource - In-memory cursor source
//!
//! Serves rows held in memory with offset-based cursors. Used by the demo
//! binary and as the backend of the table tests.

use super::{CountArgs, CursorSource, LastPage, ListArgs};
use crate::domain::{CursorListResult, SortDirection};
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Row type servable by [`MemorySource`]
pub trait MemoryRow: Clone + Send + Sync + 'static {
    /// Whether the row matches a free-text search
    fn matches_search(&self, search: &str) -> bool;

    /// Value of a named field, used for filtering and sorting
    fn field(&self, name: &str) -> Option<String>;
}

/// How continuation cursors are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorStyle {
    /// Plain offsets such as `20` (URL-safe)
    Offset,
    /// Index-key tuples such as `[20.5,"k20"]` (need encoding in the URL)
    Opaque,
}

/// Called before every list query; an error fails the query
pub type ListHook = Arc<dyn Fn(&ListArgs) -> Result<()> + Send + Sync>;

pub struct MemorySource<R> {
    rows: RwLock<Vec<R>>,
    cursor_style: CursorStyle,
    /// Filter value that matches every row
    wildcard: String,
    resolves_last_page: bool,
    latency: Option<Duration>,
    list_hook: Option<ListHook>,
    list_calls: AtomicUsize,
    count_calls: AtomicUsize,
}

impl<R: MemoryRow> MemorySource<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows: RwLock::new(rows),
            cursor_style: CursorStyle::Offset,
            wildcard: "all".to_string(),
            resolves_last_page: false,
            latency: None,
            list_hook: None,
            list_calls: AtomicUsize::new(0),
            count_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_cursor_style(mut self, style: CursorStyle) -> Self {
        self.cursor_style = style;
        self
    }

    pub fn with_wildcard(mut self, wildcard: impl Into<String>) -> Self {
        self.wildcard = wildcard.into();
        self
    }

    /// Answer `resolve_last_page` directly instead of forcing a walk
    pub fn with_last_page_resolver(mut self) -> Self {
        self.resolves_last_page = true;
        self
    }

    /// Delay every query by `latency`
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn with_list_hook(mut self, hook: impl Fn(&ListArgs) -> Result<()> + Send + Sync + 'static) -> Self {
        self.list_hook = Some(Arc::new(hook));
        self
    }

    pub fn push(&self, row: R) {
        self.rows.write().push(row);
    }

    pub fn insert(&self, index: usize, row: R) {
        let mut rows = self.rows.write();
        let index = index.min(rows.len());
        rows.insert(index, row);
    }

    /// Remove matching rows, returning how many were removed
    pub fn remove_where(&self, predicate: impl Fn(&R) -> bool) -> usize {
        let mut rows = self.rows.write();
        let before = rows.len();
        rows.retain(|row| !predicate(row));
        before - rows.len()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    /// Rows matching search and filters, in query order
    fn select(&self, args: &CountArgs) -> Vec<R> {
        let search = args.search.trim().to_lowercase();
        let mut rows: Vec<R> = self
            .rows
            .read()
            .iter()
            .filter(|row| search.is_empty() || row.matches_search(&search))
            .filter(|row| {
                args.filters.iter().all(|(key, value)| {
                    *value == self.wildcard || row.field(key).as_deref() == Some(value.as_str())
                })
            })
            .cloned()
            .collect();

        if let Some(sort) = &args.sort_by {
            rows.sort_by(|a, b| {
                let ordering = a.field(&sort.field).cmp(&b.field(&sort.field));
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }
        rows
    }

    fn encode_cursor(&self, offset: usize) -> String {
        match self.cursor_style {
            CursorStyle::Offset => offset.to_string(),
            CursorStyle::Opaque => format!("[{offset}.5,\"k{offset}\"]"),
        }
    }

    fn decode_cursor(&self, cursor: &str) -> Result<usize> {
        let offset = match self.cursor_style {
            CursorStyle::Offset => cursor.parse::<usize>().ok(),
            CursorStyle::Opaque => serde_json::from_str::<(f64, String)>(cursor)
                .ok()
                .map(|(position, _)| position.floor() as usize),
        };
        offset.ok_or_else(|| Error::backend(format!("Unrecognized cursor: {cursor}")))
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl<R: MemoryRow> CursorSource for MemorySource<R> {
    type Row = R;

    async fn list(&self, args: ListArgs) -> Result<CursorListResult<R>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(hook) = &self.list_hook {
            hook(&args)?;
        }
        self.simulate_latency().await;

        if args.page_size == 0 {
            return Err(Error::invalid("page_size must be positive"));
        }
        let offset = match &args.cursor {
            Some(cursor) => self.decode_cursor(cursor)?,
            None => 0,
        };

        let rows = self.select(&CountArgs {
            search: args.search,
            filters: args.filters,
            sort_by: args.sort_by,
        });
        let end = offset.saturating_add(args.page_size).min(rows.len());
        let items = rows.get(offset..end).map(<[R]>::to_vec).unwrap_or_default();

        if end >= rows.len() {
            Ok(CursorListResult::done(items))
        } else {
            Ok(CursorListResult::page(items, self.encode_cursor(end)))
        }
    }

    async fn count(&self, args: CountArgs) -> Result<u64> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        Ok(self.select(&args).len() as u64)
    }

    async fn resolve_last_page(&self, args: CountArgs, page_size: usize) -> Result<Option<LastPage>> {
        if !self.resolves_last_page {
            return Ok(None);
        }
        if page_size == 0 {
            return Err(Error::invalid("page_size must be positive"));
        }
        self.simulate_latency().await;

        let total = self.select(&args).len();
        let page_index = total.saturating_sub(1) / page_size;
        let cursor = (page_index > 0).then(|| self.encode_cursor(page_index * page_size));
        Ok(Some(LastPage { page_index, cursor }))
    }
}

impl<R> std::fmt::Debug for MemorySource<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySource")
            .field("rows", &self.rows.read().len())
            .field("cursor_style", &self.cursor_style)
            .field("resolves_last_page", &self.resolves_last_page)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SortSpec;
    use std::collections::BTreeMap;

    #[derive(Clone, Debug, PartialEq)]
    struct Item {
        id: usize,
        kind: &'static str,
    }

    impl MemoryRow for Item {
        fn matches_search(&self, search: &str) -> bool {
            self.kind.contains(search)
        }

        fn field(&self, name: &str) -> Option<String> {
            match name {
                "id" => Some(format!("{:04}", self.id)),
                "kind" => Some(self.kind.to_string()),
                _ => None,
            }
        }
    }

    fn source() -> MemorySource<Item> {
        MemorySource::new(
            (0..25)
                .map(|id| Item {
                    id,
                    kind: if id % 2 == 0 { "even" } else { "odd" },
                })
                .collect(),
        )
    }

    fn args(cursor: Option<&str>) -> ListArgs {
        ListArgs {
            cursor: cursor.map(str::to_string),
            page_size: 10,
            search: String::new(),
            filters: BTreeMap::new(),
            sort_by: None,
        }
    }

    #[tokio::test]
    async fn test_offset_pages() {
        let source = source();
        let first = source.list(args(None)).await.expect("first page");
        assert_eq!(first.continue_cursor(), Some("10"));
        assert_eq!(first.len(), 10);

        let last = source.list(args(Some("20"))).await.expect("last page");
        assert!(last.is_done());
        assert_eq!(last.len(), 5);
        assert_eq!(source.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_filters_and_sort() {
        let source = source();
        let mut list_args = args(None);
        list_args.filters.insert("kind".into(), "odd".into());
        list_args.sort_by = Some(SortSpec::desc("id"));

        let page = source.list(list_args).await.expect("page");
        assert_eq!(page.items.first().map(|i| i.id), Some(23));
        assert!(page.items.iter().all(|i| i.kind == "odd"));

        let wildcard = CountArgs {
            search: String::new(),
            filters: BTreeMap::from([("kind".to_string(), "all".to_string())]),
            sort_by: None,
        };
        assert_eq!(source.count(wildcard).await.expect("count"), 25);
    }

    #[tokio::test]
    async fn test_opaque_cursors() {
        let source = source().with_cursor_style(CursorStyle::Opaque);
        let first = source.list(args(None)).await.expect("first page");
        let cursor = first.continue_cursor().expect("cursor").to_string();
        assert_eq!(cursor, r#"[10.5,"k10"]"#);
        let second = source.list(args(Some(&cursor))).await.expect("second page");
        assert_eq!(second.items.first().map(|i| i.id), Some(10));
    }

    #[tokio::test]
    async fn test_cursor_past_end_is_empty_last_page() {
        let source = source();
        let page = source
            .list(args(Some("18446744073709551615")))
            .await
            .expect("page");
        assert!(page.is_done());
        assert_eq!(page.len(), 0);

        let page = source.list(args(Some("30"))).await.expect("page");
        assert!(page.is_done());
        assert_eq!(page.len(), 0);
    }

    #[tokio::test]
    async fn test_bad_cursor_fails() {
        assert!(source().list(args(Some("nope"))).await.is_err());
    }

    #[tokio::test]
    async fn test_last_page_resolver() {
        let counts = CountArgs {
            search: String::new(),
            filters: BTreeMap::new(),
            sort_by: None,
        };
        assert_eq!(source().resolve_last_page(counts.clone(), 10).await.expect("ok"), None);

        let last = source()
            .with_last_page_resolver()
            .resolve_last_page(counts, 10)
            .await
            .expect("ok");
        assert_eq!(
            last,
            Some(LastPage {
                page_index: 2,
                cursor: Some("20".into())
            })
        );
    }
}
