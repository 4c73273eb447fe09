//! URL State
//!
//! The canonical table parameters as they live in the query string. This is
//! the single source of truth for the current page; caches and cursor chains
//! are derived from it.

use super::codec::{
    parse_cursor_param, parse_positive_param, parse_sort_param, serialize_cursor_param,
    serialize_sort_param,
};
use crate::config::TableConfig;
use crate::constants::{PARAM_CURSOR, PARAM_PAGE, PARAM_PAGE_SIZE, PARAM_SEARCH, PARAM_SORT};
use crate::domain::{QueryIdentity, SortSpec};
use std::collections::BTreeMap;
use url::form_urlencoded;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlState {
    pub search: String,
    pub sort: Option<SortSpec>,
    /// 1-based page number
    pub page: usize,
    pub page_size: usize,
    /// Cursor that fetches `page`; never set on page 1
    pub cursor: Option<String>,
    pub filters: BTreeMap<String, String>,
}

/// Result of reading a query string
#[derive(Debug, Clone)]
pub struct ParsedUrl {
    pub state: UrlState,
    /// A `cursor` parameter was present but could not be decoded
    pub malformed_cursor: bool,
}

impl UrlState {
    /// First page with every parameter at its default
    pub fn initial(config: &TableConfig) -> Self {
        Self {
            search: String::new(),
            sort: None,
            page: 1,
            page_size: config.default_page_size,
            cursor: None,
            filters: config.default_filters(),
        }
    }

    /// Read a query string (with or without the leading `?`)
    ///
    /// Unknown parameters are ignored; invalid values fall back to defaults.
    pub fn parse(query: &str, config: &TableConfig) -> ParsedUrl {
        let mut state = Self::initial(config);
        let mut malformed_cursor = false;
        let query = query.strip_prefix('?').unwrap_or(query);

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                PARAM_SEARCH => state.search = value.into_owned(),
                PARAM_SORT => state.sort = parse_sort_param(&value),
                PARAM_PAGE => state.page = parse_positive_param(&value).unwrap_or(1),
                PARAM_PAGE_SIZE => {
                    state.page_size = parse_positive_param(&value)
                        .filter(|size| config.accepts_page_size(*size))
                        .unwrap_or(config.default_page_size);
                }
                PARAM_CURSOR => {
                    state.cursor = parse_cursor_param(&value);
                    malformed_cursor = !value.is_empty() && state.cursor.is_none();
                }
                other => {
                    if config.filter_spec(other).is_some() {
                        state.filters.insert(other.to_string(), value.into_owned());
                    }
                }
            }
        }

        if state.page == 1 {
            state.cursor = None;
        }

        ParsedUrl {
            state,
            malformed_cursor,
        }
    }

    /// 0-based index of the current page
    pub fn page_index(&self) -> usize {
        self.page.saturating_sub(1)
    }

    /// Snapshot of the inputs that select the result set
    pub fn identity(&self) -> QueryIdentity {
        QueryIdentity {
            search: self.search.clone(),
            page_size: self.page_size,
            filters: self.filters.clone(),
            sort_by: self.sort.clone(),
        }
    }

    /// Parameters as written to the URL, in canonical order
    ///
    /// Empty search, missing sort/cursor and filters at their default are omitted.
    pub fn params(&self, config: &TableConfig) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if !self.search.is_empty() {
            params.push((PARAM_SEARCH.to_string(), self.search.clone()));
        }
        if let Some(sort) = &self.sort {
            params.push((PARAM_SORT.to_string(), serialize_sort_param(sort)));
        }
        params.push((PARAM_PAGE.to_string(), self.page.to_string()));
        params.push((PARAM_PAGE_SIZE.to_string(), self.page_size.to_string()));
        if let Some(cursor) = &self.cursor {
            params.push((PARAM_CURSOR.to_string(), serialize_cursor_param(cursor)));
        }
        for spec in &config.filters {
            match self.filters.get(&spec.key) {
                Some(value) if *value != spec.default => {
                    params.push((spec.key.clone(), value.clone()));
                }
                _ => {}
            }
        }
        params
    }

    /// Value of a single parameter as it appears in the URL
    pub fn param(&self, name: &str, config: &TableConfig) -> Option<String> {
        self.params(config)
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Serialize to a query string without the leading `?`
    pub fn to_query_string(&self, config: &TableConfig) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params(config))
            .finish()
    }
}
