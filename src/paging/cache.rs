//! Page Cache
//!
//! Last-seen result per page index, bounded by keeping the pages closest to
//! the user's current position.

use crate::domain::CursorListResult;
use std::collections::BTreeMap;
use std::sync::Arc;

/// A cached page, shared between the cache and the current-page slot
pub type CachedPage<T> = Arc<CursorListResult<T>>;

/// Page index -> last fetched result, iterated in ascending index order
#[derive(Debug)]
pub struct PageCache<T> {
    pages: BTreeMap<usize, CachedPage<T>>,
}

impl<T> PageCache<T> {
    pub fn new() -> Self {
        Self {
            pages: BTreeMap::new(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&CachedPage<T>> {
        self.pages.get(&index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.pages.contains_key(&index)
    }

    /// Store without trimming
    pub fn insert(&mut self, index: usize, page: CachedPage<T>) {
        self.pages.insert(index, page);
    }

    /// Store a page, then trim to the `max_size` pages nearest `current_index`
    pub fn cache_page(
        &mut self,
        index: usize,
        page: CachedPage<T>,
        current_index: usize,
        max_size: usize,
    ) {
        self.pages.insert(index, page);
        if self.pages.len() > max_size {
            *self = build_trimmed_cache(self, current_index, max_size);
        }
    }

    /// Drop every page except `index`
    pub fn retain_only(&mut self, index: usize) {
        self.pages.retain(|i, _| *i == index);
    }

    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.pages.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &CachedPage<T>)> {
        self.pages.iter().map(|(i, page)| (*i, page))
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}

impl<T> Clone for PageCache<T> {
    fn clone(&self) -> Self {
        Self {
            pages: self.pages.clone(),
        }
    }
}

impl<T> Default for PageCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<(usize, CachedPage<T>)> for PageCache<T> {
    fn from_iter<I: IntoIterator<Item = (usize, CachedPage<T>)>>(iter: I) -> Self {
        Self {
            pages: iter.into_iter().collect(),
        }
    }
}

/// Keep the `max_size` pages numerically closest to `current_index`
///
/// Distance is `|index - current_index|`; ties keep the lower index (the
/// cache's iteration order). A cache already within bounds is returned as is.
pub fn build_trimmed_cache<T>(
    cache: &PageCache<T>,
    current_index: usize,
    max_size: usize,
) -> PageCache<T> {
    if cache.len() <= max_size {
        return cache.clone();
    }

    let mut entries: Vec<(usize, &CachedPage<T>)> = cache.iter().collect();
    entries.sort_by_key(|(index, _)| index.abs_diff(current_index));

    let trimmed: PageCache<T> = entries
        .into_iter()
        .take(max_size)
        .map(|(index, page)| (index, Arc::clone(page)))
        .collect();

    tracing::debug!(
        "Trimmed page cache from {} to {} pages around page {}",
        cache.len(),
        trimmed.len(),
        current_index
    );
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache_of(indices: &[usize]) -> PageCache<usize> {
        indices
            .iter()
            .map(|i| (*i, Arc::new(CursorListResult::page(vec![*i], format!("c{}", i + 1)))))
            .collect()
    }

    #[test]
    fn test_within_bounds_unchanged() {
        let cache = cache_of(&[0, 1, 2]);
        let trimmed = build_trimmed_cache(&cache, 10, 3);
        assert_eq!(trimmed.indices().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_keeps_nearest_pages() {
        let cache = cache_of(&[0, 1, 2, 3, 4, 5, 6]);
        let trimmed = build_trimmed_cache(&cache, 5, 3);
        assert_eq!(trimmed.indices().collect::<Vec<_>>(), vec![4, 5, 6]);
    }

    #[test]
    fn test_ties_keep_lower_index() {
        let cache = cache_of(&[1, 2, 3, 4, 5]);
        let trimmed = build_trimmed_cache(&cache, 3, 2);
        assert_eq!(trimmed.indices().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_cache_page_trims() {
        let mut cache = cache_of(&[0, 1, 2]);
        cache.cache_page(3, Arc::new(CursorListResult::done(vec![3])), 3, 3);
        assert_eq!(cache.indices().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_retain_only() {
        let mut cache = cache_of(&[0, 1, 2]);
        cache.retain_only(1);
        assert_eq!(cache.indices().collect::<Vec<_>>(), vec![1]);
    }
}
