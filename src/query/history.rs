//! URL History
//!
//! A browser-style session history of query strings. Navigation pushes new
//! entries, state corrections replace the current one, and back/forward hand
//! the caller a query string to re-apply (the equivalent of `popstate`).

#[derive(Debug, Clone)]
pub struct UrlHistory {
    entries: Vec<String>,
    index: usize,
}

impl UrlHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
            index: 0,
        }
    }

    /// The active query string
    pub fn current(&self) -> &str {
        &self.entries[self.index]
    }

    /// Push a new entry, discarding any forward entries
    ///
    /// Pushing the current value again is a no-op.
    pub fn push(&mut self, query: impl Into<String>) {
        let query = query.into();
        if query == self.current() {
            return;
        }
        self.entries.truncate(self.index + 1);
        self.entries.push(query);
        self.index += 1;
    }

    /// Overwrite the active entry
    pub fn replace(&mut self, query: impl Into<String>) {
        self.entries[self.index] = query.into();
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn back(&mut self) -> Option<&str> {
        if !self.can_go_back() {
            return None;
        }
        self.index -= 1;
        Some(self.current())
    }

    pub fn forward(&mut self) -> Option<&str> {
        if !self.can_go_forward() {
            return None;
        }
        self.index += 1;
        Some(self.current())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for UrlHistory {
    fn default() -> Self {
        Self::new(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_back_forward() {
        let mut history = UrlHistory::new("page=1");
        history.push("page=2");
        history.push("page=3");
        assert_eq!(history.back(), Some("page=2"));
        assert_eq!(history.back(), Some("page=1"));
        assert_eq!(history.back(), None);
        assert_eq!(history.forward(), Some("page=2"));
    }

    #[test]
    fn test_push_truncates_forward_entries() {
        let mut history = UrlHistory::new("page=1");
        history.push("page=2");
        history.back();
        history.push("page=1&search=x");
        assert!(!history.can_go_forward());
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_duplicate_push_ignored() {
        let mut history = UrlHistory::new("page=1");
        history.push("page=1");
        assert_eq!(history.len(), 1);
        history.replace("page=1&page_size=20");
        assert_eq!(history.current(), "page=1&page_size=20");
    }
}
