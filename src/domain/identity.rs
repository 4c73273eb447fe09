//! Query Identity
//!
//! The inputs that decide *which* result set is paginated, as opposed to where
//! within it the user is. A change in identity invalidates every cursor.

use super::sort::SortSpec;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryIdentity {
    pub search: String,
    pub page_size: usize,
    /// Sorted by key so the canonical form is stable
    pub filters: BTreeMap<String, String>,
    pub sort_by: Option<SortSpec>,
}

impl QueryIdentity {
    /// Canonical JSON form used for comparison
    pub fn canonical(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            tracing::warn!("Failed to serialize query identity: {e}");
            format!("{self:?}")
        })
    }
}

/// Whether two identity snapshots describe different result sets
pub fn has_query_identity_changed(prev: &QueryIdentity, next: &QueryIdentity) -> bool {
    prev.canonical() != next.canonical()
}
