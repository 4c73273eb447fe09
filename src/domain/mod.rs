//! Domain Models
//!
//! Page results, sort specifications and query identity.

pub mod identity;
pub mod list_result;
pub mod sort;

pub use identity::{QueryIdentity, has_query_identity_changed};
pub use list_result::{CursorListResult, PageEnd};
pub use sort::{SortDirection, SortSpec};
