//! Paging Primitives
//!
//! Pure functions over the page cache and cursor chain. The table state
//! machine composes these; nothing here performs I/O.

mod cache;
mod changes;
mod cursors;
mod prefetch;

pub use cache::*;
pub use changes::*;
pub use cursors::*;
pub use prefetch::*;
