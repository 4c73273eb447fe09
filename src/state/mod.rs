//! Table State
//!
//! The synchronous state machine, its async driver and the pieces they share.

mod debounce;
mod events;
mod table;
mod table_state;

pub use debounce::Debouncer;
pub use events::{EventBus, TableEvent};
pub use table::{CursorTable, ReachedPage};
pub use table_state::{HistoryMode, TableState};
