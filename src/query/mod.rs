//! URL Query State
//!
//! Codec for individual parameters, the parsed [`UrlState`], and a session
//! [`UrlHistory`] for back/forward navigation.

pub mod codec;
mod history;
mod state;

pub use codec::{
    is_url_safe_cursor, parse_cursor_param, parse_positive_param, parse_sort_param,
    serialize_cursor_param, serialize_sort_param,
};
pub use history::UrlHistory;
pub use state::{ParsedUrl, UrlState};
