//! URL Parameter Codec
//!
//! Encoding of individual parameter values: opaque cursors, `field.direction`
//! sort specs and 1-based page numbers.

use crate::constants::CURSOR_B64_PREFIX;
use crate::domain::{SortDirection, SortSpec};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD as BASE64URL};

/// Whether a cursor can be placed in the URL verbatim
///
/// Safe cursors match `[A-Za-z0-9._~-]+`. A cursor that already looks like an
/// encoded one is never safe, so decoding stays unambiguous.
pub fn is_url_safe_cursor(cursor: &str) -> bool {
    !cursor.is_empty()
        && !cursor.starts_with(CURSOR_B64_PREFIX)
        && cursor
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'~' | b'-'))
}

/// Encode a cursor for the `cursor` parameter
pub fn serialize_cursor_param(cursor: &str) -> String {
    if is_url_safe_cursor(cursor) {
        cursor.to_string()
    } else {
        format!("{CURSOR_B64_PREFIX}{}", BASE64URL.encode(cursor.as_bytes()))
    }
}

/// Decode the `cursor` parameter
///
/// Returns `None` for an empty value or a malformed `b64.` payload.
pub fn parse_cursor_param(value: &str) -> Option<String> {
    let Some(payload) = value.strip_prefix(CURSOR_B64_PREFIX) else {
        return (!value.is_empty()).then(|| value.to_string());
    };

    let bytes = match BASE64URL.decode(payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("Rejecting malformed cursor payload: {e}");
            return None;
        }
    };
    String::from_utf8(bytes).ok()
}

/// Parse `field.direction`; any other shape yields `None`
pub fn parse_sort_param(value: &str) -> Option<SortSpec> {
    let (field, direction) = value.rsplit_once('.')?;
    if field.is_empty() {
        return None;
    }
    let direction = SortDirection::parse(direction)?;
    Some(SortSpec::new(field, direction))
}

pub fn serialize_sort_param(sort: &SortSpec) -> String {
    sort.to_string()
}

/// Parse a positive decimal integer (`page`, `page_size`)
pub fn parse_positive_param(value: &str) -> Option<usize> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse::<usize>().ok().filter(|n| *n > 0)
}
