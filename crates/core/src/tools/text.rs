//! # Text Normalization
//!
//! Canonical forms for comparing streamed model text.

/// Default comparison width used for echo and duplicate detection.
pub const DEFAULT_NORMALIZE_WIDTH: usize = 300;

/// Lowercase, collapse whitespace runs to single spaces, truncate to
/// `max_chars` characters.
///
/// The result never carries leading or trailing whitespace, so
/// `normalize(&normalize(s, n), n) == normalize(s, n)`.
pub fn normalize(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let lowered = collapsed.to_lowercase();
    truncate_chars(&lowered, max_chars).trim_end().to_string()
}

/// Normalize with [`DEFAULT_NORMALIZE_WIDTH`].
pub fn normalize_short(text: &str) -> String {
    normalize(text, DEFAULT_NORMALIZE_WIDTH)
}

/// Borrow at most `max_chars` characters from the front of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
