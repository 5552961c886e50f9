//! UTF-8 safe string helpers
//!
//! Shape strings embedded in finding messages can be arbitrarily long and
//! can contain multi-byte characters (type names from any source file), so
//! truncation must land on a char boundary.

/// Truncate a string at a valid UTF-8 char boundary at or before `max_bytes`.
pub fn truncate_to_char_boundary(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Truncate and append an ellipsis when the input was shortened.
pub fn truncate_with_ellipsis(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        s.to_string()
    } else {
        format!("{}...", truncate_to_char_boundary(s, max_bytes))
    }
}
