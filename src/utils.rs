//! Small text helpers shared across the pipeline.
//!
//! - Word counting and excerpting for article bodies
//! - String truncation for logging
//! - JSON error classification for model responses

/// Count whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Return the first `n` words of `text` joined by single spaces.
///
/// Returns `None` when the text has fewer than `n` words, so callers never
/// get a short excerpt by accident.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(first_words("a b  c", 2).as_deref(), Some("a b"));
/// assert_eq!(first_words("a b", 3), None);
/// ```
pub fn first_words(text: &str, n: usize) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().take(n).collect();
    if words.len() < n {
        return None;
    }
    Some(words.join(" "))
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (backing off to a char
/// boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// A completion cut off by the token limit fails with an EOF error rather
/// than a syntax error; the distinction is worth a separate log line.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}
