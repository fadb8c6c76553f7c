//! Static page rewrite.
//!
//! The page ships with a quoted placeholder URL where the snapshot link goes.
//! Each run swaps in a freshly signed link; only the first occurrence is
//! replaced.

/// Replace the first `placeholder` in `html` with the quoted `signed_url`.
///
/// Returns `None` when the placeholder is not in the page, so the caller can
/// skip a pointless re-upload.
pub fn embed_signed_url(html: &str, placeholder: &str, signed_url: &str) -> Option<String> {
    if placeholder.is_empty() || !html.contains(placeholder) {
        return None;
    }
    Some(html.replacen(placeholder, &format!("\"{signed_url}\""), 1))
}
