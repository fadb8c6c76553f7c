//! JSON snapshot of the selected articles.
//!
//! The snapshot is what the static site loads through its signed link, so it
//! is pretty-printed with two-space indentation and keeps selection order.

use crate::models::CandidateArticle;

/// Serialize `articles` as an indented JSON array.
pub fn snapshot_json(articles: &[CandidateArticle]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(articles)
}
