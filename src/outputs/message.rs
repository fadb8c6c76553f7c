//! Plain-text digest.
//!
//! # Layout
//!
//! ```text
//! Hello,
//!
//! Here are your top positively-ranked news articles:
//!
//! 1. Title
//! https://example.com/a
//!
//! Full Ranking Details:
//!
//! 1. Title https://example.com/a - Category: science
//!
//! Have a great day!
//! ```

use crate::models::{CandidateArticle, RankedResult};
use itertools::Itertools;
use std::fmt::Write as _;

/// Render the digest body: greeting, selected articles, full ranking, sign-off.
pub fn build_plain_message(
    top: &[CandidateArticle],
    ranked: &[RankedResult],
    site_link: Option<&str>,
) -> String {
    let mut message = String::from("Hello,\n\nHere are your top positively-ranked news articles:\n\n");

    if let Some(link) = site_link {
        let _ = write!(
            message,
            "Check out the latest positive news articles on our website 🌟: {link}\n\n"
        );
    }

    for (i, article) in top.iter().enumerate() {
        let _ = write!(message, "{}. {}\n{}\n\n", i + 1, article.title, article.url);
    }

    message.push_str("\nFull Ranking Details:\n\n");
    for r in ranked {
        let _ = write!(
            message,
            "{}. {} {} - Category: {}\n\n",
            r.rank, r.title, r.url, r.category
        );
    }

    message.push_str("\nHave a great day!\n");
    message
}

/// Give every line containing a link an extra trailing newline so email
/// clients render it as its own paragraph.
pub fn isolate_links(message: &str) -> String {
    message
        .split('\n')
        .map(|line| {
            if line.contains("http") {
                format!("{line}\n")
            } else {
                line.to_string()
            }
        })
        .join("\n")
}
