//! Candidate accumulation.
//!
//! Pages through the news search API, downloads each new article, and keeps
//! the ones long enough to be worth ranking, until enough candidates are
//! collected or the attempt budget runs out.
//!
//! A failed search call aborts accumulation. A failed download only skips
//! that one article.

use crate::config::AccumulationConfig;
use crate::models::{CandidateArticle, Tally};
use crate::scrapers::{ContentExtractor, NewsSearch};
use crate::utils::{first_words, word_count};
use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Why an article did not become a candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Already encountered earlier in this run.
    Duplicate,
    /// Stored within the repeat suppression window.
    RecentlyStored,
    /// Download or extraction failed.
    ExtractionFailed(String),
    /// Body shorter than the minimum word count.
    TooShort { words: usize },
    /// Not enough words to build the excerpt.
    NoExcerpt,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Duplicate => f.write_str("duplicate URL"),
            SkipReason::RecentlyStored => f.write_str("stored recently"),
            SkipReason::ExtractionFailed(e) => write!(f, "extraction failed: {e}"),
            SkipReason::TooShort { words } => write!(f, "too short ({words} words)"),
            SkipReason::NoExcerpt => f.write_str("not enough words for an excerpt"),
        }
    }
}

/// Collect up to `config.max_candidates` candidate articles.
///
/// # Algorithm
///
/// Each attempt fetches the next page. Every result is skipped if its URL was
/// already seen this run or appears in `excluded`; otherwise it is downloaded
/// and kept when it has at least `min_words` words, with the first
/// `excerpt_words` words as its excerpt. Between attempts that fell short the
/// loop pauses for `attempt_delay`. An empty page ends accumulation early.
///
/// Falling short of `max_candidates` is not an error.
#[instrument(level = "info", skip_all, fields(excluded = excluded.len()))]
pub async fn accumulate<S, E>(
    search: &S,
    extractor: &E,
    api_key: &str,
    excluded: &HashSet<String>,
    config: &AccumulationConfig,
) -> Result<Tally<CandidateArticle, SkipReason>, Box<dyn Error>>
where
    S: NewsSearch,
    E: ContentExtractor,
{
    let mut tally = Tally::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut attempt = 0u32;

    while tally.kept.len() < config.max_candidates && attempt < config.max_attempts {
        let page = attempt + 1;
        let articles = search
            .fetch_page(api_key, page)
            .await
            .map_err(|e| format!("failed to fetch news page {page}: {e}"))?;
        attempt += 1;

        if articles.is_empty() {
            info!(page, "Search returned no more articles");
            break;
        }

        for article in articles {
            if !seen.insert(article.url.clone()) {
                tally.skip(article.url, SkipReason::Duplicate);
                continue;
            }
            if excluded.contains(&article.url) {
                debug!(url = %article.url, "Skipping recently stored article");
                tally.skip(article.url, SkipReason::RecentlyStored);
                continue;
            }

            let title = article.title.unwrap_or_default();
            let content = match extractor.extract(&article.url).await {
                Ok(content) => content,
                Err(e) => {
                    warn!(url = %article.url, %title, error = %e, "Error fetching article content; skipping");
                    tally.skip(article.url, SkipReason::ExtractionFailed(e.to_string()));
                    continue;
                }
            };

            let words = word_count(&content);
            if words < config.min_words {
                debug!(url = %article.url, words, "Article too short");
                tally.skip(article.url, SkipReason::TooShort { words });
                continue;
            }
            let Some(excerpt) = first_words(&content, config.excerpt_words) else {
                tally.skip(article.url, SkipReason::NoExcerpt);
                continue;
            };

            tally.keep(CandidateArticle {
                title,
                url: article.url,
                excerpt,
                image_url: article.url_to_image,
            });
            if tally.kept.len() >= config.max_candidates {
                break;
            }
        }

        if tally.kept.len() < config.max_candidates && attempt < config.max_attempts {
            info!(
                accumulated = tally.kept.len(),
                next_attempt = attempt + 1,
                max_attempts = config.max_attempts,
                "Not enough valid articles yet; fetching next page"
            );
            sleep(config.attempt_delay()).await;
        }
    }

    info!(
        accumulated = tally.kept.len(),
        skipped = tally.skipped.len(),
        attempts = attempt,
        "Accumulation finished"
    );
    Ok(tally)
}
