//! Persistence of selected articles.
//!
//! Records are written with an absolute expiry and read back to build the
//! repeat suppression set. Neither side can fail a run: a failed lookup means
//! no suppression, a failed write is logged and the batch carries on.

use crate::models::{CandidateArticle, StoredArticleRecord, Tally};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use std::error::Error;
use tracing::{error, info, instrument, warn};

/// Key-value store holding [`StoredArticleRecord`]s keyed by URL.
pub trait ArticleStore {
    /// URLs of every record stored at or after `since`.
    async fn recent_urls(&self, since: DateTime<Utc>) -> Result<HashSet<String>, Box<dyn Error>>;

    async fn put(&self, record: &StoredArticleRecord) -> Result<(), Box<dyn Error>>;
}

/// URLs stored within the last `window_days`, or an empty set if the lookup fails.
#[instrument(level = "info", skip(store))]
pub async fn find_recent_urls<S: ArticleStore>(
    store: &S,
    now: DateTime<Utc>,
    window_days: i64,
) -> HashSet<String> {
    let since = now - Duration::days(window_days);
    match store.recent_urls(since).await {
        Ok(urls) => {
            info!(count = urls.len(), %since, "Loaded recently stored URLs");
            urls
        }
        Err(e) => {
            error!(error = %e, "Error fetching recent articles; continuing without exclusions");
            HashSet::new()
        }
    }
}

/// Write one record per article. Returns the stored URLs and, separately,
/// every URL whose write failed with the failure text.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn store_articles<S: ArticleStore>(
    store: &S,
    articles: &[CandidateArticle],
    now: DateTime<Utc>,
    retention_days: i64,
) -> Tally<String, String> {
    let retention = Duration::days(retention_days);
    let mut tally = Tally::new();
    for article in articles {
        let record = StoredArticleRecord::new(article, now, retention);
        match store.put(&record).await {
            Ok(()) => {
                info!(title = %article.title, "Stored article");
                tally.keep(record.url);
            }
            Err(e) => {
                warn!(title = %article.title, url = %article.url, error = %e, "Failed to store article");
                tally.skip(record.url, e.to_string());
            }
        }
    }
    tally
}
