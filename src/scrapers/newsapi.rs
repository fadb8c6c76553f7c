//! News search API client.
//!
//! Queries the `/v2/everything` endpoint with a fixed positive-sentiment
//! keyword query over a rolling date window, sorted by relevancy.
//!
//! # Request shape
//!
//! ```text
//! GET {endpoint}?q=...&from=YYYY-MM-DD&to=YYYY-MM-DD&sortBy=relevancy
//!     &pageSize=50&page=N&language=en&apiKey=...
//! ```

use crate::config::NewsConfig;
use crate::models::{NewsResponse, RawArticle};
use crate::utils::truncate_for_log;
use chrono::{Duration, NaiveDate, Utc};
use reqwest::Client;
use std::error::Error;
use tracing::{debug, info, instrument};

/// One page of search results.
pub trait NewsSearch {
    /// Fetch page `page` (1-based). Any transport, HTTP or API-level error
    /// is returned as `Err`.
    async fn fetch_page(&self, api_key: &str, page: u32) -> Result<Vec<RawArticle>, Box<dyn Error>>;
}

#[derive(Debug, Clone)]
pub struct NewsApiClient {
    client: Client,
    config: NewsConfig,
}

impl NewsApiClient {
    pub fn new(client: Client, config: NewsConfig) -> Self {
        Self { client, config }
    }

    /// Build the request URL for `page`, with the date window ending on `today`.
    fn request_url(&self, api_key: &str, page: u32, today: NaiveDate) -> String {
        let from = today - Duration::days(self.config.window_days);
        format!(
            "{}?q={}&from={}&to={}&sortBy={}&pageSize={}&page={}&language={}&apiKey={}",
            self.config.endpoint,
            urlencoding::encode(&self.config.query),
            from.format("%Y-%m-%d"),
            today.format("%Y-%m-%d"),
            self.config.sort_by,
            self.config.page_size,
            page,
            self.config.language,
            urlencoding::encode(api_key),
        )
    }
}

impl NewsSearch for NewsApiClient {
    #[instrument(level = "info", skip(self, api_key))]
    async fn fetch_page(&self, api_key: &str, page: u32) -> Result<Vec<RawArticle>, Box<dyn Error>> {
        let url = self.request_url(api_key, page, Utc::now().date_naive());

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| format!("news search request failed (page {page}): {e}"))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| format!("failed to read news search response (page {page}): {e}"))?;
        debug!(page, body = %truncate_for_log(&body, 2_000), "News search raw output");

        let parsed: NewsResponse = serde_json::from_str(&body).map_err(|e| {
            format!(
                "failed to decode news search response (HTTP {status}): {e}; body: {}",
                truncate_for_log(&body, 300)
            )
        })?;

        if !status.is_success() || parsed.status.as_deref() == Some("error") {
            return Err(format!(
                "news search API error (HTTP {status}): {}: {}",
                parsed.code.as_deref().unwrap_or("unknown"),
                parsed.message.as_deref().unwrap_or("no message"),
            )
            .into());
        }

        info!(page, count = parsed.articles.len(), "Fetched news search page");
        Ok(parsed.articles)
    }
}
