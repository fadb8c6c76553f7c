//! Data models for the positive news pipeline.
//!
//! This module defines every shape that flows between pipeline stages:
//!
//! - [`RawArticle`]: an item as returned by the news search API
//! - [`CandidateArticle`]: an article that survived accumulation, with its excerpt
//! - [`RankedResult`]: one entry of the language model's ranking
//! - [`StoredArticleRecord`]: what gets persisted to suppress repeats
//! - [`Tally`]: a fold that keeps successes and `(url, reason)` skips side by side
//!
//! All in-memory types live for one pipeline run only. Only
//! [`StoredArticleRecord`] outlives a run.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Response envelope of the news search API.
///
/// A failed request still comes back as JSON with `status: "error"` and a
/// `code`/`message` pair, so both are kept for diagnostics.
#[derive(Debug, Deserialize)]
pub struct NewsResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub articles: Vec<RawArticle>,
}

/// A single search result. Ephemeral, never persisted.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RawArticle {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub url: String,
    /// Lead image, when the publisher provides one.
    #[serde(rename = "urlToImage", default)]
    pub url_to_image: Option<String>,
}

/// An article that passed accumulation and is eligible for ranking.
///
/// The excerpt is the first 50 words of the extracted readable body.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CandidateArticle {
    pub title: String,
    pub url: String,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub image_url: Option<String>,
}

/// Closed set of categories the ranker may assign.
///
/// Decoding is case-insensitive and anything outside the set becomes
/// [`Category::Other`] rather than failing the whole ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Business,
    Entertainment,
    General,
    Health,
    Science,
    Sports,
    Technology,
    Finance,
    World,
    Arts,
    Lifestyle,
    Other,
}

impl Category {
    /// Every category the model is allowed to pick, in prompt order.
    pub const ALLOWED: [Category; 11] = [
        Category::Business,
        Category::Entertainment,
        Category::General,
        Category::Health,
        Category::Science,
        Category::Sports,
        Category::Technology,
        Category::Finance,
        Category::World,
        Category::Arts,
        Category::Lifestyle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Business => "business",
            Category::Entertainment => "entertainment",
            Category::General => "general",
            Category::Health => "health",
            Category::Science => "science",
            Category::Sports => "sports",
            Category::Technology => "technology",
            Category::Finance => "finance",
            Category::World => "world",
            Category::Arts => "arts",
            Category::Lifestyle => "lifestyle",
            Category::Other => "other",
        }
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        let wanted = s.trim().to_lowercase();
        Category::ALLOWED
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .unwrap_or(Category::Other)
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.as_str().to_string()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the model's ranking.
///
/// `url` is only usable if it matches a [`CandidateArticle`] from the same run.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RankedResult {
    pub rank: u32,
    pub title: String,
    pub url: String,
    pub category: Category,
}

/// A persisted article, keyed by URL.
///
/// `ttl` is an absolute expiry in epoch seconds; the store deletes the record
/// on its own once it passes.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredArticleRecord {
    pub url: String,
    pub title: String,
    pub excerpt: String,
    pub stored_at: DateTime<Utc>,
    pub ttl: i64,
}

impl StoredArticleRecord {
    pub fn new(article: &CandidateArticle, now: DateTime<Utc>, retention: Duration) -> Self {
        Self {
            url: article.url.clone(),
            title: article.title.clone(),
            excerpt: article.excerpt.clone(),
            stored_at: now,
            ttl: (now + retention).timestamp(),
        }
    }
}

/// Credentials pulled from the secret store.
#[derive(Clone, PartialEq)]
pub struct ApiKeys {
    pub news_api: String,
    pub llm: String,
}

// Keys never reach the logs.
impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeys")
            .field("news_api", &"***")
            .field("llm", &"***")
            .finish()
    }
}

/// Result-collecting fold for "log and continue" loops.
///
/// Successes go to `kept`; every item that was dropped goes to `skipped`
/// together with its URL and the reason, so callers and tests can look at
/// both channels independently.
#[derive(Debug, Clone, PartialEq)]
pub struct Tally<T, R> {
    pub kept: Vec<T>,
    pub skipped: Vec<(String, R)>,
}

impl<T, R> Tally<T, R> {
    pub fn new() -> Self {
        Self {
            kept: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn keep(&mut self, item: T) {
        self.kept.push(item);
    }

    pub fn skip(&mut self, url: impl Into<String>, reason: R) {
        self.skipped.push((url.into(), reason));
    }
}

impl<T, R> Default for Tally<T, R> {
    fn default() -> Self {
        Self::new()
    }
}
