//! Runtime configuration.
//!
//! Every identifier the pipeline talks to (table, topic, bucket, secret) and
//! every tuning constant is a field here, passed into each component at
//! construction. Values come from an optional YAML file; anything missing
//! falls back to [`Default`].
//!
//! ```yaml
//! aws:
//!   region: us-east-2
//! store:
//!   table_name: PositiveArticles
//!   recent_window_days: 30
//! publish:
//!   topic_arn: arn:aws:sns:us-east-2:123456789012:positive_news
//!   snapshot:
//!     bucket: my-positive-news
//! ```

use serde::Deserialize;
use std::error::Error;
use std::time::Duration as StdDuration;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub aws: AwsConfig,
    pub secrets: SecretsConfig,
    pub news: NewsConfig,
    pub accumulation: AccumulationConfig,
    pub llm: LlmConfig,
    pub selection: SelectionConfig,
    pub store: StoreConfig,
    pub publish: PublishConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AwsConfig {
    pub region: String,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: "us-east-2".to_string(),
        }
    }
}

/// Where the API keys live and which JSON keys hold them.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SecretsConfig {
    pub secret_name: String,
    pub news_api_key_field: String,
    pub llm_key_field: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            secret_name: "positiveNews_openai_newsapi_keys".to_string(),
            news_api_key_field: "NEWS_API_KEY".to_string(),
            llm_key_field: "OPENAI_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NewsConfig {
    pub endpoint: String,
    pub query: String,
    pub page_size: u32,
    pub language: String,
    pub sort_by: String,
    pub window_days: i64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://newsapi.org/v2/everything".to_string(),
            query: "inspiring OR heartwarming OR motivational OR encouraging OR breakthrough \
                    OR innovation OR success OR 'good news' OR uplifting OR inspiring \
                    -crisis -war -tragedy -disaster -shooting"
                .to_string(),
            page_size: 50,
            language: "en".to_string(),
            sort_by: "relevancy".to_string(),
            window_days: 7,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AccumulationConfig {
    pub max_candidates: usize,
    pub max_attempts: u32,
    pub min_words: usize,
    pub excerpt_words: usize,
    /// Pause between attempts that came up short.
    pub attempt_delay_ms: u64,
}

impl AccumulationConfig {
    pub fn attempt_delay(&self) -> StdDuration {
        StdDuration::from_millis(self.attempt_delay_ms)
    }
}

impl Default for AccumulationConfig {
    fn default() -> Self {
        Self {
            max_candidates: 30,
            max_attempts: 3,
            min_words: 150,
            excerpt_words: 50,
            attempt_delay_ms: 2_000,
        }
    }
}

/// OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmConfig {
    pub api_base: String,
    pub model: String,
    /// Extra attempts after a failed completion call. Zero means one shot.
    pub max_retries: usize,
    pub retry_base_delay_ms: u64,
    /// Upper bound on how many candidates go into one prompt.
    pub max_prompt_articles: usize,
}

impl LlmConfig {
    pub fn retry_base_delay(&self) -> StdDuration {
        StdDuration::from_millis(self.retry_base_delay_ms)
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4".to_string(),
            max_retries: 0,
            retry_base_delay_ms: 1_000,
            max_prompt_articles: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectionConfig {
    pub max_selected: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { max_selected: 10 }
    }
}

/// The two retention numbers are independent: one bounds the repeat
/// suppression window, the other bounds how long records exist at all.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub table_name: String,
    pub recent_window_days: i64,
    pub retention_days: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table_name: "PositiveArticles".to_string(),
            recent_window_days: 30,
            retention_days: 182,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PublishConfig {
    pub topic_arn: String,
    pub subject: String,
    /// Optional "visit the website" link placed at the top of the digest.
    pub site_link: Option<String>,
    /// Object storage snapshot; disabled when absent.
    pub snapshot: Option<SnapshotConfig>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            topic_arn: "arn:aws:sns:us-east-2:000000000000:positive_news".to_string(),
            subject: "Your Daily Positive News Rankings".to_string(),
            site_link: None,
            snapshot: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SnapshotConfig {
    pub bucket: String,
    pub json_key: String,
    /// HTML page whose placeholder gets replaced; skipped when absent.
    pub html_key: Option<String>,
    pub placeholder: String,
    pub presign_expiry_hours: u64,
}

impl SnapshotConfig {
    pub fn presign_expiry(&self) -> StdDuration {
        StdDuration::from_secs(self.presign_expiry_hours * 60 * 60)
    }
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            bucket: "pk-positive-news".to_string(),
            json_key: "latest_news.json".to_string(),
            html_key: Some("index.html".to_string()),
            placeholder:
                r#""https://your-s3-bucket.s3.amazonaws.com/latest_news.json?...signed-url-params""#
                    .to_string(),
            presign_expiry_hours: 24,
        }
    }
}

impl Config {
    /// Parse a configuration from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self, Box<dyn Error>> {
        let config: Config = serde_yaml::from_str(text)
            .map_err(|e| format!("invalid configuration: {e}"))?;
        Ok(config)
    }

    /// Load configuration from `path`, or use defaults when no path is given.
    #[instrument(level = "info")]
    pub async fn load(path: Option<&str>) -> Result<Self, Box<dyn Error>> {
        match path {
            Some(path) => {
                let text = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| format!("failed to read config file {path}: {e}"))?;
                let config = Self::from_yaml(&text)?;
                info!(path, "Loaded configuration");
                Ok(config)
            }
            None => {
                info!("No config file given; using defaults");
                Ok(Self::default())
            }
        }
    }
}
