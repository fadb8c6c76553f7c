//! One content generation run, start to finish.
//!
//! ```text
//! secrets -> recent URLs -> accumulate -> rank -> select -> store -> publish
//! ```
//!
//! Fatal: secrets, search, model call or parse, and the final send. Everything
//! else degrades and is logged. A run that selects nothing still sends the
//! digest, which then carries only the ranking details.

use crate::accumulate::accumulate;
use crate::api::{AskAsync, OpenAiChat, RetryAsk};
use crate::cloud::dynamo::DynamoArticleStore;
use crate::cloud::s3::S3ObjectStore;
use crate::cloud::secrets::{ConfiguredSecrets, SecretSource, SecretsManagerSource, StaticSecrets};
use crate::cloud::sns::SnsNotifier;
use crate::config::Config;
use crate::models::ApiKeys;
use crate::publish::{Notifier, ObjectStore, PublishReport, publish};
use crate::ranking::rank;
use crate::scrapers::{ContentExtractor, NewsApiClient, NewsSearch, ReadableExtractor};
use crate::selection::select;
use crate::store::{ArticleStore, find_recent_urls, store_articles};
use aws_config::SdkConfig;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::error::Error;
use std::time::Instant;
use tracing::{info, instrument, warn};

/// Every external service one run talks to.
pub struct Services<K, S, E, D, O, N> {
    pub secrets: K,
    pub search: S,
    pub extractor: E,
    pub store: D,
    pub objects: O,
    pub notifier: N,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub excluded: usize,
    pub candidates: usize,
    pub skipped: usize,
    pub ranked: usize,
    pub selected: usize,
    pub stored: usize,
    pub store_failures: usize,
    pub published: bool,
    pub publish: PublishReport,
}

/// Run the pipeline once.
///
/// The language model client needs the key from the secret store, so it is
/// built inside the run by `make_llm`.
#[instrument(level = "info", skip_all, fields(%now))]
pub async fn run<K, S, E, D, O, N, A, F>(
    services: &Services<K, S, E, D, O, N>,
    make_llm: F,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<RunSummary, Box<dyn Error>>
where
    K: SecretSource,
    S: NewsSearch,
    E: ContentExtractor,
    D: ArticleStore,
    O: ObjectStore,
    N: Notifier,
    A: AskAsync<Response = String>,
    F: FnOnce(&str) -> A,
{
    let t0 = Instant::now();
    let mut summary = RunSummary::default();

    let keys = services
        .secrets
        .api_keys()
        .await
        .map_err(|e| format!("failed to retrieve API keys: {e}"))?;

    let excluded = find_recent_urls(&services.store, now, config.store.recent_window_days).await;
    summary.excluded = excluded.len();

    let tally = accumulate(
        &services.search,
        &services.extractor,
        &keys.news_api,
        &excluded,
        &config.accumulation,
    )
    .await?;
    summary.candidates = tally.kept.len();
    summary.skipped = tally.skipped.len();
    info!(candidates = summary.candidates, skipped = summary.skipped, "Accumulated candidates");

    let llm = make_llm(&keys.llm);
    let ranked = rank(&llm, &tally.kept, config.llm.max_prompt_articles).await?;
    summary.ranked = ranked.len();

    let selected = select(&ranked, &tally.kept, config.selection.max_selected);
    summary.selected = selected.len();
    if selected.is_empty() {
        warn!(ranked = summary.ranked, "No ranked article matched a candidate");
    }

    let stored = store_articles(&services.store, &selected, now, config.store.retention_days).await;
    summary.stored = stored.kept.len();
    summary.store_failures = stored.skipped.len();

    summary.publish = publish(
        &services.objects,
        &services.notifier,
        &config.publish,
        &selected,
        &ranked,
    )
    .await?;
    summary.published = true;

    info!(elapsed_ms = t0.elapsed().as_millis(), ?summary, "Run complete");
    Ok(summary)
}

/// Run against the real services.
///
/// `keys` bypasses the secret store when given.
pub async fn run_live(
    sdk: &SdkConfig,
    http: &Client,
    config: &Config,
    keys: Option<ApiKeys>,
) -> Result<RunSummary, Box<dyn Error>> {
    let secrets = match keys {
        Some(keys) => {
            info!("Using API keys from the command line/environment");
            ConfiguredSecrets::Static(StaticSecrets::new(keys))
        }
        None => ConfiguredSecrets::Manager(SecretsManagerSource::new(
            aws_sdk_secretsmanager::Client::new(sdk),
            config.secrets.clone(),
        )),
    };
    let services = Services {
        secrets,
        search: NewsApiClient::new(http.clone(), config.news.clone()),
        extractor: ReadableExtractor::new(http.clone()),
        store: DynamoArticleStore::new(aws_sdk_dynamodb::Client::new(sdk), &config.store.table_name),
        objects: S3ObjectStore::new(aws_sdk_s3::Client::new(sdk)),
        notifier: SnsNotifier::new(aws_sdk_sns::Client::new(sdk), &config.publish.topic_arn),
    };
    let make_llm = |key: &str| {
        RetryAsk::new(
            OpenAiChat::new(http.clone(), &config.llm.api_base, &config.llm.model, key),
            config.llm.max_retries,
            config.llm.retry_base_delay(),
        )
    };

    run(&services, make_llm, config, Utc::now()).await
}
