//! # Positive News
//!
//! A scheduled pipeline that searches recent news, keeps the articles a
//! language model judges clearly positive, and emails a ranked digest to
//! subscribers of a notification topic.
//!
//! ## Features
//!
//! - Searches the news API for a rolling 7-day window with an uplifting query
//! - Downloads each article and keeps the ones with enough readable text
//! - Ranks candidates through an OpenAI-compatible chat completion API
//! - Suppresses articles already sent within the last 30 days
//! - Sends a plain-text digest through SNS and optionally refreshes a web
//!   snapshot in S3
//! - Handles subscribe and unsubscribe requests for the digest topic
//!
//! ## Usage
//!
//! ```sh
//! positive_news run
//! positive_news handle --event event.json
//! positive_news lambda
//! ```
//!
//! ## Architecture
//!
//! 1. **Accumulation**: page through search results until 30 usable candidates
//! 2. **Ranking**: one model call orders the clearly positive ones
//! 3. **Selection**: map the ranking back to candidates, keep the top 10
//! 4. **Persistence**: record what was sent, with a TTL
//! 5. **Publishing**: send the digest, update the snapshot

use clap::Parser;
use reqwest::Client;
use std::error::Error;
use std::time::Duration as StdDuration;
use tokio::io::AsyncReadExt;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod accumulate;
mod api;
mod cli;
mod cloud;
mod config;
mod lambda;
mod models;
mod outputs;
mod pipeline;
mod publish;
mod ranking;
mod router;
mod scrapers;
mod selection;
mod store;
#[cfg(test)]
mod testing;
mod utils;

use cli::{Cli, Command};
use cloud::sns::SnsNotifier;
use config::Config;

const HTTP_TIMEOUT: StdDuration = StdDuration::from_secs(30);

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("positive_news starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.region, ?args.command, "Parsed CLI arguments");

    let mut config = Config::load(args.config.as_deref()).await?;
    if let Some(region) = &args.region {
        config.aws.region = region.clone();
    }

    let sdk = cloud::load_sdk_config(&config.aws.region).await;
    let http = Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(|e| format!("failed to build HTTP client: {e}"))?;

    match &args.command {
        Command::Run => {
            let summary = pipeline::run_live(&sdk, &http, &config, args.api_keys()).await?;
            info!(
                selected = summary.selected,
                stored = summary.stored,
                published = summary.published,
                "Content generation finished"
            );
        }
        Command::Handle { event } => {
            let payload = read_event(event).await?;
            let notifier = SnsNotifier::new(aws_sdk_sns::Client::new(&sdk), &config.publish.topic_arn);
            let response = router::handle(&payload, &notifier, async || {
                pipeline::run_live(&sdk, &http, &config, args.api_keys())
                    .await
                    .map(|summary| summary.selected)
            })
            .await;

            println!("{}", serde_json::to_string_pretty(&response)?);
            if response.status_code >= 500 {
                error!(status = response.status_code, "Trigger handling failed");
                return Err(response
                    .message()
                    .unwrap_or_else(|| "trigger handling failed".to_string())
                    .into());
            }
        }
        Command::Lambda => {
            lambda::serve(&sdk, &http, &config, args.api_keys()).await?;
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

/// Read a trigger payload from a file, or stdin for `-`.
async fn read_event(path: &str) -> Result<String, Box<dyn Error>> {
    if path == "-" {
        let mut payload = String::new();
        tokio::io::stdin()
            .read_to_string(&mut payload)
            .await
            .map_err(|e| format!("failed to read event from stdin: {e}"))?;
        return Ok(payload);
    }
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| format!("failed to read event file {path}: {e}").into())
}
