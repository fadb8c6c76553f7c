//! AWS Lambda entry point.
//!
//! Each invocation hands the raw event JSON to [`router::handle`] and answers
//! with its [`RouterResponse`], which API Gateway reads as
//! `statusCode`/`headers`/`body`. Failures are already folded into the
//! response, so the runtime never sees an invocation error.

use crate::cloud::sns::SnsNotifier;
use crate::config::Config;
use crate::models::ApiKeys;
use crate::pipeline;
use crate::publish::Notifier;
use crate::router::{self, RouterResponse};
use aws_config::SdkConfig;
use lambda_runtime::{LambdaEvent, service_fn};
use reqwest::Client;
use serde_json::Value;
use std::error::Error;
use tracing::{info, instrument};

/// Serve invocations until the runtime shuts down.
pub async fn serve(
    sdk: &SdkConfig,
    http: &Client,
    config: &Config,
    keys: Option<ApiKeys>,
) -> Result<(), Box<dyn Error>> {
    let notifier = SnsNotifier::new(aws_sdk_sns::Client::new(sdk), &config.publish.topic_arn);
    let notifier = &notifier;

    info!("Waiting for Lambda invocations");
    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| {
        let keys = keys.clone();
        respond(event, notifier, async move || {
            pipeline::run_live(sdk, http, config, keys)
                .await
                .map(|summary| summary.selected)
        })
    }))
    .await
    .map_err(|e| format!("Lambda runtime failed: {e}"))?;
    Ok(())
}

#[instrument(level = "info", skip_all, fields(request_id = %event.context.request_id))]
async fn respond<N, F>(
    event: LambdaEvent<Value>,
    notifier: &N,
    run: F,
) -> Result<RouterResponse, lambda_runtime::Error>
where
    N: Notifier,
    F: AsyncFnOnce() -> Result<usize, Box<dyn Error>>,
{
    let payload = event.payload.to_string();
    Ok(router::handle(&payload, notifier, run).await)
}
