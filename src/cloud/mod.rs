//! AWS-backed implementations of the service traits.
//!
//! | Service | Trait | Module |
//! |---------|-------|--------|
//! | Secrets Manager | [`crate::cloud::secrets::SecretSource`] | [`secrets`] |
//! | DynamoDB | [`crate::store::ArticleStore`] | [`dynamo`] |
//! | S3 | [`crate::publish::ObjectStore`] | [`s3`] |
//! | SNS | [`crate::publish::Notifier`] | [`sns`] |
//!
//! All clients are built from one shared [`SdkConfig`] so credentials are
//! resolved once per process.

pub mod dynamo;
pub mod s3;
pub mod secrets;
pub mod sns;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::{info, instrument};

/// Resolve credentials and endpoints for `region` from the default chain.
#[instrument(level = "info")]
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    let config = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await;
    info!(region, "Loaded AWS configuration");
    config
}
