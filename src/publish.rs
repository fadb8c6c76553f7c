//! Digest publishing.
//!
//! Sends the plain-text digest through the notification service and, when a
//! snapshot is configured, refreshes the web snapshot in object storage.
//!
//! # Steps
//!
//! | Step | On failure |
//! |------|------------|
//! | Upload JSON snapshot | logged, recorded in [`PublishReport::failures`] |
//! | Sign snapshot URL | logged, recorded; page update skipped |
//! | Rewrite and upload HTML page | logged, recorded |
//! | Send digest | returned as `Err` |
//!
//! Only the final send can fail a run.

use crate::config::{PublishConfig, SnapshotConfig};
use crate::models::{CandidateArticle, RankedResult};
use crate::outputs::html::embed_signed_url;
use crate::outputs::json::snapshot_json;
use crate::outputs::message::{build_plain_message, isolate_links};
use std::error::Error;
use std::time::Duration as StdDuration;
use tracing::{error, info, instrument, warn};

/// Object storage with signed retrieval links.
pub trait ObjectStore {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), Box<dyn Error>>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, Box<dyn Error>>;

    /// A GET link for `key` that stops working after `expires_in`.
    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: StdDuration,
    ) -> Result<String, Box<dyn Error>>;
}

/// A subscription on the digest topic as reported by the notification service.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscription {
    pub endpoint: String,
    /// Either a real subscription ARN or the literal `PendingConfirmation`.
    pub subscription_arn: String,
}

impl Subscription {
    pub const PENDING: &'static str = "PendingConfirmation";

    pub fn is_pending(&self) -> bool {
        self.subscription_arn == Self::PENDING
    }
}

/// The notification topic the digest goes out on.
pub trait Notifier {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), Box<dyn Error>>;

    /// Start an email subscription; the recipient still has to confirm it.
    async fn subscribe(&self, email: &str) -> Result<(), Box<dyn Error>>;

    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, Box<dyn Error>>;

    async fn unsubscribe(&self, subscription_arn: &str) -> Result<(), Box<dyn Error>>;
}

/// What happened during publishing, besides the send itself.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PublishReport {
    pub snapshot_uploaded: bool,
    pub signed_url: Option<String>,
    pub page_updated: bool,
    /// `(step, error)` for each side step that failed.
    pub failures: Vec<(String, String)>,
}

impl PublishReport {
    fn fail(&mut self, step: &str, e: impl ToString) {
        self.failures.push((step.to_string(), e.to_string()));
    }
}

/// Publish the digest for one run.
#[instrument(level = "info", skip_all, fields(selected = selected.len(), ranked = ranked.len()))]
pub async fn publish<O, N>(
    objects: &O,
    notifier: &N,
    config: &PublishConfig,
    selected: &[CandidateArticle],
    ranked: &[RankedResult],
) -> Result<PublishReport, Box<dyn Error>>
where
    O: ObjectStore,
    N: Notifier,
{
    let mut report = PublishReport::default();
    if let Some(snapshot) = &config.snapshot {
        publish_snapshot(objects, snapshot, selected, &mut report).await;
    }

    let message = isolate_links(&build_plain_message(
        selected,
        ranked,
        config.site_link.as_deref(),
    ));
    notifier
        .publish(&config.subject, &message)
        .await
        .map_err(|e| format!("failed to send digest: {e}"))?;
    info!(subject = %config.subject, "Digest sent");

    Ok(report)
}

async fn publish_snapshot<O: ObjectStore>(
    objects: &O,
    snapshot: &SnapshotConfig,
    selected: &[CandidateArticle],
    report: &mut PublishReport,
) {
    match snapshot_json(selected) {
        Ok(json) => {
            match objects
                .put_object(&snapshot.bucket, &snapshot.json_key, json.into_bytes(), "application/json")
                .await
            {
                Ok(()) => {
                    info!(bucket = %snapshot.bucket, key = %snapshot.json_key, "Uploaded news snapshot");
                    report.snapshot_uploaded = true;
                }
                Err(e) => {
                    error!(error = %e, key = %snapshot.json_key, "Failed to upload news snapshot");
                    report.fail("upload_snapshot", e);
                }
            }
        }
        Err(e) => {
            error!(error = %e, "Failed to serialize news snapshot");
            report.fail("serialize_snapshot", e);
        }
    }

    let signed_url = match objects
        .presign_get(&snapshot.bucket, &snapshot.json_key, snapshot.presign_expiry())
        .await
    {
        Ok(url) => url,
        Err(e) => {
            error!(error = %e, "Failed to generate signed URL; page left unchanged");
            report.fail("presign", e);
            return;
        }
    };
    report.signed_url = Some(signed_url.clone());

    let Some(html_key) = &snapshot.html_key else {
        return;
    };
    match update_page(objects, snapshot, html_key, &signed_url).await {
        Ok(true) => {
            info!(key = %html_key, "Updated page with new signed URL");
            report.page_updated = true;
        }
        Ok(false) => warn!(key = %html_key, "Placeholder not found in page; left unchanged"),
        Err(e) => {
            error!(error = %e, key = %html_key, "Failed to update page");
            report.fail("update_page", e);
        }
    }
}

/// Returns `Ok(false)` when the page has no placeholder to replace.
async fn update_page<O: ObjectStore>(
    objects: &O,
    snapshot: &SnapshotConfig,
    html_key: &str,
    signed_url: &str,
) -> Result<bool, Box<dyn Error>> {
    let bytes = objects
        .get_object(&snapshot.bucket, html_key)
        .await
        .map_err(|e| format!("failed to fetch {html_key}: {e}"))?;
    let html = String::from_utf8(bytes).map_err(|e| format!("{html_key} is not UTF-8: {e}"))?;

    let Some(updated) = embed_signed_url(&html, &snapshot.placeholder, signed_url) else {
        return Ok(false);
    };
    objects
        .put_object(&snapshot.bucket, html_key, updated.into_bytes(), "text/html")
        .await
        .map_err(|e| format!("failed to upload {html_key}: {e}"))?;
    Ok(true)
}
