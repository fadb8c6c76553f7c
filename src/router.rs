//! Trigger entry point.
//!
//! An inbound payload is decoded into exactly one [`TriggerRequest`] before
//! anything runs. Two envelopes are understood:
//!
//! - HTTP, either API Gateway REST (`httpMethod`) or HTTP API
//!   (`requestContext.http.method`), with a JSON string body
//!   `{"action": "subscribe" | "unsubscribe", "email": ...}`
//! - Scheduled, an EventBridge event carrying `source` and `detail-type`
//!
//! Anything else is a 4xx [`RouterResponse`]. Every response carries
//! permissive CORS headers.

use crate::publish::{Notifier, Subscription};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use tracing::{error, info, instrument, warn};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// The closed set of requests the entry point accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerRequest {
    ScheduledTrigger,
    Subscribe { email: String },
    Unsubscribe { email: String },
    Preflight,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope {
    RestApi {
        #[serde(rename = "httpMethod")]
        http_method: String,
        #[serde(default)]
        body: Option<String>,
    },
    HttpApi {
        #[serde(rename = "requestContext")]
        request_context: HttpApiContext,
        #[serde(default)]
        body: Option<String>,
    },
    Scheduled {
        source: String,
        #[serde(rename = "detail-type")]
        detail_type: String,
    },
}

#[derive(Debug, Deserialize)]
struct HttpApiContext {
    http: HttpApiMethod,
}

#[derive(Debug, Deserialize)]
struct HttpApiMethod {
    method: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
enum ActionBody {
    Subscribe { email: String },
    Unsubscribe { email: String },
}

/// Lambda proxy style response.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RouterResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// JSON text of `{"message": ...}`.
    pub body: String,
}

impl RouterResponse {
    pub fn new(status_code: u16, message: &str) -> Self {
        let headers = BTreeMap::from([
            ("Access-Control-Allow-Origin".to_string(), "*".to_string()),
            ("Access-Control-Allow-Methods".to_string(), "OPTIONS,POST".to_string()),
            ("Access-Control-Allow-Headers".to_string(), "Content-Type".to_string()),
            ("Content-Type".to_string(), "application/json".to_string()),
        ]);
        Self {
            status_code,
            headers,
            body: serde_json::json!({ "message": message }).to_string(),
        }
    }

    pub fn message(&self) -> Option<String> {
        let v: serde_json::Value = serde_json::from_str(&self.body).ok()?;
        v.get("message")?.as_str().map(str::to_string)
    }
}

impl TriggerRequest {
    /// Client-facing text for a 500. The underlying error is only logged.
    fn failure_message(&self) -> &'static str {
        match self {
            TriggerRequest::ScheduledTrigger => "Content generation failed",
            _ => "Unable to update the subscription; please try again later",
        }
    }
}

/// Decode a raw payload, or explain why it was rejected.
pub fn decode_trigger(payload: &str) -> Result<TriggerRequest, RouterResponse> {
    let envelope: Envelope = serde_json::from_str(payload)
        .map_err(|_| RouterResponse::new(400, "Unrecognized event payload"))?;

    let (method, body) = match envelope {
        Envelope::Scheduled { source, detail_type } => {
            info!(%source, %detail_type, "Scheduled trigger");
            return Ok(TriggerRequest::ScheduledTrigger);
        }
        Envelope::RestApi { http_method, body } => (http_method, body),
        Envelope::HttpApi {
            request_context,
            body,
        } => (request_context.http.method, body),
    };

    match method.to_ascii_uppercase().as_str() {
        "OPTIONS" => return Ok(TriggerRequest::Preflight),
        "POST" => {}
        other => {
            return Err(RouterResponse::new(405, &format!("Method {other} not allowed")));
        }
    }

    let body = body
        .filter(|b| !b.trim().is_empty())
        .ok_or_else(|| RouterResponse::new(400, "Missing request body"))?;
    let action: ActionBody = serde_json::from_str(&body)
        .map_err(|e| RouterResponse::new(400, &format!("Invalid request body: {e}")))?;

    let (request, email) = match action {
        ActionBody::Subscribe { email } => {
            let email = email.trim().to_string();
            (TriggerRequest::Subscribe { email: email.clone() }, email)
        }
        ActionBody::Unsubscribe { email } => {
            let email = email.trim().to_string();
            (TriggerRequest::Unsubscribe { email: email.clone() }, email)
        }
    };
    if !EMAIL_RE.is_match(&email) {
        return Err(RouterResponse::new(400, &format!("Invalid email address: {email}")));
    }
    Ok(request)
}

/// Decode and dispatch one payload.
///
/// `run` performs a content generation run and reports how many articles
/// went out. It is only invoked for scheduled triggers.
#[instrument(level = "info", skip_all)]
pub async fn handle<N, F>(payload: &str, notifier: &N, run: F) -> RouterResponse
where
    N: Notifier,
    F: AsyncFnOnce() -> Result<usize, Box<dyn Error>>,
{
    let request = match decode_trigger(payload) {
        Ok(request) => request,
        Err(response) => {
            warn!(status = response.status_code, body = %response.body, "Rejected trigger payload");
            return response;
        }
    };

    let outcome = match &request {
        TriggerRequest::Preflight => Ok("OK".to_string()),
        TriggerRequest::ScheduledTrigger => run()
            .await
            .map(|count| format!("Content generation complete; {count} articles published")),
        TriggerRequest::Subscribe { email } => subscribe(notifier, email).await,
        TriggerRequest::Unsubscribe { email } => unsubscribe(notifier, email).await,
    };

    match outcome {
        Ok(message) => {
            info!(?request, %message, "Trigger handled");
            RouterResponse::new(200, &message)
        }
        Err(e) => {
            error!(?request, error = %e, "Trigger failed");
            RouterResponse::new(500, request.failure_message())
        }
    }
}

fn find_subscription<'a>(subscriptions: &'a [Subscription], email: &str) -> Option<&'a Subscription> {
    subscriptions
        .iter()
        .find(|s| s.endpoint.eq_ignore_ascii_case(email))
}

/// Existing subscriptions, confirmed or pending, are left alone.
async fn subscribe<N: Notifier>(notifier: &N, email: &str) -> Result<String, Box<dyn Error>> {
    let subscriptions = notifier.list_subscriptions().await?;
    match find_subscription(&subscriptions, email) {
        Some(s) if s.is_pending() => Ok(format!(
            "Subscription for {email} is still pending confirmation; check your inbox"
        )),
        Some(_) => Ok(format!("{email} is already subscribed")),
        None => {
            notifier.subscribe(email).await?;
            Ok(format!(
                "Subscription initiated for {email}; please check your email to confirm"
            ))
        }
    }
}

async fn unsubscribe<N: Notifier>(notifier: &N, email: &str) -> Result<String, Box<dyn Error>> {
    let subscriptions = notifier.list_subscriptions().await?;
    match find_subscription(&subscriptions, email) {
        None => Ok(format!("No active subscription found for {email}")),
        Some(s) if s.is_pending() => Ok(format!(
            "Subscription for {email} is still pending confirmation; no action taken"
        )),
        Some(s) => {
            notifier.unsubscribe(&s.subscription_arn).await?;
            Ok(format!("Successfully unsubscribed {email}"))
        }
    }
}
