//! Language model access: the [`AskAsync`] seam, an OpenAI-compatible chat
//! client, and an optional retry wrapper that is off unless configured.

use rand::{Rng, rng};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

use crate::utils::truncate_for_log;

/// Trait for async LLM interaction.
///
/// Implementors send a system framing and a user prompt to a model and hand
/// back its reply. Decorators such as [`RetryAsk`] implement it too.
pub trait AskAsync {
    /// The type of response returned by the LLM.
    type Response;

    /// Send one completion request.
    ///
    /// # Arguments
    ///
    /// * `system` - The system role framing
    /// * `prompt` - The user message
    async fn ask(&self, system: &str, prompt: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Re-issues a failed completion call.
///
/// Configured from `llm.max_retries`, which is 0 unless set: the first error
/// then comes straight back and the run aborts. See [`RetryAsk::backoff`] for
/// the pause between calls when retries are on.
pub struct RetryAsk<T> {
    inner: T,
    max_retries: usize,
    base_delay: StdDuration,
    max_delay: StdDuration,
}

impl<T> RetryAsk<T> {
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    /// Pause after the `failures`-th failed call: `base_delay` doubled per
    /// earlier failure, capped at `max_delay`, plus up to 250ms of jitter.
    fn backoff(&self, failures: usize) -> StdDuration {
        let doublings = failures.saturating_sub(1).min(16) as u32;
        let delay = self.base_delay.saturating_mul(1 << doublings).min(self.max_delay);
        delay + StdDuration::from_millis(rng().random_range(0..=250))
    }
}

impl<T> fmt::Debug for RetryAsk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAsk")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T: AskAsync> AskAsync for RetryAsk<T> {
    type Response = T::Response;

    #[instrument(level = "info", skip_all, fields(max_retries = self.max_retries))]
    async fn ask(&self, system: &str, prompt: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let mut failures = 0usize;

        loop {
            let delay = match self.inner.ask(system, prompt).await {
                Ok(resp) => return Ok(resp),
                Err(e) if failures >= self.max_retries => {
                    if self.max_retries > 0 {
                        error!(
                            calls = failures + 1,
                            elapsed_ms = t0.elapsed().as_millis(),
                            error = %e,
                            "Model call still failing; giving up"
                        );
                    }
                    return Err(e);
                }
                Err(e) => {
                    failures += 1;
                    let delay = self.backoff(failures);
                    warn!(failures, ?delay, error = %e, "Model call failed; retrying");
                    delay
                }
            };
            sleep(delay).await;
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatResponseChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible chat completion endpoint.
pub struct OpenAiChat {
    client: Client,
    api_base: String,
    model: String,
    api_key: String,
}

impl OpenAiChat {
    pub fn new(client: Client, api_base: &str, model: &str, api_key: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

impl fmt::Debug for OpenAiChat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiChat")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl AskAsync for OpenAiChat {
    type Response = String;

    #[instrument(level = "info", skip_all, fields(model = %self.model))]
    async fn ask(&self, system: &str, prompt: &str) -> Result<Self::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let req = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let res = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| format!("chat completion request failed: {e}"))?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(elapsed_ms = t0.elapsed().as_millis(), %status, "API call failed");
            return Err(format!(
                "chat completion HTTP error {status}: {}",
                truncate_for_log(&body, 500)
            )
            .into());
        }

        let out: ChatResponse = res
            .json()
            .await
            .map_err(|e| format!("failed to decode chat completion response: {e}"))?;
        let Some(content) = out.choices.into_iter().next().and_then(|c| c.message.content) else {
            return Err("chat completion returned no choices".into());
        };

        info!(elapsed_ms = t0.elapsed().as_millis(), bytes = content.len(), "Chat completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Flaky {
        failures: usize,
        calls: AtomicUsize,
    }

    impl AskAsync for Flaky {
        type Response = String;

        async fn ask(&self, _system: &str, prompt: &str) -> Result<String, Box<dyn Error>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(format!("failure {n}").into())
            } else {
                Ok(format!("echo: {prompt}"))
            }
        }
    }

    #[tokio::test]
    async fn test_zero_retries_makes_one_call() {
        let api = RetryAsk::new(
            Flaky { failures: 1, calls: AtomicUsize::new(0) },
            0,
            StdDuration::ZERO,
        );
        let err = api.ask("sys", "hi").await.unwrap_err();
        assert_eq!(err.to_string(), "failure 0");
        assert_eq!(api.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_recovers_after_failures() {
        let api = RetryAsk::new(
            Flaky { failures: 2, calls: AtomicUsize::new(0) },
            2,
            StdDuration::ZERO,
        );
        let out = api.ask("sys", "hi").await.unwrap();
        assert_eq!(out, "echo: hi");
        assert_eq!(api.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retries_give_up_with_last_error() {
        let api = RetryAsk::new(
            Flaky { failures: 5, calls: AtomicUsize::new(0) },
            2,
            StdDuration::ZERO,
        );
        let err = api.ask("sys", "hi").await.unwrap_err();
        assert_eq!(err.to_string(), "failure 2");
        assert_eq!(api.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        let api = RetryAsk::new((), 5, StdDuration::from_secs(4));
        let jitter = StdDuration::from_millis(250);

        for (failures, expected) in [(1, 4), (2, 8), (3, 16), (4, 30), (40, 30)] {
            let delay = api.backoff(failures);
            let expected = StdDuration::from_secs(expected);
            assert!(delay >= expected && delay <= expected + jitter, "{failures}: {delay:?}");
        }
    }

    #[test]
    fn test_chat_request_shape() {
        let req = ChatRequest {
            model: "gpt-4",
            messages: vec![
                ChatMessage { role: "system", content: "s" },
                ChatMessage { role: "user", content: "u" },
            ],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["model"], "gpt-4");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "u");
    }

    #[test]
    fn test_chat_response_first_choice() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"[]"},"finish_reason":"stop"}]}"#;
        let out: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(out.choices[0].message.content.as_deref(), Some("[]"));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let chat = OpenAiChat::new(Client::new(), "https://api.openai.com/v1/", "gpt-4", "sk-secret");
        let dbg = format!("{chat:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("https://api.openai.com/v1\""));
    }
}
