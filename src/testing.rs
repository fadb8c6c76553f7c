//! In-memory fakes of every external service, for unit tests.

use crate::api::AskAsync;
use crate::cloud::secrets::SecretSource;
use crate::models::{ApiKeys, CandidateArticle, Category, RankedResult, RawArticle, StoredArticleRecord};
use crate::publish::{Notifier, ObjectStore, Subscription};
use crate::scrapers::{ContentExtractor, NewsSearch};
use crate::store::ArticleStore;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::sync::Mutex;
use std::time::Duration as StdDuration;

pub fn raw(url: &str) -> RawArticle {
    RawArticle {
        title: Some(format!("Title {url}")),
        description: None,
        url: url.to_string(),
        url_to_image: None,
    }
}

/// `n` distinct words: `w0 w1 ... w{n-1}`.
pub fn words(n: usize) -> String {
    (0..n).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ")
}

pub fn candidate(url: &str) -> CandidateArticle {
    CandidateArticle {
        title: format!("Title {url}"),
        url: url.to_string(),
        excerpt: words(50),
        image_url: None,
    }
}

pub fn ranked(rank: u32, url: &str) -> RankedResult {
    RankedResult {
        rank,
        title: format!("Title {url}"),
        url: url.to_string(),
        category: Category::Science,
    }
}

/// Serves canned pages; pages past the end come back empty.
#[derive(Default)]
pub struct FakeSearch {
    pages: Vec<Vec<RawArticle>>,
    error: Option<String>,
    calls: Mutex<Vec<u32>>,
}

impl FakeSearch {
    pub fn pages(pages: Vec<Vec<RawArticle>>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            error: Some(msg.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<u32> {
        self.calls.lock().unwrap().clone()
    }
}

impl NewsSearch for FakeSearch {
    async fn fetch_page(&self, _api_key: &str, page: u32) -> Result<Vec<RawArticle>, Box<dyn Error>> {
        self.calls.lock().unwrap().push(page);
        if let Some(e) = &self.error {
            return Err(e.clone().into());
        }
        Ok(self
            .pages
            .get(page as usize - 1)
            .cloned()
            .unwrap_or_default())
    }
}

pub struct FakeExtractor {
    default_body: String,
    bodies: HashMap<String, String>,
    broken: HashSet<String>,
    requested: Mutex<Vec<String>>,
}

impl FakeExtractor {
    /// Every URL yields `body` unless overridden.
    pub fn uniform(body: String) -> Self {
        Self {
            default_body: body,
            bodies: HashMap::new(),
            broken: HashSet::new(),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, url: &str, body: String) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }

    pub fn failing(mut self, url: &str) -> Self {
        self.broken.insert(url.to_string());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl ContentExtractor for FakeExtractor {
    async fn extract(&self, url: &str) -> Result<String, Box<dyn Error>> {
        self.requested.lock().unwrap().push(url.to_string());
        if self.broken.contains(url) {
            return Err(format!("connection reset fetching {url}").into());
        }
        Ok(self
            .bodies
            .get(url)
            .cloned()
            .unwrap_or_else(|| self.default_body.clone()))
    }
}

#[derive(Debug)]
pub struct FakeLlm {
    reply: Result<String, String>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl FakeLlm {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            reply: Err(msg.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// `(system, prompt)` for every call so far.
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.prompts.lock().unwrap().clone()
    }
}

impl AskAsync for FakeLlm {
    type Response = String;

    async fn ask(&self, system: &str, prompt: &str) -> Result<String, Box<dyn Error>> {
        self.prompts
            .lock()
            .unwrap()
            .push((system.to_string(), prompt.to_string()));
        self.reply.clone().map_err(Into::into)
    }
}

#[derive(Default)]
pub struct FakeStore {
    records: Mutex<Vec<StoredArticleRecord>>,
    fail_lookup: bool,
    fail_put: HashSet<String>,
}

impl FakeStore {
    pub fn seed(&self, url: &str, stored_at: DateTime<Utc>) {
        self.records.lock().unwrap().push(StoredArticleRecord {
            url: url.to_string(),
            title: format!("Title {url}"),
            excerpt: words(50),
            stored_at,
            ttl: stored_at.timestamp() + 182 * 86_400,
        });
    }

    pub fn failing_lookup(mut self) -> Self {
        self.fail_lookup = true;
        self
    }

    pub fn failing_put(mut self, url: &str) -> Self {
        self.fail_put.insert(url.to_string());
        self
    }

    pub fn records(&self) -> Vec<StoredArticleRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl ArticleStore for FakeStore {
    async fn recent_urls(&self, since: DateTime<Utc>) -> Result<HashSet<String>, Box<dyn Error>> {
        if self.fail_lookup {
            return Err("table scan throttled".into());
        }
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.stored_at >= since)
            .map(|r| r.url.clone())
            .collect())
    }

    async fn put(&self, record: &StoredArticleRecord) -> Result<(), Box<dyn Error>> {
        if self.fail_put.contains(&record.url) {
            return Err(format!("conditional write failed for {}", record.url).into());
        }
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }
}

/// Objects keyed by `(bucket, key)` with their content type.
#[derive(Default)]
pub struct FakeObjects {
    objects: Mutex<HashMap<(String, String), (Vec<u8>, String)>>,
    fail_put: bool,
    fail_presign: bool,
}

impl FakeObjects {
    pub fn failing_put(mut self) -> Self {
        self.fail_put = true;
        self
    }

    pub fn failing_presign(mut self) -> Self {
        self.fail_presign = true;
        self
    }

    pub fn insert(&self, bucket: &str, key: &str, body: Vec<u8>) {
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            (body, "application/octet-stream".to_string()),
        );
    }

    pub fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|(body, _)| body.clone())
    }

    pub fn content_type(&self, bucket: &str, key: &str) -> Option<String> {
        self.objects
            .lock()
            .unwrap()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|(_, ct)| ct.clone())
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .unwrap()
            .keys()
            .map(|(_, key)| key.clone())
            .collect()
    }
}

impl ObjectStore for FakeObjects {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), Box<dyn Error>> {
        if self.fail_put {
            return Err("access denied".into());
        }
        self.objects.lock().unwrap().insert(
            (bucket.to_string(), key.to_string()),
            (body, content_type.to_string()),
        );
        Ok(())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, Box<dyn Error>> {
        self.get(bucket, key)
            .ok_or_else(|| format!("no such key: {key}").into())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: StdDuration,
    ) -> Result<String, Box<dyn Error>> {
        if self.fail_presign {
            return Err("missing credentials".into());
        }
        Ok(format!(
            "https://{bucket}.objects.test/{key}?expires={}",
            expires_in.as_secs()
        ))
    }
}

#[derive(Default)]
pub struct FakeNotifier {
    published: Mutex<Vec<(String, String)>>,
    subscriptions: Mutex<Vec<Subscription>>,
    removed: Mutex<Vec<String>>,
    fail_publish: bool,
    fail_list: bool,
}

impl FakeNotifier {
    pub fn with_subscription(self, email: &str, arn: &str) -> Self {
        self.subscriptions.lock().unwrap().push(Subscription {
            endpoint: email.to_string(),
            subscription_arn: arn.to_string(),
        });
        self
    }

    pub fn failing_publish(mut self) -> Self {
        self.fail_publish = true;
        self
    }

    pub fn failing_list(mut self) -> Self {
        self.fail_list = true;
        self
    }

    /// `(subject, message)` for every publish so far.
    pub fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    pub fn subscriptions(&self) -> Vec<Subscription> {
        self.subscriptions.lock().unwrap().clone()
    }

    /// Subscription ARNs passed to `unsubscribe`.
    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

impl Notifier for FakeNotifier {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), Box<dyn Error>> {
        if self.fail_publish {
            return Err("topic does not exist".into());
        }
        self.published
            .lock()
            .unwrap()
            .push((subject.to_string(), message.to_string()));
        Ok(())
    }

    async fn subscribe(&self, email: &str) -> Result<(), Box<dyn Error>> {
        self.subscriptions.lock().unwrap().push(Subscription {
            endpoint: email.to_string(),
            subscription_arn: Subscription::PENDING.to_string(),
        });
        Ok(())
    }

    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, Box<dyn Error>> {
        if self.fail_list {
            return Err("throttled".into());
        }
        Ok(self.subscriptions())
    }

    async fn unsubscribe(&self, subscription_arn: &str) -> Result<(), Box<dyn Error>> {
        self.subscriptions
            .lock()
            .unwrap()
            .retain(|s| s.subscription_arn != subscription_arn);
        self.removed.lock().unwrap().push(subscription_arn.to_string());
        Ok(())
    }
}

pub struct FakeSecrets {
    keys: Option<ApiKeys>,
}

impl FakeSecrets {
    pub fn ok() -> Self {
        Self {
            keys: Some(ApiKeys {
                news_api: "news-key".to_string(),
                llm: "llm-key".to_string(),
            }),
        }
    }

    pub fn failing() -> Self {
        Self { keys: None }
    }
}

impl SecretSource for FakeSecrets {
    async fn api_keys(&self) -> Result<ApiKeys, Box<dyn Error>> {
        self.keys
            .clone()
            .ok_or_else(|| "secret not found".into())
    }
}
