//! DynamoDB article table.
//!
//! Items are keyed by `url` and carry `Title`, `Excerpt`, `StoredAt`
//! (RFC 3339, UTC, whole seconds) and a numeric `ttl` the table expires on.
//! RFC 3339 strings in the same zone sort lexically, which is what the
//! `StoredAt >= :date` scan filter relies on.

use crate::models::StoredArticleRecord;
use crate::store::ArticleStore;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use tracing::{debug, instrument};

pub struct DynamoArticleStore {
    client: Client,
    table: String,
}

impl DynamoArticleStore {
    pub fn new(client: Client, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
        }
    }
}

fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Attribute map written for one record.
pub fn record_item(record: &StoredArticleRecord) -> HashMap<String, AttributeValue> {
    HashMap::from([
        ("url".to_string(), AttributeValue::S(record.url.clone())),
        ("Title".to_string(), AttributeValue::S(record.title.clone())),
        ("Excerpt".to_string(), AttributeValue::S(record.excerpt.clone())),
        ("StoredAt".to_string(), AttributeValue::S(timestamp(record.stored_at))),
        ("ttl".to_string(), AttributeValue::N(record.ttl.to_string())),
    ])
}

impl ArticleStore for DynamoArticleStore {
    #[instrument(level = "info", skip(self), fields(table = %self.table))]
    async fn recent_urls(&self, since: DateTime<Utc>) -> Result<HashSet<String>, Box<dyn Error>> {
        let since = timestamp(since);
        let mut urls = HashSet::new();
        let mut start_key: Option<HashMap<String, AttributeValue>> = None;
        let mut pages = 0u32;

        loop {
            // `url` is a reserved word, hence the name placeholder.
            let out = self
                .client
                .scan()
                .table_name(&self.table)
                .filter_expression("StoredAt >= :date")
                .projection_expression("#u")
                .expression_attribute_names("#u", "url")
                .expression_attribute_values(":date", AttributeValue::S(since.clone()))
                .set_exclusive_start_key(start_key.take())
                .send()
                .await
                .map_err(|e| format!("scan of {} failed: {}", self.table, DisplayErrorContext(&e)))?;
            pages += 1;

            for item in out.items() {
                if let Some(AttributeValue::S(url)) = item.get("url") {
                    urls.insert(url.clone());
                }
            }

            match out.last_evaluated_key() {
                Some(key) if !key.is_empty() => start_key = Some(key.clone()),
                _ => break,
            }
        }

        debug!(pages, count = urls.len(), "Scan complete");
        Ok(urls)
    }

    async fn put(&self, record: &StoredArticleRecord) -> Result<(), Box<dyn Error>> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(record_item(record)))
            .send()
            .await
            .map_err(|e| format!("put of {} failed: {}", record.url, DisplayErrorContext(&e)))?;
        Ok(())
    }
}
