//! API key retrieval.

use crate::config::SecretsConfig;
use crate::models::ApiKeys;
use aws_sdk_secretsmanager::Client;
use aws_sdk_secretsmanager::error::DisplayErrorContext;
use serde_json::Value;
use std::collections::HashMap;
use std::error::Error;
use tracing::{info, instrument};

/// Where the news API and language model keys come from.
pub trait SecretSource {
    async fn api_keys(&self) -> Result<ApiKeys, Box<dyn Error>>;
}

/// Keys stored as one JSON object in a Secrets Manager secret.
pub struct SecretsManagerSource {
    client: Client,
    config: SecretsConfig,
}

impl SecretsManagerSource {
    pub fn new(client: Client, config: SecretsConfig) -> Self {
        Self { client, config }
    }
}

impl SecretSource for SecretsManagerSource {
    #[instrument(level = "info", skip(self), fields(secret = %self.config.secret_name))]
    async fn api_keys(&self) -> Result<ApiKeys, Box<dyn Error>> {
        let out = self
            .client
            .get_secret_value()
            .secret_id(&self.config.secret_name)
            .send()
            .await
            .map_err(|e| {
                format!(
                    "failed to retrieve secret {}: {}",
                    self.config.secret_name,
                    DisplayErrorContext(&e)
                )
            })?;
        let Some(secret) = out.secret_string() else {
            return Err(format!("secret {} has no string value", self.config.secret_name).into());
        };
        let keys = parse_api_keys(secret, &self.config)?;
        info!("Retrieved API keys");
        Ok(keys)
    }
}

/// Pull both keys out of the secret's JSON object.
pub fn parse_api_keys(secret: &str, config: &SecretsConfig) -> Result<ApiKeys, Box<dyn Error>> {
    let map: HashMap<String, Value> =
        serde_json::from_str(secret).map_err(|e| format!("secret is not a JSON object: {e}"))?;
    let field = |name: &str| -> Result<String, Box<dyn Error>> {
        match map.get(name) {
            Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
            _ => Err(format!("secret has no usable {name}").into()),
        }
    };
    Ok(ApiKeys {
        news_api: field(&config.news_api_key_field)?,
        llm: field(&config.llm_key_field)?,
    })
}

/// Keys handed in directly, e.g. from the command line or environment.
pub struct StaticSecrets {
    keys: ApiKeys,
}

impl StaticSecrets {
    pub fn new(keys: ApiKeys) -> Self {
        Self { keys }
    }
}

impl SecretSource for StaticSecrets {
    async fn api_keys(&self) -> Result<ApiKeys, Box<dyn Error>> {
        Ok(self.keys.clone())
    }
}

/// Either source, picked at startup.
pub enum ConfiguredSecrets {
    Static(StaticSecrets),
    Manager(SecretsManagerSource),
}

impl SecretSource for ConfiguredSecrets {
    async fn api_keys(&self) -> Result<ApiKeys, Box<dyn Error>> {
        match self {
            ConfiguredSecrets::Static(s) => s.api_keys().await,
            ConfiguredSecrets::Manager(s) => s.api_keys().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_keys() {
        let secret = r#"{"NEWS_API_KEY":"news-123","OPENAI_API_KEY":"sk-456","OTHER":1}"#;
        let keys = parse_api_keys(secret, &SecretsConfig::default()).unwrap();
        assert_eq!(keys.news_api, "news-123");
        assert_eq!(keys.llm, "sk-456");
    }

    #[test]
    fn test_missing_key_is_an_error() {
        let secret = r#"{"NEWS_API_KEY":"news-123"}"#;
        let err = parse_api_keys(secret, &SecretsConfig::default()).unwrap_err();
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_custom_field_names() {
        let config = SecretsConfig {
            news_api_key_field: "news".to_string(),
            llm_key_field: "llm".to_string(),
            ..SecretsConfig::default()
        };
        let keys = parse_api_keys(r#"{"news":"a","llm":"b"}"#, &config).unwrap();
        assert_eq!(keys.llm, "b");
    }

    #[test]
    fn test_non_json_secret() {
        assert!(parse_api_keys("plain text", &SecretsConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_static_source() {
        let keys = ApiKeys {
            news_api: "n".to_string(),
            llm: "l".to_string(),
        };
        let source = ConfiguredSecrets::Static(StaticSecrets::new(keys.clone()));
        assert_eq!(source.api_keys().await.unwrap(), keys);
    }
}
