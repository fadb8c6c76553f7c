//! Command-line interface definitions for Positive News.
//!
//! Global options may also come from environment variables, which is how the
//! API keys are usually supplied when running outside AWS.

use crate::models::ApiKeys;
use clap::{Parser, Subcommand};

/// Command-line arguments for the Positive News pipeline.
///
/// # Examples
///
/// ```sh
/// # Scheduled run, keys from Secrets Manager
/// positive_news run --config config.yaml
///
/// # Keys from the environment, no secret lookup
/// NEWS_API_KEY=... OPENAI_API_KEY=... positive_news run
///
/// # Dispatch a trigger payload read from stdin
/// echo '{"httpMethod":"OPTIONS"}' | positive_news handle
///
/// # Inside AWS Lambda
/// positive_news lambda
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// AWS region, overriding the config file
    #[arg(long, env = "AWS_REGION", global = true)]
    pub region: Option<String>,

    /// News search API key; skips the secret store when given with --openai-api-key
    #[arg(long, env = "NEWS_API_KEY", hide_env_values = true, global = true)]
    pub news_api_key: Option<String>,

    /// Language model API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    pub openai_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// Run content generation once
    Run,
    /// Decode one trigger payload, dispatch it, and print the JSON response
    Handle {
        /// File holding the payload, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        event: String,
    },
    /// Serve trigger payloads from the AWS Lambda runtime API
    Lambda,
}

impl Cli {
    /// Keys given on the command line or in the environment. Both are needed.
    pub fn api_keys(&self) -> Option<ApiKeys> {
        match (&self.news_api_key, &self.openai_api_key) {
            (Some(news), Some(llm)) => Some(ApiKeys {
                news_api: news.clone(),
                llm: llm.clone(),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["positive_news", "--config", "./config.yaml", "run"]);

        assert_eq!(cli.config.as_deref(), Some("./config.yaml"));
        assert_eq!(cli.command, Command::Run);
    }

    #[test]
    fn test_handle_defaults_to_stdin() {
        let cli = Cli::parse_from(["positive_news", "handle"]);
        assert_eq!(cli.command, Command::Handle { event: "-".to_string() });

        let cli = Cli::parse_from(["positive_news", "handle", "-e", "/tmp/event.json", "-c", "c.yaml"]);
        assert_eq!(cli.command, Command::Handle { event: "/tmp/event.json".to_string() });
        assert_eq!(cli.config.as_deref(), Some("c.yaml"));
    }

    #[test]
    fn test_lambda_subcommand() {
        let cli = Cli::parse_from(["positive_news", "lambda", "--region", "eu-west-1"]);
        assert_eq!(cli.command, Command::Lambda);
        assert_eq!(cli.region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn test_api_keys_need_both() {
        let cli = Cli::parse_from([
            "positive_news",
            "--news-api-key",
            "n",
            "--openai-api-key",
            "o",
            "run",
        ]);
        let keys = cli.api_keys().unwrap();
        assert_eq!(keys.news_api, "n");
        assert_eq!(keys.llm, "o");

        let mut cli = cli;
        cli.openai_api_key = None;
        assert!(cli.api_keys().is_none());
    }
}
