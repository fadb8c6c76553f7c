//! SNS topic carrying the digest to email subscribers.

use crate::publish::{Notifier, Subscription};
use aws_sdk_sns::Client;
use aws_sdk_sns::error::DisplayErrorContext;
use std::error::Error;
use tracing::{debug, info, instrument};

pub struct SnsNotifier {
    client: Client,
    topic_arn: String,
}

impl SnsNotifier {
    pub fn new(client: Client, topic_arn: &str) -> Self {
        Self {
            client,
            topic_arn: topic_arn.to_string(),
        }
    }
}

impl Notifier for SnsNotifier {
    #[instrument(level = "info", skip(self, message), fields(topic = %self.topic_arn, bytes = message.len()))]
    async fn publish(&self, subject: &str, message: &str) -> Result<(), Box<dyn Error>> {
        let out = self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(subject)
            .message(message)
            .send()
            .await
            .map_err(|e| format!("failed to publish to {}: {}", self.topic_arn, DisplayErrorContext(&e)))?;
        info!(message_id = out.message_id().unwrap_or_default(), "Published message");
        Ok(())
    }

    async fn subscribe(&self, email: &str) -> Result<(), Box<dyn Error>> {
        self.client
            .subscribe()
            .topic_arn(&self.topic_arn)
            .protocol("email")
            .endpoint(email)
            .send()
            .await
            .map_err(|e| format!("failed to subscribe {email}: {}", DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn list_subscriptions(&self) -> Result<Vec<Subscription>, Box<dyn Error>> {
        let mut subscriptions = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let out = self
                .client
                .list_subscriptions_by_topic()
                .topic_arn(&self.topic_arn)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| format!("failed to list subscriptions: {}", DisplayErrorContext(&e)))?;

            subscriptions.extend(out.subscriptions().iter().filter_map(|s| {
                Some(Subscription {
                    endpoint: s.endpoint()?.to_string(),
                    subscription_arn: s.subscription_arn()?.to_string(),
                })
            }));

            match out.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        debug!(count = subscriptions.len(), "Listed subscriptions");
        Ok(subscriptions)
    }

    async fn unsubscribe(&self, subscription_arn: &str) -> Result<(), Box<dyn Error>> {
        self.client
            .unsubscribe()
            .subscription_arn(subscription_arn)
            .send()
            .await
            .map_err(|e| format!("failed to unsubscribe {subscription_arn}: {}", DisplayErrorContext(&e)))?;
        Ok(())
    }
}
