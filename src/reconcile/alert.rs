//! Failure alerts posted to a Slack incoming webhook.
//!
//! Alerts are best effort: a failed delivery is logged and then dropped,
//! it never fails the invocation which triggered it.
use async_trait::async_trait;
use serde::Serialize;

/// Message body accepted by the Slack webhook.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AlertMessage {
    pub channel: String,
    pub text: String,
}

/// Result of attempting to deliver an alert.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Delivery {
    Delivered,
    DeliveryFailed,
}

/// Sink for alerts about objects which couldn't be reconciled.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends an alert about `bucket/key`, never failing the caller.
    async fn notify(&self, bucket: &str, key: &str, detail: &str) -> Delivery;
}

/// `Notifier` posting to a Slack webhook.
pub struct SlackNotifier {
    client: reqwest::Client,
    hook_url: String,
    channel: String,
    function_name: String,
    region: String,
}

impl SlackNotifier {
    /// Constructs a new `SlackNotifier` for the running function.
    pub fn new(hook_url: String, channel: String, function_name: String, region: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            hook_url,
            channel,
            function_name,
            region,
        }
    }

    /// Formats a Slack link to the function in the AWS console.
    pub fn console_link(&self) -> String {
        format!(
            "<https://{region}.console.aws.amazon.com/lambda/home?region={region}#/functions/{name}|AWS Console Link>",
            region = self.region,
            name = self.function_name
        )
    }

    /// Builds the alert message for a failure on `bucket/key`.
    pub fn message(&self, bucket: &str, key: &str, detail: &str) -> AlertMessage {
        AlertMessage {
            channel: self.channel.clone(),
            text: format!(
                "*Lambda Name:* *`{}`*\n*Lambda Link:* *{}*\n*S3 Object:* *`{}/{}`*\n*Error:* *`{}`*",
                self.function_name,
                self.console_link(),
                bucket,
                key,
                detail
            ),
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, bucket: &str, key: &str, detail: &str) -> Delivery {
        let message = self.message(bucket, key, detail);

        // post it, treating non-2xx the same as a transport failure
        let result = self
            .client
            .post(self.hook_url.as_str())
            .json(&message)
            .send()
            .await
            .and_then(|response| response.error_for_status());

        match result {
            Ok(_) => {
                info!("Error message posted to Slack channel {}", message.channel);
                Delivery::Delivered
            }
            Err(err) if err.is_status() => {
                error!("Request failed: {}", err);
                Delivery::DeliveryFailed
            }
            Err(err) => {
                error!("Server connection failed: {}", err);
                Delivery::DeliveryFailed
            }
        }
    }
}
