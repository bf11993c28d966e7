use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::info;

/// Transport for the `push` channel. Other channels have no transport and
/// are only logged.
#[async_trait]
pub trait PushGateway: Send + Sync + 'static {
    async fn push(&self, recipient_id: &str, title: &str, body: &str) -> Result<()>;
}

/// Emits the push as a structured log line. Used when no webhook is configured.
#[derive(Debug, Default)]
pub struct TracingPushGateway;

#[async_trait]
impl PushGateway for TracingPushGateway {
    async fn push(&self, recipient_id: &str, title: &str, body: &str) -> Result<()> {
        info!(recipient_id, title, body, "push notification");
        Ok(())
    }
}

/// Forwards pushes to an HTTP endpoint that fans out to devices.
pub struct WebhookPushGateway {
    client: Client,
    url: String,
}

impl WebhookPushGateway {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build push webhook client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PushGateway for WebhookPushGateway {
    async fn push(&self, recipient_id: &str, title: &str, body: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({
                "recipientId": recipient_id,
                "title": title,
                "body": body,
            }))
            .send()
            .await
            .context("push webhook request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("push webhook returned status {status}");
        }
        Ok(())
    }
}
