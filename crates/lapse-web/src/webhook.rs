//! HTTP webhook delivery.

use std::time::Duration;

use async_trait::async_trait;
use lapse_core::{TimeoutMessage, WebhookError, WebhookSender};
use tracing::debug;
use url::Url;

use crate::Error;

/// Posts fired events as JSON to a fixed URL. One attempt per event.
#[derive(Debug, Clone)]
pub struct HttpWebhookSender {
    client: reqwest::Client,
    target: Url,
}

impl HttpWebhookSender {
    /// Create a sender for `target` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or the HTTP client cannot be
    /// built.
    pub fn new(target: &str, timeout: Duration) -> Result<Self, Error> {
        let target = Url::parse(target)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, target })
    }

    /// Where messages are delivered.
    #[must_use]
    pub const fn target(&self) -> &Url {
        &self.target
    }
}

#[async_trait]
impl WebhookSender for HttpWebhookSender {
    async fn send(&self, message: &TimeoutMessage) -> Result<(), WebhookError> {
        debug!(event_id = %message.event_id, target = %self.target, "Posting webhook");

        let response = self
            .client
            .post(self.target.clone())
            .json(message)
            .send()
            .await
            .map_err(|e| WebhookError::request_failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(WebhookError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
