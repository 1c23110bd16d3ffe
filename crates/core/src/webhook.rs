//! The outbound notification seam.
//!
//! The registry never talks to the network itself. When an event fires it
//! hands a [`TimeoutMessage`] to whatever [`WebhookSender`] it was built with
//! and only logs the outcome.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Body delivered to the webhook when an event fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutMessage {
    /// Id the event was registered under.
    pub event_id: String,
    /// The `emit` payload supplied at registration.
    pub message: String,
    /// When the event was first registered.
    pub time_initiated: DateTime<Utc>,
}

impl TimeoutMessage {
    /// Create a new timeout message.
    pub fn new(
        event_id: impl Into<String>,
        message: impl Into<String>,
        time_initiated: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            message: message.into(),
            time_initiated,
        }
    }
}

/// Webhook delivery failures. Logged at the fire boundary, never retried.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The request could not be sent or timed out.
    #[error("webhook request failed: {reason}")]
    RequestFailed { reason: String },

    /// The endpoint answered with a non-success status.
    #[error("webhook endpoint answered with status {status}")]
    Rejected { status: u16 },
}

impl WebhookError {
    /// Create a request failed error.
    pub fn request_failed(reason: impl Into<String>) -> Self {
        Self::RequestFailed {
            reason: reason.into(),
        }
    }
}

/// Delivers fired events to the outside world.
#[async_trait]
pub trait WebhookSender: Send + Sync {
    /// Make a single delivery attempt.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError`] when delivery fails.
    async fn send(&self, message: &TimeoutMessage) -> Result<(), WebhookError>;
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timeout_message_wire_format() {
        let initiated = Utc.with_ymd_and_hms(2026, 2, 7, 12, 0, 0).unwrap();
        let message = TimeoutMessage::new("order-42", "expired", initiated);

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["event_id"], "order-42");
        assert_eq!(json["message"], "expired");
        assert_eq!(json["time_initiated"], "2026-02-07T12:00:00Z");
    }

    #[test]
    fn test_webhook_error_display() {
        let err = WebhookError::Rejected { status: 503 };
        assert!(err.to_string().contains("503"));

        let err = WebhookError::request_failed("connection refused");
        assert!(err.to_string().contains("connection refused"));
    }
}
