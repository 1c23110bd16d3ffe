//! Webhook sink: POST /webhook
//!
//! A stand-in receiver for local runs. With the default webhook URL pointing
//! here, a single process can be exercised end to end without any external
//! endpoint.

use axum::{extract::rejection::JsonRejection, http::StatusCode, response::Json};
use lapse_core::TimeoutMessage;
use tracing::info;

use super::super::error::Result;

/// POST /webhook - Log a delivered timeout message
pub async fn receive_webhook(
    payload: std::result::Result<Json<TimeoutMessage>, JsonRejection>,
) -> Result<StatusCode> {
    let Json(message) = payload?;
    info!(
        event_id = %message.event_id,
        message = %message.message,
        time_initiated = %message.time_initiated,
        "Received webhook"
    );
    Ok(StatusCode::NO_CONTENT)
}
