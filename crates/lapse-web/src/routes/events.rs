//! Event endpoints: POST /register, POST /cancel, POST /remaining, POST /extend
//!
//! Each handler decodes one JSON record, makes exactly one registry call, and
//! encodes the outcome. Refusals are rendered by [`AppError`] with the same
//! `{event_id, status, message}` shape.

use std::time::Duration;

use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use chrono::TimeDelta;
use lapse_core::RegistryError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::super::error::{AppError, Result};
use super::super::state::AppState;

/// Request payload for registering an event
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    event_id: String,
    timeout_seconds: i64,
    #[serde(default)]
    emit: String,
}

/// Response for an accepted registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    event_id: String,
    status: &'static str,
}

/// Request payload naming an event
#[derive(Debug, Deserialize)]
pub struct EventRequest {
    event_id: String,
}

/// Response for cancellation
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    event_id: String,
    status: &'static str,
    message: String,
}

/// Response for a remaining-time query
#[derive(Debug, Serialize)]
pub struct RemainingResponse {
    event_id: String,
    status: &'static str,
    /// Seconds until the event fires; negative while it is firing.
    time_remaining: f64,
}

/// Request payload for extending an event
#[derive(Debug, Deserialize)]
pub struct ExtendRequest {
    event_id: String,
    #[serde(alias = "timeout_seconds")]
    extra_timeout_seconds: i64,
}

/// Response for extension
#[derive(Debug, Serialize)]
pub struct ExtendResponse {
    event_id: String,
    status: &'static str,
    message: String,
}

/// POST /register - Register a new event
pub async fn register_event(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let Json(req) = payload?;
    debug!(event_id = %req.event_id, timeout_seconds = req.timeout_seconds, "Register requested");

    let registration = whole_seconds(req.timeout_seconds)
        .and_then(|timeout| state.registry.register(req.event_id.as_str(), timeout, req.emit))
        .map_err(|e| AppError::registry(&req.event_id, e))?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            event_id: registration.event_id,
            status: "accepted",
        }),
    ))
}

/// POST /cancel - Cancel a pending event
pub async fn cancel_event(
    State(state): State<AppState>,
    payload: std::result::Result<Json<EventRequest>, JsonRejection>,
) -> Result<Json<CancelResponse>> {
    let Json(req) = payload?;
    debug!(event_id = %req.event_id, "Cancel requested");

    state
        .registry
        .cancel(&req.event_id)
        .map_err(|e| AppError::registry(&req.event_id, e))?;

    Ok(Json(CancelResponse {
        message: format!("Event {} cancelled", req.event_id),
        event_id: req.event_id,
        status: "cancelled",
    }))
}

/// POST /remaining - Query time left before an event fires
pub async fn remaining_time(
    State(state): State<AppState>,
    payload: std::result::Result<Json<EventRequest>, JsonRejection>,
) -> Result<Json<RemainingResponse>> {
    let Json(req) = payload?;

    let remaining = state
        .registry
        .remaining(&req.event_id)
        .map_err(|e| AppError::registry(&req.event_id, e))?;

    Ok(Json(RemainingResponse {
        event_id: req.event_id,
        status: if remaining < TimeDelta::zero() {
            "firing"
        } else {
            "pending"
        },
        time_remaining: as_seconds(remaining),
    }))
}

/// POST /extend - Push a pending event's deadline out
pub async fn extend_event(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ExtendRequest>, JsonRejection>,
) -> Result<Json<ExtendResponse>> {
    let Json(req) = payload?;
    debug!(
        event_id = %req.event_id,
        extra_timeout_seconds = req.extra_timeout_seconds,
        "Extend requested"
    );

    let extension = state
        .registry
        .extend(&req.event_id, extra_seconds(req.extra_timeout_seconds))
        .map_err(|e| AppError::registry(&req.event_id, e))?;

    Ok(Json(ExtendResponse {
        message: format!(
            "Event {} now fires in {}s",
            extension.event_id,
            extension.duration.as_secs_f64()
        ),
        event_id: extension.event_id,
        status: "extended",
    }))
}

/// Convert a client-supplied second count; negatives are invalid durations.
fn whole_seconds(secs: i64) -> std::result::Result<Duration, RegistryError> {
    u64::try_from(secs)
        .map(Duration::from_secs)
        .map_err(|_| RegistryError::invalid_duration(format!("{secs}s is negative")))
}

/// Extensions are validated by the registry after the event lookup, so a
/// negative count becomes zero and is refused there.
fn extra_seconds(secs: i64) -> Duration {
    u64::try_from(secs).map_or(Duration::ZERO, Duration::from_secs)
}

#[allow(clippy::cast_precision_loss)]
fn as_seconds(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_seconds_rejects_negatives() {
        assert_eq!(whole_seconds(0), Ok(Duration::ZERO));
        assert_eq!(whole_seconds(90), Ok(Duration::from_secs(90)));
        assert!(matches!(
            whole_seconds(-1),
            Err(RegistryError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_extra_seconds_clamps_negatives_to_zero() {
        assert_eq!(extra_seconds(30), Duration::from_secs(30));
        assert_eq!(extra_seconds(0), Duration::ZERO);
        assert_eq!(extra_seconds(-5), Duration::ZERO);
    }

    #[test]
    fn test_as_seconds_keeps_sign() {
        assert!((as_seconds(TimeDelta::milliseconds(7500)) - 7.5).abs() < f64::EPSILON);
        assert!((as_seconds(TimeDelta::milliseconds(-250)) + 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_extend_request_accepts_legacy_field_name() {
        let req: std::result::Result<ExtendRequest, _> =
            serde_json::from_str(r#"{"event_id": "a", "timeout_seconds": 30}"#);
        assert!(matches!(req, Ok(ExtendRequest { extra_timeout_seconds: 30, .. })));
    }
}
