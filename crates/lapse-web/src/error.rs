//! Mapping of registry outcomes to HTTP responses.
//!
//! Every failure is rendered with the same JSON shape the success responses
//! use: `{event_id, status, message}`, where `status` is a stable snake_case
//! code.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use lapse_core::RegistryError;
use serde::Serialize;

pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The request body could not be decoded.
    #[error("invalid request: {0}")]
    BadRequest(String),

    /// A registry operation was refused.
    #[error("{source}")]
    Registry {
        event_id: String,
        #[source]
        source: RegistryError,
    },
}

impl AppError {
    /// Attach the request's event id to a registry error.
    pub fn registry(event_id: impl Into<String>, source: RegistryError) -> Self {
        Self::Registry {
            event_id: event_id.into(),
            source,
        }
    }

    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Registry { source, .. } => match source {
                RegistryError::InvalidDuration { .. } | RegistryError::InvalidEventId { .. } => {
                    StatusCode::BAD_REQUEST
                }
                RegistryError::DuplicateEvent { .. } | RegistryError::AlreadyFiring { .. } => {
                    StatusCode::CONFLICT
                }
                RegistryError::NotFound { .. } => StatusCode::NOT_FOUND,
                RegistryError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Code reported in the `status` field.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Registry { source, .. } => source.code(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Error body shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    event_id: Option<String>,
    status: &'static str,
    message: String,
}

impl ErrorResponse {
    pub fn from_error(err: &AppError) -> Self {
        let event_id = match err {
            AppError::BadRequest(_) => None,
            AppError::Registry { event_id, .. } => Some(event_id.clone()),
        };

        Self {
            event_id,
            status: err.code(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let response = ErrorResponse::from_error(&self);
        (status, Json(response)).into_response()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_registry_errors_map_to_status_codes() {
        let cases = [
            (RegistryError::invalid_duration("x"), StatusCode::BAD_REQUEST),
            (RegistryError::invalid_event_id("x"), StatusCode::BAD_REQUEST),
            (RegistryError::duplicate_event("a"), StatusCode::CONFLICT),
            (RegistryError::already_firing("a"), StatusCode::CONFLICT),
            (RegistryError::not_found("a"), StatusCode::NOT_FOUND),
            (RegistryError::internal("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (source, expected) in cases {
            assert_eq!(AppError::registry("a", source).status_code(), expected);
        }
    }

    #[test]
    fn test_error_response_carries_event_id_and_code() {
        let err = AppError::registry("order-1", RegistryError::not_found("order-1"));
        let json = serde_json::to_value(ErrorResponse::from_error(&err)).unwrap();

        assert_eq!(json["event_id"], "order-1");
        assert_eq!(json["status"], "not_found");
        assert_eq!(json["message"], "event 'order-1' not found");
    }

    #[test]
    fn test_bad_request_omits_event_id() {
        let err = AppError::BadRequest("missing field `event_id`".to_string());
        let json = serde_json::to_value(ErrorResponse::from_error(&err)).unwrap();

        assert!(json.get("event_id").is_none());
        assert_eq!(json["status"], "bad_request");
    }
}
