//! Error taxonomy for registry operations.
//!
//! Every outcome a caller can observe is an explicit, recoverable variant -
//! nothing in the registry panics or aborts the process.

use thiserror::Error;

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors returned by [`crate::Registry`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Requested or derived duration falls outside `(0, max_timeout]`.
    #[error("invalid duration: {reason}")]
    InvalidDuration { reason: String },

    /// Event identifier was empty.
    #[error("invalid event id: {reason}")]
    InvalidEventId { reason: String },

    /// Register was called for an id that is still live.
    #[error("event '{event_id}' is already registered")]
    DuplicateEvent { event_id: String },

    /// No live event with this id.
    #[error("event '{event_id}' not found")]
    NotFound { event_id: String },

    /// The event's timer has already begun firing.
    #[error("event '{event_id}' is already firing")]
    AlreadyFiring { event_id: String },

    /// The registry could not host a timer.
    #[error("internal error: {reason}")]
    Internal { reason: String },
}

impl RegistryError {
    /// Create an invalid duration error.
    pub fn invalid_duration(reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            reason: reason.into(),
        }
    }

    /// Create an invalid event id error.
    pub fn invalid_event_id(reason: impl Into<String>) -> Self {
        Self::InvalidEventId {
            reason: reason.into(),
        }
    }

    /// Create a duplicate event error.
    pub fn duplicate_event(event_id: impl Into<String>) -> Self {
        Self::DuplicateEvent {
            event_id: event_id.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(event_id: impl Into<String>) -> Self {
        Self::NotFound {
            event_id: event_id.into(),
        }
    }

    /// Create an already firing error.
    pub fn already_firing(event_id: impl Into<String>) -> Self {
        Self::AlreadyFiring {
            event_id: event_id.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal {
            reason: reason.into(),
        }
    }

    /// Stable snake_case code for this error kind, used as the `status`
    /// field of API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidDuration { .. } => "invalid_duration",
            Self::InvalidEventId { .. } => "invalid_event_id",
            Self::DuplicateEvent { .. } => "duplicate_event",
            Self::NotFound { .. } => "not_found",
            Self::AlreadyFiring { .. } => "already_firing",
            Self::Internal { .. } => "internal_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(RegistryError::invalid_duration("x").code(), "invalid_duration");
        assert_eq!(RegistryError::invalid_event_id("x").code(), "invalid_event_id");
        assert_eq!(RegistryError::duplicate_event("a").code(), "duplicate_event");
        assert_eq!(RegistryError::not_found("a").code(), "not_found");
        assert_eq!(RegistryError::already_firing("a").code(), "already_firing");
        assert_eq!(RegistryError::internal("x").code(), "internal_error");
    }

    #[test]
    fn test_error_display_names_the_event() {
        let err = RegistryError::duplicate_event("order-42");
        assert_eq!(err.to_string(), "event 'order-42' is already registered");

        let err = RegistryError::not_found("order-42");
        assert!(err.to_string().contains("order-42"));
    }
}
