//! Registry policy configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{RegistryError, Result};

/// Upper bound on any event's countdown: two hours.
pub const DEFAULT_MAX_TIMEOUT: Duration = Duration::from_secs(60 * 120);

/// Rejected registry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A zero upper bound would refuse every registration.
    #[error("max_timeout_secs must be greater than 0")]
    ZeroMaxTimeout,
}

/// Policy bounds applied by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Largest accepted countdown, both for Register and after Extend.
    #[serde(
        rename = "max_timeout_secs",
        with = "duration_secs",
        default = "default_max_timeout"
    )]
    pub max_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_timeout: default_max_timeout(),
        }
    }
}

impl RegistryConfig {
    /// Create a config with the given upper bound.
    #[must_use]
    pub const fn with_max_timeout(max_timeout: Duration) -> Self {
        Self { max_timeout }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroMaxTimeout`] if `max_timeout` is zero.
    pub const fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.max_timeout.is_zero() {
            return Err(ConfigError::ZeroMaxTimeout);
        }
        Ok(())
    }

    /// Check that `duration` lies within `(0, max_timeout]`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::InvalidDuration`] when it does not.
    pub fn check_duration(&self, duration: Duration) -> Result<()> {
        if duration.is_zero() {
            return Err(RegistryError::invalid_duration(
                "duration must be greater than 0",
            ));
        }
        if duration > self.max_timeout {
            return Err(RegistryError::invalid_duration(format!(
                "duration of {}s exceeds the maximum of {}s",
                duration.as_secs_f64(),
                self.max_timeout.as_secs()
            )));
        }
        Ok(())
    }
}

const fn default_max_timeout() -> Duration {
    DEFAULT_MAX_TIMEOUT
}

/// Serialization helper for Duration as whole seconds.
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    /// Serialize a duration as whole seconds.
    ///
    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    /// Deserialize a duration from whole seconds.
    ///
    /// # Errors
    ///
    /// Propagates deserializer errors.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
