//! Server configuration.
//!
//! Values are layered: built-in defaults, then an optional config file, then
//! `LAPSE_*` environment variables, then command-line flags (applied by the
//! binary).

use std::path::Path;
use std::time::Duration;

use lapse_core::RegistryConfig;
use lapse_core::config::duration_secs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::Error;

/// Configuration for the lapse HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (e.g., "127.0.0.1:3000").
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Where fired events are POSTed.
    #[serde(default = "default_webhook_url")]
    pub webhook_url: String,

    /// Per-request timeout for webhook delivery.
    #[serde(
        rename = "webhook_timeout_secs",
        with = "duration_secs",
        default = "default_webhook_timeout"
    )]
    pub webhook_timeout: Duration,

    /// Mount the `POST /webhook` sink that logs incoming timeout messages.
    /// On by default, since the default `webhook_url` points at it.
    #[serde(default = "default_enable_webhook_sink")]
    pub enable_webhook_sink: bool,

    /// Registry policy.
    #[serde(default)]
    pub registry: RegistryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            webhook_url: default_webhook_url(),
            webhook_timeout: default_webhook_timeout(),
            enable_webhook_sink: default_enable_webhook_sink(),
            registry: RegistryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Set the bind address.
    #[must_use]
    pub fn bind_address(mut self, address: impl Into<String>) -> Self {
        self.bind_address = address.into();
        self
    }

    /// Set the webhook URL.
    #[must_use]
    pub fn webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = url.into();
        self
    }

    /// Set the webhook request timeout.
    #[must_use]
    pub const fn webhook_timeout(mut self, timeout: Duration) -> Self {
        self.webhook_timeout = timeout;
        self
    }

    /// Set the maximum accepted countdown.
    #[must_use]
    pub const fn max_timeout(mut self, max_timeout: Duration) -> Self {
        self.registry.max_timeout = max_timeout;
        self
    }

    /// Mount the webhook sink route.
    #[must_use]
    pub const fn with_webhook_sink(mut self) -> Self {
        self.enable_webhook_sink = true;
        self
    }

    /// Leave the webhook sink route unmounted.
    #[must_use]
    pub const fn without_webhook_sink(mut self) -> Self {
        self.enable_webhook_sink = false;
        self
    }

    /// Load configuration from environment variables on top of the defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().merge_env()
    }

    /// Apply `LAPSE_*` environment overrides. Unparseable values are logged
    /// and ignored.
    #[must_use]
    pub fn merge_env(mut self) -> Self {
        if let Ok(address) = std::env::var("LAPSE_BIND_ADDRESS") {
            self.bind_address = address;
        }

        if let Ok(url) = std::env::var("LAPSE_WEBHOOK_URL") {
            self.webhook_url = url;
        }

        if let Some(secs) = env_secs("LAPSE_WEBHOOK_TIMEOUT_SECS") {
            self.webhook_timeout = Duration::from_secs(secs);
        }

        if let Some(secs) = env_secs("LAPSE_MAX_TIMEOUT_SECS") {
            self.registry.max_timeout = Duration::from_secs(secs);
        }

        self
    }

    /// Load configuration from a file (JSON by extension, TOML otherwise).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;

        if path.extension().is_some_and(|e| e == "json") {
            Ok(serde_json::from_str(&content)?)
        } else {
            toml::from_str(&content)
                .map_err(|e| Error::config(format!("failed to parse {}: {e}", path.display())))
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns error if configuration is invalid.
    pub fn validate(&self) -> Result<(), Error> {
        self.registry.validate()?;

        if self.webhook_timeout.is_zero() {
            return Err(Error::config("webhook_timeout_secs must be greater than 0"));
        }

        self.bind_address
            .parse::<std::net::SocketAddr>()
            .map_err(|e| Error::config(format!("invalid bind_address '{}': {e}", self.bind_address)))?;

        url::Url::parse(&self.webhook_url)?;
        Ok(())
    }
}

fn env_secs(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(secs) => Some(secs),
        Err(e) => {
            warn!(variable = name, value = %raw, error = %e, "Ignoring invalid setting");
            None
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_webhook_url() -> String {
    "http://localhost:3000/webhook".to_string()
}

const fn default_webhook_timeout() -> Duration {
    Duration::from_secs(10)
}

const fn default_enable_webhook_sink() -> bool {
    true
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address, "127.0.0.1:3000");
        assert_eq!(config.webhook_url, "http://localhost:3000/webhook");
        assert_eq!(config.webhook_timeout, Duration::from_secs(10));
        assert!(config.enable_webhook_sink);
        assert_eq!(config.registry.max_timeout, Duration::from_secs(7200));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ServerConfig::default()
            .bind_address("0.0.0.0:8080")
            .webhook_url("https://hooks.example.com/lapse")
            .webhook_timeout(Duration::from_secs(3))
            .max_timeout(Duration::from_secs(60))
            .without_webhook_sink();

        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.webhook_url, "https://hooks.example.com/lapse");
        assert_eq!(config.webhook_timeout, Duration::from_secs(3));
        assert_eq!(config.registry.max_timeout, Duration::from_secs(60));
        assert!(!config.enable_webhook_sink);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ServerConfig::default().bind_address("nowhere").validate().is_err());
        assert!(ServerConfig::default().webhook_url("not a url").validate().is_err());
        assert!(
            ServerConfig::default()
                .webhook_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
        assert!(matches!(
            ServerConfig::default().max_timeout(Duration::ZERO).validate(),
            Err(Error::RegistryConfig(lapse_core::ConfigError::ZeroMaxTimeout))
        ));
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
bind_address = "0.0.0.0:4000"
webhook_url = "http://hooks.internal/fired"
webhook_timeout_secs = 5
enable_webhook_sink = false

[registry]
max_timeout_secs = 600
"#
        )
        .unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:4000");
        assert_eq!(config.webhook_url, "http://hooks.internal/fired");
        assert_eq!(config.webhook_timeout, Duration::from_secs(5));
        assert!(!config.enable_webhook_sink);
        assert_eq!(config.registry.max_timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_from_json_file_uses_defaults_for_missing_fields() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"webhook_url": "http://hooks.internal/fired"}}"#).unwrap();

        let config = ServerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.webhook_url, "http://hooks.internal/fired");
        assert_eq!(config.bind_address, "127.0.0.1:3000");
        assert!(config.enable_webhook_sink);
        assert_eq!(config.registry, RegistryConfig::default());
    }

    #[test]
    fn test_from_file_reports_parse_errors() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(file, "bind_address = [").unwrap();

        let result = ServerConfig::from_file(file.path());
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_from_missing_file_is_io_error() {
        let result = ServerConfig::from_file(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
