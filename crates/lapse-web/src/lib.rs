//! Lapse Web Server
//!
//! HTTP API over the lapse timeout registry, plus the reqwest-backed webhook
//! sender the registry delivers fired events through.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]

use std::sync::Arc;

use axum::Router;
use lapse_core::Registry;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};
use tracing::info;

pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;
pub mod webhook;

pub use config::ServerConfig;
pub use error::{AppError, ErrorResponse};
pub use state::AppState;
pub use webhook::HttpWebhookSender;

/// Build a registry that delivers to the configured webhook URL.
///
/// # Errors
///
/// Returns an error if the webhook URL is invalid or the HTTP client cannot
/// be built.
pub fn build_registry(config: &ServerConfig) -> Result<Registry, Error> {
    let sender = HttpWebhookSender::new(&config.webhook_url, config.webhook_timeout)?;
    info!(target_url = %sender.target(), "Sending events to webhook");
    Ok(Registry::new(config.registry, Arc::new(sender)))
}

/// Create the application router with middleware.
pub fn create_app(registry: Registry, config: &ServerConfig) -> Router {
    routes::create_router(config.enable_webhook_sink)
        .with_state(AppState::new(registry))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new()),
        )
}

/// Web server errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// Invalid registry policy
    #[error("configuration error: {0}")]
    RegistryConfig(#[from] lapse_core::ConfigError),

    /// Invalid socket address
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] std::net::AddrParseError),

    /// Invalid webhook URL
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
