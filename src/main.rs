//! # Lapse - timeout registry server
//!
//! ## Startup
//!
//! 1. **Tracing** - `RUST_LOG`-style filter, fmt output
//! 2. **Configuration** - defaults, config file, `LAPSE_*` environment, flags
//! 3. **Registry** - in-memory, delivering to the configured webhook
//! 4. **Axum API** - serves until Ctrl+C / SIGTERM
//!
//! ## Shutdown
//!
//! The server stops accepting requests and drains in-flight ones, then every
//! pending timer is stopped without firing. Nothing is persisted.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Cli::parse()
        .into_config()
        .context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        bind_address = %config.bind_address,
        max_timeout_secs = config.registry.max_timeout.as_secs(),
        "Lapse starting"
    );

    let registry = lapse_web::build_registry(&config).context("Failed to build registry")?;

    lapse_web::server::run_server(&config, registry.clone(), wait_for_shutdown())
        .await
        .context("Server failed")?;

    info!("Cleaning up...");
    let dropped = registry.shutdown();
    info!(dropped, "Lapse stopped");
    Ok(())
}

/// Initialize tracing subscriber with environment filter.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,lapse=debug,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Resolve on Ctrl+C or, on unix, SIGTERM.
async fn wait_for_shutdown() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, initiating graceful shutdown"),
            Err(err) => error!("Failed to listen for Ctrl+C: {}", err),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, initiating graceful shutdown");
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
