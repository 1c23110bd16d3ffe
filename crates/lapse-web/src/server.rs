//! Server setup with Tower middleware

use std::future::Future;
use std::net::SocketAddr;

use lapse_core::Registry;
use tokio::net::TcpListener;
use tracing::info;

use crate::{Error, ServerConfig, create_app};

/// Run the axum server until `shutdown` resolves.
///
/// In-flight requests are allowed to finish; pending timers are left to the
/// caller (see [`Registry::shutdown`]).
///
/// # Errors
///
/// Returns an error if the bind address is invalid, the socket cannot be
/// bound, or the server fails.
pub async fn run_server<F>(config: &ServerConfig, registry: Registry, shutdown: F) -> Result<(), Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = config.bind_address.parse()?;
    let app = create_app(registry, config);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Lapse listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server stopped accepting requests");
    Ok(())
}
