//! Shared application state handed to every handler.

use std::time::Instant;

use lapse_core::Registry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    /// When the server started, for uptime reporting.
    pub started_at: Instant,
}

impl AppState {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry,
            started_at: Instant::now(),
        }
    }
}
