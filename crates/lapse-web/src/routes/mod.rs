//! REST API routes
//!
//! ## Route Structure
//!
//! - `GET /health` - Health check with pending event count
//! - `POST /register` - Register an event with a timeout
//! - `POST /cancel` - Cancel a pending event
//! - `POST /remaining` - Query time left before an event fires
//! - `POST /extend` - Extend a pending event
//! - `POST /webhook` - Sink that logs fired events (mounted unless disabled)

use super::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub mod events;
pub mod health;
pub mod webhook;

/// Create the API router.
///
/// `with_webhook_sink` mounts `POST /webhook`.
pub fn create_router(with_webhook_sink: bool) -> Router<AppState> {
    let router = Router::new()
        .route("/health", get(health::health_check))
        .route("/register", post(events::register_event))
        .route("/cancel", post(events::cancel_event))
        .route("/remaining", post(events::remaining_time))
        .route("/extend", post(events::extend_event));

    if with_webhook_sink {
        router.route("/webhook", post(webhook::receive_webhook))
    } else {
        router
    }
}
