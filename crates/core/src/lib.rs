//! Lapse core: an in-memory timeout registry.
//!
//! Clients register a named event with a time-to-live. When the TTL runs out
//! the registry hands a [`TimeoutMessage`] to a [`WebhookSender`]. Pending
//! events can be cancelled, queried for their remaining time, or extended.
//!
//! ```ignore
//! use std::{sync::Arc, time::Duration};
//! use lapse_core::{Registry, RegistryConfig};
//!
//! let registry = Registry::new(RegistryConfig::default(), Arc::new(my_sender));
//! registry.register("order-42", Duration::from_secs(30), "payment window closed")?;
//! registry.extend("order-42", Duration::from_secs(30))?;
//! let left = registry.remaining("order-42")?;
//! registry.cancel("order-42")?;
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]

pub mod config;
pub mod error;
pub mod registry;
pub mod timer;
pub mod webhook;

pub use config::{ConfigError, DEFAULT_MAX_TIMEOUT, RegistryConfig};
pub use error::{RegistryError, Result};
pub use registry::{Extension, Registration, Registry};
pub use timer::{TimerHandle, TimerId, TimerPhase};
pub use webhook::{TimeoutMessage, WebhookError, WebhookSender};
