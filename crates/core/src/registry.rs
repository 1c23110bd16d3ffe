//! The timeout registry.
//!
//! One map from event id to live timer state, guarded by one lock. All four
//! operations are short synchronous critical sections; nothing awaits or does
//! I/O while the lock is held. The webhook call made when an event fires
//! happens strictly after the lock is released.
//!
//! Races between a timer firing and a concurrent Cancel or Extend for the same
//! id are settled in two places:
//!
//! - the [`TimerHandle`] phase: `stop()`/`reset()` only succeed while the
//!   countdown is still armed, so a caller that loses the race gets
//!   [`RegistryError::AlreadyFiring`] and leaves cleanup to the fire path;
//! - the fire path re-checks, under the registry lock, that the entry still
//!   exists and is still owned by the firing handle before removing it.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::timer::{TimerHandle, TimerId};
use crate::webhook::{TimeoutMessage, WebhookSender};

/// Live state for one registered event.
#[derive(Debug)]
struct TimerEntry {
    event_id: String,
    handle: TimerHandle,
    /// TTL as of the last (re)start.
    duration: Duration,
    /// When the current countdown began.
    started_at: Instant,
    registered_at: DateTime<Utc>,
    emit_payload: String,
}

impl TimerEntry {
    /// `duration - (now - started_at)`. Negative once the deadline has passed
    /// but the fire path has not yet removed the entry.
    fn remaining_at(&self, now: Instant) -> Result<TimeDelta> {
        let duration = to_delta(self.duration)?;
        let elapsed = to_delta(now.saturating_duration_since(self.started_at))?;
        duration
            .checked_sub(&elapsed)
            .ok_or_else(|| RegistryError::internal("remaining time out of range"))
    }
}

/// Accepted registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub event_id: String,
    pub timeout: Duration,
}

/// Successful extension; `duration` is the new countdown from now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    pub event_id: String,
    pub duration: Duration,
}

struct Inner {
    entries: Mutex<HashMap<String, TimerEntry>>,
    config: RegistryConfig,
    webhook: Arc<dyn WebhookSender>,
}

impl Inner {
    /// Remove the entry for a timer that just fired, provided it is still the
    /// entry that timer belongs to.
    fn take_fired(&self, event_id: &str, timer_id: TimerId) -> Option<TimerEntry> {
        let mut entries = self.entries.lock();
        match entries.get(event_id) {
            Some(entry) if entry.handle.id() == timer_id => entries.remove(event_id),
            _ => None,
        }
    }
}

/// In-memory timeout registry.
///
/// Cheap to clone; all clones share the same map. Construct one at startup
/// and hand clones to whoever needs it.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

impl Registry {
    /// Create an empty registry that delivers fired events to `webhook`.
    pub fn new(config: RegistryConfig, webhook: Arc<dyn WebhookSender>) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                config,
                webhook,
            }),
        }
    }

    /// Policy bounds in force.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.inner.config
    }

    /// Number of live events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.lock().len()
    }

    /// Whether no events are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.lock().is_empty()
    }

    /// Whether `event_id` is live.
    #[must_use]
    pub fn contains(&self, event_id: &str) -> bool {
        self.inner.entries.lock().contains_key(event_id)
    }

    /// Register a new event that fires after `timeout`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidEventId`] if `event_id` is empty
    /// - [`RegistryError::InvalidDuration`] if `timeout` is outside `(0, max_timeout]`
    /// - [`RegistryError::DuplicateEvent`] if `event_id` is already live
    /// - [`RegistryError::Internal`] if no timer could be started
    pub fn register(
        &self,
        event_id: impl Into<String>,
        timeout: Duration,
        emit_payload: impl Into<String>,
    ) -> Result<Registration> {
        let event_id = event_id.into();
        validate_event_id(&event_id)?;
        self.inner.config.check_duration(timeout)?;

        let mut entries = self.inner.entries.lock();
        if entries.contains_key(&event_id) {
            return Err(RegistryError::duplicate_event(event_id));
        }

        let now = Instant::now();
        let deadline = deadline_after(now, timeout)?;
        let owner = Arc::downgrade(&self.inner);
        let fire_id = event_id.clone();
        let handle = TimerHandle::spawn(deadline, move |timer_id| {
            fire(owner, fire_id, timer_id)
        })?;

        debug!(event_id = %event_id, timer = %handle.id(), "Timer armed");
        entries.insert(
            event_id.clone(),
            TimerEntry {
                event_id: event_id.clone(),
                handle,
                duration: timeout,
                started_at: now,
                registered_at: Utc::now(),
                emit_payload: emit_payload.into(),
            },
        );
        drop(entries);

        info!(event_id = %event_id, timeout_secs = timeout.as_secs_f64(), "Event registered");
        Ok(Registration { event_id, timeout })
    }

    /// Cancel a pending event so it never fires.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotFound`] if `event_id` is not live
    /// - [`RegistryError::AlreadyFiring`] if its timer has already begun firing;
    ///   the webhook call will still happen and the entry is removed by the
    ///   fire path
    pub fn cancel(&self, event_id: &str) -> Result<()> {
        let mut entries = self.inner.entries.lock();
        let entry = entries
            .get(event_id)
            .ok_or_else(|| RegistryError::not_found(event_id))?;

        if !entry.handle.stop() {
            debug!(event_id, "Cancel lost the race with firing");
            return Err(RegistryError::already_firing(event_id));
        }
        entries.remove(event_id);
        drop(entries);

        info!(event_id, "Event cancelled");
        Ok(())
    }

    /// Time left before `event_id` fires.
    ///
    /// The value is negative when the deadline has passed but the fire path
    /// has not yet cleaned up; treat that as "firing now".
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] if `event_id` is not live.
    pub fn remaining(&self, event_id: &str) -> Result<TimeDelta> {
        let entries = self.inner.entries.lock();
        entries
            .get(event_id)
            .ok_or_else(|| RegistryError::not_found(event_id))
            .and_then(|entry| entry.remaining_at(Instant::now()))
    }

    /// Push an event's deadline out by `extra`.
    ///
    /// The new countdown is `remaining + extra`, measured from now. The
    /// existing timer is re-armed in place and the emit payload is kept.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotFound`] if `event_id` is not live
    /// - [`RegistryError::InvalidDuration`] if `extra` is zero or the new
    ///   countdown falls outside `(0, max_timeout]`; the entry is untouched
    /// - [`RegistryError::AlreadyFiring`] if its timer has already begun firing
    pub fn extend(&self, event_id: &str, extra: Duration) -> Result<Extension> {
        let mut entries = self.inner.entries.lock();
        let entry = entries
            .get_mut(event_id)
            .ok_or_else(|| RegistryError::not_found(event_id))?;

        if extra.is_zero() {
            return Err(RegistryError::invalid_duration(
                "extension must be greater than 0",
            ));
        }

        let now = Instant::now();
        let new_total = entry
            .remaining_at(now)?
            .checked_add(&to_delta(extra)?)
            .ok_or_else(|| RegistryError::invalid_duration("extended duration out of range"))?
            .to_std()
            .map_err(|_| {
                RegistryError::invalid_duration("extension does not cover the time already overdue")
            })?;
        self.inner.config.check_duration(new_total)?;

        if !entry.handle.reset(deadline_after(now, new_total)?) {
            debug!(event_id, "Extend lost the race with firing");
            return Err(RegistryError::already_firing(event_id));
        }
        entry.duration = new_total;
        entry.started_at = now;
        drop(entries);

        info!(event_id, new_timeout_secs = new_total.as_secs_f64(), "Event extended");
        Ok(Extension {
            event_id: event_id.to_string(),
            duration: new_total,
        })
    }

    /// Stop every pending timer without firing it and clear the registry.
    ///
    /// Returns the number of events dropped.
    pub fn shutdown(&self) -> usize {
        let drained: Vec<TimerEntry> = {
            let mut entries = self.inner.entries.lock();
            entries.drain().map(|(_, entry)| entry).collect()
        };
        let dropped = drained.iter().filter(|entry| entry.handle.stop()).count();
        if dropped > 0 {
            warn!(dropped, "Pending events dropped at shutdown");
        }
        dropped
    }
}

/// Fire procedure, run by the timer task once its countdown ends.
async fn fire(owner: Weak<Inner>, event_id: String, timer_id: TimerId) {
    let Some(inner) = owner.upgrade() else {
        debug!(event_id = %event_id, "Registry gone, dropping fire");
        return;
    };
    let Some(entry) = inner.take_fired(&event_id, timer_id) else {
        debug!(event_id = %event_id, timer = %timer_id, "Entry already removed, not firing");
        return;
    };

    info!(event_id = %entry.event_id, "Emitting event");
    let message = TimeoutMessage::new(entry.event_id, entry.emit_payload, entry.registered_at);
    match inner.webhook.send(&message).await {
        Ok(()) => debug!(event_id = %message.event_id, "Webhook delivered"),
        Err(e) => warn!(event_id = %message.event_id, error = %e, "Webhook delivery failed"),
    }
}

fn validate_event_id(event_id: &str) -> Result<()> {
    if event_id.trim().is_empty() {
        return Err(RegistryError::invalid_event_id("event_id must not be empty"));
    }
    Ok(())
}

fn deadline_after(now: Instant, after: Duration) -> Result<Instant> {
    now.checked_add(after)
        .ok_or_else(|| RegistryError::internal("deadline out of range"))
}

fn to_delta(duration: Duration) -> Result<TimeDelta> {
    TimeDelta::from_std(duration).map_err(|e| RegistryError::internal(e.to_string()))
}
