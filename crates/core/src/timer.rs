//! Per-event countdown handles.
//!
//! Each handle owns one background task that sleeps until its deadline. The
//! task and the holder of the handle coordinate through a small phase machine
//! guarded by the handle's own lock:
//!
//! ```text
//! Armed --stop()-----> Stopped
//! Armed --deadline---> Firing
//! Armed --reset()----> Armed (new deadline)
//! ```
//!
//! `stop()` and `reset()` only succeed while the handle is `Armed`; a `false`
//! result tells the caller the countdown already ended one way or the other.
//! Dropping the handle stops an armed countdown.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::{RegistryError, Result};

static NEXT_TIMER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

/// Where a countdown is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    /// Waiting for its deadline.
    Armed,
    /// Deadline reached; the fire callback owns what happens next.
    Firing,
    /// Stopped before the deadline; will never fire.
    Stopped,
}

#[derive(Debug)]
struct TimerState {
    phase: TimerPhase,
    deadline: Instant,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<TimerState>,
    wake: Notify,
}

/// Handle to a single countdown task.
#[derive(Debug)]
pub struct TimerHandle {
    id: TimerId,
    shared: Arc<Shared>,
}

impl TimerHandle {
    /// Start a countdown that runs `on_fire` once `deadline` passes.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Internal`] when called outside a tokio runtime.
    pub fn spawn<F, Fut>(deadline: Instant, on_fire: F) -> Result<Self>
    where
        F: FnOnce(TimerId) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            RegistryError::internal(format!("no async runtime available to host timer: {e}"))
        })?;

        let id = TimerId(NEXT_TIMER_ID.fetch_add(1, Ordering::Relaxed));
        let shared = Arc::new(Shared {
            state: Mutex::new(TimerState {
                phase: TimerPhase::Armed,
                deadline,
            }),
            wake: Notify::new(),
        });

        let task_shared = Arc::clone(&shared);
        runtime.spawn(async move {
            if countdown(&task_shared).await {
                on_fire(id).await;
            }
        });

        Ok(Self { id, shared })
    }

    /// Identity of this countdown.
    #[must_use]
    pub const fn id(&self) -> TimerId {
        self.id
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> TimerPhase {
        self.shared.state.lock().phase
    }

    /// Prevent a pending fire.
    ///
    /// Returns `true` if the countdown was still armed and will now never
    /// fire, `false` if it had already started firing or was stopped before.
    pub fn stop(&self) -> bool {
        {
            let mut state = self.shared.state.lock();
            if state.phase != TimerPhase::Armed {
                return false;
            }
            state.phase = TimerPhase::Stopped;
        }
        self.shared.wake.notify_one();
        true
    }

    /// Move the deadline of an armed countdown.
    ///
    /// Returns `false` without effect if the countdown is no longer armed.
    pub fn reset(&self, deadline: Instant) -> bool {
        {
            let mut state = self.shared.state.lock();
            if state.phase != TimerPhase::Armed {
                return false;
            }
            state.deadline = deadline;
        }
        self.shared.wake.notify_one();
        true
    }
}

impl Drop for TimerHandle {
    /// Stops an armed countdown so its task exits.
    fn drop(&mut self) {
        self.stop();
    }
}

/// Sleep until the armed deadline passes. Returns `true` once the phase has
/// been flipped to `Firing`, `false` if the handle was stopped.
async fn countdown(shared: &Shared) -> bool {
    loop {
        let deadline = {
            let state = shared.state.lock();
            match state.phase {
                TimerPhase::Armed => state.deadline,
                TimerPhase::Firing | TimerPhase::Stopped => return false,
            }
        };

        tokio::select! {
            () = tokio::time::sleep_until(deadline) => {}
            () = shared.wake.notified() => continue,
        }

        let mut state = shared.state.lock();
        match state.phase {
            TimerPhase::Armed if Instant::now() >= state.deadline => {
                state.phase = TimerPhase::Firing;
                return true;
            }
            // reset() pushed the deadline out while we slept
            TimerPhase::Armed => {}
            TimerPhase::Firing | TimerPhase::Stopped => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::{Duration, sleep};

    fn counting_timer(after: Duration) -> (TimerHandle, Arc<AtomicUsize>) {
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&fired);
        let handle = TimerHandle::spawn(Instant::now() + after, move |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        (handle, fired)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_deadline() {
        let (handle, fired) = counting_timer(Duration::from_secs(1));

        sleep(Duration::from_millis(900)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(handle.phase(), TimerPhase::Armed);

        sleep(Duration::from_millis(300)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(handle.phase(), TimerPhase::Firing);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_prevents_fire() {
        let (handle, fired) = counting_timer(Duration::from_secs(1));

        assert!(handle.stop());
        assert!(!handle.stop(), "second stop reports nothing to prevent");
        assert_eq!(handle.phase(), TimerPhase::Stopped);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_moves_deadline() {
        let start = Instant::now();
        let (handle, fired) = counting_timer(Duration::from_secs(1));

        sleep(Duration::from_millis(500)).await;
        assert!(handle.reset(start + Duration::from_secs(3)));

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0, "old deadline must not fire");

        sleep(Duration::from_millis(1500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_can_shorten_deadline() {
        let start = Instant::now();
        let (handle, fired) = counting_timer(Duration::from_secs(10));

        assert!(handle.reset(start + Duration::from_secs(1)));
        sleep(Duration::from_millis(1100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_and_reset_fail_once_firing() {
        let (handle, fired) = counting_timer(Duration::from_millis(10));

        sleep(Duration::from_millis(20)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!handle.stop());
        assert!(!handle.reset(Instant::now() + Duration::from_secs(1)));
        assert_eq!(handle.phase(), TimerPhase::Firing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_ends_countdown_task() {
        let (handle, fired) = counting_timer(Duration::from_secs(3600));
        let shared = Arc::downgrade(&handle.shared);

        drop(handle);
        sleep(Duration::from_millis(1)).await;
        assert!(shared.upgrade().is_none(), "countdown task still holds its state");

        sleep(Duration::from_secs(3600)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_firing_handle_does_not_interrupt_fire() {
        let (handle, fired) = counting_timer(Duration::from_millis(10));

        sleep(Duration::from_millis(20)).await;
        drop(handle);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timer_ids_are_unique() {
        let (a, _) = counting_timer(Duration::from_secs(60));
        let (b, _) = counting_timer(Duration::from_secs(60));
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_spawn_outside_runtime_is_internal_error() {
        let result = TimerHandle::spawn(Instant::now(), |_| async {});
        assert!(matches!(result, Err(RegistryError::Internal { .. })));
    }
}
