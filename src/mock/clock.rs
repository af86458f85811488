//! Time source for simulated latency.
//!
//! Handlers never call `thread::sleep` directly. They go through a
//! [`Clock`] so tests can swap in a [`VirtualClock`] and assert on the
//! requested delays without spending wall-clock time.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Suspends the calling request for a simulated duration.
pub trait Clock: Send + Sync + fmt::Debug {
    fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleeping.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Virtual clock: records each sleep and advances instantly.
///
/// Clones share the same timeline.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    inner: Arc<Mutex<Timeline>>,
}

#[derive(Debug, Default)]
struct Timeline {
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total virtual time slept so far.
    pub fn elapsed(&self) -> Duration {
        self.timeline().elapsed
    }

    /// Every sleep requested, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.timeline().sleeps.clone()
    }

    /// Forget recorded sleeps and rewind to zero.
    pub fn reset(&self) {
        let mut timeline = self.timeline();
        timeline.elapsed = Duration::ZERO;
        timeline.sleeps.clear();
    }

    fn timeline(&self) -> std::sync::MutexGuard<'_, Timeline> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for VirtualClock {
    fn sleep(&self, duration: Duration) {
        let mut timeline = self.timeline();
        timeline.elapsed = timeline.elapsed.saturating_add(duration);
        timeline.sleeps.push(duration);
    }
}
