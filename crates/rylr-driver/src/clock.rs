//! Time sources for bounded polling.
//!
//! Every wait in the driver is a poll loop against a [`Clock`]: check the
//! transport, compare elapsed time against the budget, then
//! [`Clock::pause`]. Tests use [`ManualClock`], whose pause advances time
//! instead of sleeping, so timeout paths run instantly.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source with an idle primitive.
pub trait Clock {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;

    /// Idle for roughly `interval` between polls.
    fn pause(&self, interval: Duration);
}

/// Wall-clock time backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now.
    pub fn new() -> Self {
        SystemClock {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn pause(&self, interval: Duration) {
        if interval.is_zero() {
            std::hint::spin_loop();
        } else {
            std::thread::sleep(interval);
        }
    }
}

/// Manually driven clock.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the driver.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

/// Smallest step taken by [`ManualClock::pause`] so poll loops always progress.
const MIN_STEP: Duration = Duration::from_micros(1);

impl ManualClock {
    /// Create a clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward.
    pub fn advance(&self, by: Duration) {
        let nanos = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    fn pause(&self, interval: Duration) {
        self.advance(interval.max(MIN_STEP));
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn pause(&self, interval: Duration) {
        (**self).pause(interval)
    }
}
