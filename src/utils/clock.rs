//! Time source used by the fishing loop

use std::thread;
use std::time::{Duration, Instant};

/// Monotonic clock plus blocking sleep.
///
/// The loop never calls `Instant::now` or `thread::sleep` directly so the
/// state machine can be driven by a manual clock in tests.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by the OS
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        thread::sleep(duration);
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Converts a seconds setting into a `Duration`, treating negative and
/// non-finite values as zero.
pub fn secs(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_secs_f64(value)
    } else {
        Duration::ZERO
    }
}
