//! Time sources for the limiter.

use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Monotonic time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// A clock that only moves when told to.
///
/// Testing helper for code built on [`RateLimiter::with_clock`]: lets a
/// test roll the hourly window forward without sleeping.
///
/// ```
/// use std::sync::Arc;
/// use std::time::Duration;
/// use forge_update_coordinator::ratelimit::{ManualClock, PrLimits, RateLimiter};
///
/// let clock = Arc::new(ManualClock::new());
/// let limiter = RateLimiter::with_clock(PrLimits::new(1, 0), clock.clone());
/// assert!(limiter.try_acquire().is_ok());
/// assert!(limiter.try_acquire().is_err());
///
/// clock.advance(Duration::from_secs(3600));
/// assert!(limiter.try_acquire().is_ok());
/// ```
///
/// [`RateLimiter::with_clock`]: super::RateLimiter::with_clock
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<Instant>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Instant::now()),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
