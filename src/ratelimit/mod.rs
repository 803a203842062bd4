//! Admission control for PR operations.
//!
//! Two independent caps apply to every grant: a rolling one-hour window on
//! the number of grants, and a ceiling on grants held at the same time. A
//! cap of zero means unlimited.

mod clock;
mod error;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::RateLimitError;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::{OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tracing::debug;

use crate::config::Config;

/// Length of the rolling window for the hourly cap.
pub const HOURLY_WINDOW: Duration = Duration::from_secs(3600);

/// The two caps a [`RateLimiter`] enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrLimits {
    /// Grants per rolling hour (0 = unlimited).
    pub hourly: u32,
    /// Simultaneously held grants (0 = unlimited).
    pub concurrent: u32,
}

impl PrLimits {
    pub fn new(hourly: u32, concurrent: u32) -> Self {
        Self { hourly, concurrent }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.pr_hourly_limit, config.pr_concurrent_limit)
    }
}

/// Builds the limiter for a configuration.
pub fn apply_rate_limits(config: &Config) -> RateLimiter {
    RateLimiter::new(PrLimits::from_config(config))
}

/// Proof of admission. The concurrency slot is released on drop; the
/// hourly grant stays counted until it ages out of the window.
#[derive(Debug)]
pub struct Permit {
    _slot: Option<OwnedSemaphorePermit>,
}

/// Admits PR operations under an hourly and a concurrent cap.
///
/// Safe to share between tasks behind an `Arc`.
pub struct RateLimiter {
    limits: PrLimits,
    clock: Arc<dyn Clock>,
    slots: Option<Arc<Semaphore>>,
    grants: Mutex<VecDeque<Instant>>,
    closed: AtomicBool,
}

impl RateLimiter {
    pub fn new(limits: PrLimits) -> Self {
        Self::with_clock(limits, Arc::new(SystemClock))
    }

    pub fn with_clock(limits: PrLimits, clock: Arc<dyn Clock>) -> Self {
        let slots = (limits.concurrent > 0)
            .then(|| Arc::new(Semaphore::new(limits.concurrent as usize)));

        Self {
            limits,
            clock,
            slots,
            grants: Mutex::new(VecDeque::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn limits(&self) -> PrLimits {
        self.limits
    }

    /// Requests admission without waiting.
    ///
    /// A refused request is deferred: nothing is recorded against either cap.
    pub fn try_acquire(&self) -> Result<Permit, RateLimitError> {
        self.ensure_open()?;

        let slot = match &self.slots {
            Some(slots) => Some(slots.clone().try_acquire_owned().map_err(|e| match e {
                TryAcquireError::Closed => RateLimitError::Closed,
                TryAcquireError::NoPermits => RateLimitError::ConcurrentLimitReached {
                    limit: self.limits.concurrent,
                },
            })?),
            None => None,
        };

        self.record_grant()?;
        Ok(Permit { _slot: slot })
    }

    /// Waits for a concurrency slot, then checks the hourly cap.
    ///
    /// Hourly exhaustion is not waited out; it is returned as
    /// [`RateLimitError::HourlyLimitReached`] so the caller can defer.
    pub async fn acquire(&self) -> Result<Permit, RateLimitError> {
        self.ensure_open()?;

        let slot = match &self.slots {
            Some(slots) => Some(
                slots
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| RateLimitError::Closed)?,
            ),
            None => None,
        };

        self.record_grant()?;
        Ok(Permit { _slot: slot })
    }

    /// Refuses all further requests and wakes pending waiters.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(slots) = &self.slots {
            slots.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Number of permits currently held.
    pub fn in_flight(&self) -> usize {
        match &self.slots {
            Some(slots) => self.limits.concurrent as usize - slots.available_permits(),
            None => 0,
        }
    }

    /// Number of grants inside the current rolling hour.
    pub fn granted_in_window(&self) -> usize {
        let now = self.clock.now();
        let mut grants = self.lock_grants();
        prune(&mut grants, now);
        grants.len()
    }

    /// Time until another grant fits in the hourly window.
    pub fn next_slot_in(&self) -> Duration {
        if self.limits.hourly == 0 {
            return Duration::ZERO;
        }
        let now = self.clock.now();
        let mut grants = self.lock_grants();
        prune(&mut grants, now);
        retry_after(&grants, self.limits.hourly, now)
    }

    fn ensure_open(&self) -> Result<(), RateLimitError> {
        if self.is_closed() {
            return Err(RateLimitError::Closed);
        }
        Ok(())
    }

    fn record_grant(&self) -> Result<(), RateLimitError> {
        if self.limits.hourly == 0 {
            return Ok(());
        }

        let now = self.clock.now();
        let mut grants = self.lock_grants();
        prune(&mut grants, now);

        if grants.len() >= self.limits.hourly as usize {
            let retry_after = retry_after(&grants, self.limits.hourly, now);
            debug!(
                granted = grants.len(),
                limit = self.limits.hourly,
                retry_after = ?retry_after,
                "hourly limit reached"
            );
            return Err(RateLimitError::HourlyLimitReached {
                limit: self.limits.hourly,
                retry_after,
            });
        }

        grants.push_back(now);
        Ok(())
    }

    fn lock_grants(&self) -> std::sync::MutexGuard<'_, VecDeque<Instant>> {
        self.grants.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Drops grants that have left the window.
fn prune(grants: &mut VecDeque<Instant>, now: Instant) {
    while let Some(&oldest) = grants.front() {
        if now.saturating_duration_since(oldest) >= HOURLY_WINDOW {
            grants.pop_front();
        } else {
            break;
        }
    }
}

/// Time until the window holds fewer than `limit` grants. `grants` must be
/// pruned.
fn retry_after(grants: &VecDeque<Instant>, limit: u32, now: Instant) -> Duration {
    let limit = limit as usize;
    if grants.len() < limit {
        return Duration::ZERO;
    }
    // The grant that must expire is the one `limit` places from the end.
    let blocking = grants[grants.len() - limit];
    (blocking + HOURLY_WINDOW).saturating_duration_since(now)
}
