//! Rate limiter errors.

use std::time::Duration;
use thiserror::Error;

/// Reasons an admission request is deferred.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitError {
    #[error("hourly PR limit of {limit} reached, next slot in {}s", .retry_after.as_secs())]
    HourlyLimitReached { limit: u32, retry_after: Duration },
    #[error("concurrent PR limit of {limit} reached")]
    ConcurrentLimitReached { limit: u32 },
    #[error("rate limiter is closed")]
    Closed,
}
