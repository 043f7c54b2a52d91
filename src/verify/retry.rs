//! Retry policy for link checks
//!
//! Only indeterminate outcomes are retried. A definite answer (present or
//! absent) is final on the first attempt, and retrying never changes how an
//! individual response is classified.

use crate::verify::Verification;
use std::time::Duration;

/// Default number of attempts per link, counting the first one
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Default pause between attempts
const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// How often and how patiently an indeterminate check is repeated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_DELAY)
    }
}

impl RetryPolicy {
    /// Creates a policy; `max_attempts` is clamped to at least one
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// A single attempt, no retries
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Decides whether attempt number `attempt` (1-based) should be followed
    /// by another one, returning the pause before it
    pub fn next_delay(&self, outcome: &Verification, attempt: u32) -> Option<Duration> {
        if outcome.is_indeterminate() && attempt < self.max_attempts {
            Some(self.delay)
        } else {
            None
        }
    }
}
