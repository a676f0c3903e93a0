//! Retry schedule for peer delivery.

use std::time::Duration;

/// Delivery retry policy with linear backoff.
///
/// After the n-th failed attempt the sender waits `n × unit`, so the default
/// schedule is 1s, 2s, 3s across three attempts. The last wait happens before
/// the sender gives up, which keeps a failing peer's task alive for the full
/// `unit × (1 + 2 + ... + max_attempts)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total delivery attempts per peer, including the first.
    pub max_attempts: u32,

    /// Backoff step; the wait after attempt `n` is `n × unit`.
    pub unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            unit: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with a custom attempt count and backoff step.
    pub fn new(max_attempts: u32, unit: Duration) -> Self {
        Self { max_attempts, unit }
    }

    /// Same schedule shape with a 1ms step, for tests.
    pub fn testing() -> Self {
        Self {
            unit: Duration::from_millis(1),
            ..Self::default()
        }
    }

    /// Wait that follows the given failed attempt (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.unit.saturating_mul(attempt)
    }
}
