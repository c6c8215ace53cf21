//! Retry backoff policy.

use std::time::Duration;

/// Exponential backoff between attempts of one logical execution.
///
/// Uncapped by default, so every gap is strictly longer than the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base_delay: Duration,
    pub max_delay: Option<Duration>,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(100),
            max_delay: None,
        }
    }
}

impl Backoff {
    pub fn new(base_delay: Duration) -> Self {
        Self {
            base_delay,
            ..Self::default()
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Delay after the failed attempt `attempt` (1-based): `base * 2^(attempt-1)`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay.as_millis() as u64;
        let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
        let delay = base.saturating_mul(factor);
        let delay = match self.max_delay {
            Some(cap) => delay.min(cap.as_millis() as u64),
            None => delay,
        };
        Duration::from_millis(delay)
    }
}
