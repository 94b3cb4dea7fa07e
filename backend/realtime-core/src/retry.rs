//! Reconnect backoff policy.

use crate::config::ManagerConfig;

use std::time::Duration;

use backoff::backoff::Backoff;

/// Exponential reconnect delay with a retry budget.
///
/// The n-th delay (counting from zero) is `min(base * 2^n, max)`. Once
/// `max_attempts` delays have been handed out, [`Backoff::next_backoff`]
/// returns `None` and the caller should stop retrying.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    base: Duration,
    max: Duration,
    max_attempts: u32,
    attempt: u32,
}

impl ReconnectBackoff {
    pub fn new(base: Duration, max: Duration, max_attempts: u32) -> Self {
        Self {
            base,
            max,
            max_attempts,
            attempt: 0,
        }
    }

    pub fn from_config(config: &ManagerConfig) -> Self {
        Self::new(
            config.base_reconnect_delay(),
            config.max_reconnect_delay(),
            config.max_reconnect_attempts,
        )
    }

    /// Failures counted since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }

    /// `min(base * 2^attempt, max)` without overflowing for large attempts.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base
            .checked_mul(factor)
            .map_or(self.max, |delay| delay.min(self.max))
    }
}

impl Backoff for ReconnectBackoff {
    fn reset(&mut self) {
        self.attempt = 0;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        let delay = self.delay_for(self.attempt);
        self.attempt += 1;
        Some(delay)
    }
}
