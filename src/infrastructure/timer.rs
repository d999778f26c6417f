use crate::types::constants::{MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY};
use std::time::Duration;

/// Reconnect timer with linear backoff.
///
/// The n-th attempt waits `base_delay * n`. Once `max_attempts` delays have
/// been handed out, [`next_delay`](Self::next_delay) returns `None` until the
/// timer is reset by a successful connection.
#[derive(Debug, Clone)]
pub struct Timer {
    attempts: u32,
    max_attempts: u32,
    base_delay: Duration,
}

impl Timer {
    pub fn new(base_delay: Duration, max_attempts: u32) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            base_delay,
        }
    }

    /// Get the next delay duration, or `None` when the attempt cap is reached
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }

        self.attempts += 1;
        Some(self.base_delay.saturating_mul(self.attempts))
    }

    /// Reset the timer
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(RECONNECT_DELAY),
            MAX_RECONNECT_ATTEMPTS,
        )
    }
}
