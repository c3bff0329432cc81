//! Minimum-interval throttle shared by notification features.
//!
//! One primitive for "at most one X per interval": notification tones,
//! outbound nudges, anything where a burst should collapse to one event.

use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct MinIntervalThrottle {
    min_interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl MinIntervalThrottle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: Mutex::new(None),
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Returns true (and records `now`) if the interval has elapsed since the
    /// last accepted event.
    pub fn try_acquire(&self) -> bool {
        self.try_acquire_at(Instant::now())
    }

    pub fn try_acquire_at(&self, now: Instant) -> bool {
        // Poisoned mutex means a logic bug elsewhere; deny rather than panic.
        let Ok(mut last) = self.last.lock() else {
            return false;
        };
        match *last {
            Some(prev) if now.saturating_duration_since(prev) < self.min_interval => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }

    /// Forget the last event.
    pub fn reset(&self) {
        if let Ok(mut last) = self.last.lock() {
            *last = None;
        }
    }
}
