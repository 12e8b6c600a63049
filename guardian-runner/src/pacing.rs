//! Minimum spacing between outbound requests.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Default spacing between remote fetches.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(300);

/// Blocks callers so consecutive requests start at least `interval` apart.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    last: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep until the next request may start, then claim the slot.
    /// Returns how long the caller waited.
    pub fn wait(&self) -> Duration {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        let waited = match *last {
            Some(at) => {
                let remaining = self.interval.saturating_sub(at.elapsed());
                if !remaining.is_zero() {
                    std::thread::sleep(remaining);
                }
                remaining
            }
            None => Duration::ZERO,
        };
        *last = Some(Instant::now());
        waited
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}
