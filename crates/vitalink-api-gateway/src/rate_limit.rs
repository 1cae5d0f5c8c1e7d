//! Per-subject sliding-window rate limiter.
//!
//! Each subject keeps the timestamps of its recent grants; a request is
//! admitted when fewer than `max_requests` fall inside the last
//! `window` seconds. Decision and timestamp append happen in one
//! critical section.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Sliding-window limiter shared across requests.
pub struct SlidingWindowLimiter {
    window: Duration,
    max_requests: usize,
    entries: Mutex<HashMap<String, Vec<Instant>>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter admitting `max_requests` per `window` per subject.
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            window,
            max_requests,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Try to admit a request for `subject` now.
    ///
    /// On rejection returns the number of whole seconds until the oldest
    /// windowed entry ages out, at least 1.
    pub fn try_acquire(&self, subject: &str) -> Result<(), u64> {
        self.try_acquire_at(subject, Instant::now())
    }

    fn try_acquire_at(&self, subject: &str, now: Instant) -> Result<(), u64> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let timestamps = entries.entry(subject.to_string()).or_default();

        // A timestamp at exactly now − window is outside the window.
        timestamps.retain(|t| now.duration_since(*t) < self.window);

        if timestamps.len() >= self.max_requests {
            let oldest = timestamps.iter().min().copied().unwrap_or(now);
            let until_free = self.window.saturating_sub(now.duration_since(oldest));
            let retry_after = until_free.as_secs_f64().ceil() as u64;
            return Err(retry_after.max(1));
        }

        timestamps.push(now);
        Ok(())
    }

    /// Drop subjects whose entire history has aged out.
    pub fn prune(&self) {
        let now = Instant::now();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.retain(|_, timestamps| {
            timestamps.retain(|t| now.duration_since(*t) < self.window);
            !timestamps.is_empty()
        });
    }
}
