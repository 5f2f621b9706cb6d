//! Sliding-window rate limiting
//!
//! Two limiters are used by the API:
//! - every `/api` request, keyed by client IP (100 per 15 minutes by default)
//! - failed logins, keyed by lowercased username (5 per 15 minutes)

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use tokio::sync::RwLock;

/// Failed login attempts allowed per username within the window
pub const LOGIN_MAX_FAILURES: usize = 5;
/// Login throttling window in seconds
pub const LOGIN_WINDOW_SECS: i64 = 15 * 60;

/// Sliding-window limiter over arbitrary keys
pub struct SlidingWindowLimiter<K> {
    attempts: RwLock<HashMap<K, Vec<DateTime<Utc>>>>,
    window: Duration,
    max: usize,
}

impl<K> SlidingWindowLimiter<K>
where
    K: Eq + Hash + Clone,
{
    /// Allow at most `max` events per key within `window`
    pub fn new(window: Duration, max: usize) -> Self {
        Self {
            attempts: RwLock::new(HashMap::new()),
            window,
            max,
        }
    }

    /// Check whether the key already reached the limit
    pub async fn is_limited(&self, key: &K) -> bool {
        let cutoff = Utc::now() - self.window;
        let mut attempts = self.attempts.write().await;

        match attempts.get_mut(key) {
            Some(times) => {
                times.retain(|time| *time > cutoff);
                times.len() >= self.max
            }
            None => false,
        }
    }

    /// Record one event for the key
    pub async fn record(&self, key: K) {
        let mut attempts = self.attempts.write().await;
        attempts.entry(key).or_default().push(Utc::now());
    }

    /// Record an event unless the key is over the limit.
    ///
    /// Returns `false` when the event is rejected; rejected events are not counted.
    pub async fn try_acquire(&self, key: K) -> bool {
        let now = Utc::now();
        let cutoff = now - self.window;
        let mut attempts = self.attempts.write().await;

        let times = attempts.entry(key).or_default();
        times.retain(|time| *time > cutoff);
        if times.len() >= self.max {
            return false;
        }
        times.push(now);
        true
    }

    /// Forget all events for the key
    pub async fn clear(&self, key: &K) {
        self.attempts.write().await.remove(key);
    }

    /// Drop expired events and empty keys (called periodically)
    pub async fn cleanup(&self) {
        let cutoff = Utc::now() - self.window;
        let mut attempts = self.attempts.write().await;
        attempts.retain(|_, times| {
            times.retain(|time| *time > cutoff);
            !times.is_empty()
        });
    }

    /// Number of keys currently tracked
    pub async fn tracked_keys(&self) -> usize {
        self.attempts.read().await.len()
    }
}

/// Failed-login limiter keyed by case-insensitive username
pub struct LoginRateLimiter {
    inner: SlidingWindowLimiter<String>,
}

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            inner: SlidingWindowLimiter::new(Duration::seconds(LOGIN_WINDOW_SECS), LOGIN_MAX_FAILURES),
        }
    }

    pub async fn is_username_limited(&self, username: &str) -> bool {
        self.inner.is_limited(&username.to_lowercase()).await
    }

    pub async fn record_failed_attempt(&self, username: &str) {
        self.inner.record(username.to_lowercase()).await;
    }

    /// Clear failed attempts for username (on successful login)
    pub async fn clear_username_attempts(&self, username: &str) {
        self.inner.clear(&username.to_lowercase()).await;
    }

    pub async fn cleanup(&self) {
        self.inner.cleanup().await;
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-client request limiter for the JSON API
pub type ApiRateLimiter = SlidingWindowLimiter<String>;
