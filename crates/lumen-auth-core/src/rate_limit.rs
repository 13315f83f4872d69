//! Sliding-window rate limiter
//!
//! Fixed-size sliding window, not a token bucket: burst capacity
//! equals `limit` within any window, with no refill curve. Buckets are
//! per-process; a deployment running multiple instances behind a load
//! balancer gets per-instance limits unless the buckets move to a
//! shared store.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use lumen_types::Clock;

/// Bucket key: the throttled action plus the client it applies to
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct RateLimitKey {
    /// Action being throttled (e.g. "magic_link")
    pub action: String,
    /// Client key, usually the peer IP
    pub client: String,
}

impl RateLimitKey {
    /// Create a bucket key
    pub fn new(action: impl Into<String>, client: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            client: client.into(),
        }
    }
}

/// Per-key sliding-window counter
pub struct SlidingWindowLimiter {
    buckets: DashMap<RateLimitKey, Vec<DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowLimiter {
    /// Create an empty limiter
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: DashMap::new(),
            clock,
        }
    }

    /// Record a request and decide whether to admit it.
    ///
    /// Every call appends its timestamp before counting, so rejected
    /// probes occupy window slots too: a client that keeps probing a
    /// saturated bucket keeps it saturated. Admits iff the in-window
    /// count, including this call, is at most `limit`. Pruning on
    /// every call bounds a bucket by the requests seen in one window.
    pub fn admit(&self, key: RateLimitKey, limit: u32, window: Duration) -> bool {
        let now = self.clock.now();
        let mut bucket = self.buckets.entry(key).or_default();

        bucket.push(now);
        bucket.retain(|stamp| now - *stamp < window);
        bucket.len() <= limit as usize
    }

    /// Drop buckets whose newest entry has aged past `window`.
    ///
    /// Required hardening against sustained distinct-key traffic; the
    /// service runs this periodically.
    pub fn sweep(&self, window: Duration) {
        let now = self.clock.now();
        self.buckets
            .retain(|_, stamps| stamps.iter().any(|stamp| now - *stamp < window));
    }

    /// Number of live buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}

impl std::fmt::Debug for SlidingWindowLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingWindowLimiter")
            .field("buckets", &self.buckets.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_types::ManualClock;

    fn limiter_with_clock() -> (SlidingWindowLimiter, ManualClock) {
        let clock = ManualClock::from_system();
        let limiter = SlidingWindowLimiter::new(Arc::new(clock.clone()));
        (limiter, clock)
    }

    fn key() -> RateLimitKey {
        RateLimitKey::new("magic_link", "203.0.113.7")
    }

    #[test]
    fn test_admits_up_to_limit_then_rejects() {
        let (limiter, _) = limiter_with_clock();
        let window = Duration::milliseconds(60_000);

        for _ in 0..5 {
            assert!(limiter.admit(key(), 5, window));
        }
        assert!(!limiter.admit(key(), 5, window));
    }

    #[test]
    fn test_window_slides() {
        let (limiter, clock) = limiter_with_clock();
        let window = Duration::milliseconds(60_000);

        for _ in 0..5 {
            assert!(limiter.admit(key(), 5, window));
        }
        assert!(!limiter.admit(key(), 5, window));

        clock.advance(Duration::milliseconds(60_001));
        assert!(limiter.admit(key(), 5, window));
    }

    #[test]
    fn test_keys_are_independent() {
        let (limiter, _) = limiter_with_clock();
        let window = Duration::seconds(60);

        assert!(limiter.admit(RateLimitKey::new("magic_link", "a"), 1, window));
        assert!(!limiter.admit(RateLimitKey::new("magic_link", "a"), 1, window));
        // Different client, same action
        assert!(limiter.admit(RateLimitKey::new("magic_link", "b"), 1, window));
        // Same client, different action
        assert!(limiter.admit(RateLimitKey::new("oauth", "a"), 1, window));
    }

    #[test]
    fn test_rejected_probes_hold_the_window() {
        let (limiter, clock) = limiter_with_clock();
        let window = Duration::seconds(60);

        assert!(limiter.admit(key(), 1, window));

        // Rejected probe at t=30 still counts toward the window
        clock.advance(Duration::seconds(30));
        assert!(!limiter.admit(key(), 1, window));

        // t=61: the t=0 admit has aged out, the t=30 probe has not
        clock.advance(Duration::seconds(31));
        assert!(!limiter.admit(key(), 1, window));

        // t=121: everything has aged out
        clock.advance(Duration::seconds(60));
        assert!(limiter.admit(key(), 1, window));
    }

    #[test]
    fn test_bucket_pruned_each_call() {
        let (limiter, clock) = limiter_with_clock();
        let window = Duration::seconds(60);

        for _ in 0..100 {
            limiter.admit(key(), 5, window);
        }
        assert_eq!(limiter.buckets.get(&key()).unwrap().len(), 100);

        clock.advance(Duration::seconds(61));
        limiter.admit(key(), 5, window);
        assert_eq!(limiter.buckets.get(&key()).unwrap().len(), 1);
    }

    #[test]
    fn test_sweep_drops_stale_buckets() {
        let (limiter, clock) = limiter_with_clock();
        let window = Duration::seconds(60);

        limiter.admit(RateLimitKey::new("magic_link", "a"), 5, window);
        limiter.admit(RateLimitKey::new("magic_link", "b"), 5, window);
        assert_eq!(limiter.bucket_count(), 2);

        clock.advance(Duration::seconds(61));
        limiter.admit(RateLimitKey::new("magic_link", "c"), 5, window);

        limiter.sweep(window);
        assert_eq!(limiter.bucket_count(), 1);
    }
}
