//! Sliding-window admission control for the contact form.
//!
//! Each identifier (normally the client IP) keeps the instants of its
//! accepted requests inside the trailing window. Pruning happens lazily on
//! access; identifiers that stop sending are never swept, so the number of
//! tracked keys grows with the number of distinct clients.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::security::clock::{Clock, SystemClock};

/// Key used when the caller could not resolve a client identifier.
const UNKNOWN_CLIENT: &str = "unknown";

/// Admission decision for one request from `identifier`.
pub trait RateLimiter: Send + Sync {
    fn allow(&self, identifier: &str) -> bool;
}

/// In-process sliding-window limiter.
pub struct SlidingWindowLimiter<C: Clock = SystemClock> {
    windows: DashMap<String, VecDeque<Instant>>,
    limit: usize,
    window: Duration,
    clock: C,
}

impl SlidingWindowLimiter<SystemClock> {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self::with_clock(limit, window, SystemClock)
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.limit, config.window())
    }
}

impl<C: Clock> SlidingWindowLimiter<C> {
    pub fn with_clock(limit: usize, window: Duration, clock: C) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
            window,
            clock,
        }
    }

    /// Number of identifiers currently holding a window.
    pub fn tracked_identifiers(&self) -> usize {
        self.windows.len()
    }

    /// Accepted instants currently retained for `identifier`.
    pub fn retained(&self, identifier: &str) -> usize {
        self.windows.get(identifier).map_or(0, |w| w.len())
    }
}

impl<C: Clock> RateLimiter for SlidingWindowLimiter<C> {
    fn allow(&self, identifier: &str) -> bool {
        let key = if identifier.is_empty() {
            UNKNOWN_CLIENT
        } else {
            identifier
        };

        let now = self.clock.now();

        // The entry guard holds the shard lock: prune, decide and append are
        // one critical section for this key.
        let mut hits = self.windows.entry(key.to_string()).or_default();

        while let Some(&oldest) = hits.front() {
            if now.saturating_duration_since(oldest) > self.window {
                hits.pop_front();
            } else {
                break;
            }
        }

        if hits.len() >= self.limit {
            return false;
        }

        hits.push_back(now);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::clock::mock::MockClock;
    use std::sync::Arc;

    const WINDOW: Duration = Duration::from_secs(600);

    fn limiter() -> (SlidingWindowLimiter<MockClock>, MockClock) {
        let clock = MockClock::new(Instant::now());
        (SlidingWindowLimiter::with_clock(5, WINDOW, clock.clone()), clock)
    }

    #[test]
    fn sixth_request_in_window_is_denied() {
        let (limiter, clock) = limiter();
        for _ in 0..5 {
            assert!(limiter.allow("10.0.0.1"));
            clock.advance(Duration::from_secs(30));
        }
        assert!(!limiter.allow("10.0.0.1"));
        assert_eq!(limiter.retained("10.0.0.1"), 5);
    }

    #[test]
    fn denied_attempts_do_not_extend_the_window() {
        let (limiter, clock) = limiter();
        for _ in 0..5 {
            assert!(limiter.allow("ip"));
        }
        for _ in 0..20 {
            assert!(!limiter.allow("ip"));
        }
        assert_eq!(limiter.retained("ip"), 5);

        clock.advance(WINDOW + Duration::from_millis(1));
        assert!(limiter.allow("ip"));
    }

    #[test]
    fn oldest_expiring_frees_exactly_one_slot() {
        let (limiter, clock) = limiter();
        assert!(limiter.allow("ip"));
        clock.advance(Duration::from_secs(60));
        for _ in 0..4 {
            assert!(limiter.allow("ip"));
        }
        assert!(!limiter.allow("ip"));

        // First hit is now exactly one window old: still counted.
        clock.advance(WINDOW - Duration::from_secs(60));
        assert!(!limiter.allow("ip"));

        clock.advance(Duration::from_millis(1));
        assert!(limiter.allow("ip"));
        assert!(!limiter.allow("ip"));
    }

    #[test]
    fn identifiers_are_independent() {
        let (limiter, _clock) = limiter();
        for _ in 0..5 {
            assert!(limiter.allow("a"));
        }
        assert!(!limiter.allow("a"));
        assert!(limiter.allow("b"));
        assert_eq!(limiter.tracked_identifiers(), 2);
    }

    #[test]
    fn empty_identifier_shares_the_unknown_bucket() {
        let (limiter, _clock) = limiter();
        for _ in 0..5 {
            assert!(limiter.allow(""));
        }
        assert!(!limiter.allow(UNKNOWN_CLIENT));
    }

    #[test]
    fn concurrent_callers_never_exceed_the_limit() {
        let limiter = Arc::new(SlidingWindowLimiter::new(5, WINDOW));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || (0..10).filter(|_| limiter.allow("shared")).count())
            })
            .collect();

        let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(accepted, 5);
    }
}
