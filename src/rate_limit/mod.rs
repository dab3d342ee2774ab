//! Fixed-window request counters keyed by limiter category and client key.
//!
//! Each `(category, client)` pair owns one window. The first request opens it
//! with `count = 1`; later requests increment until `max_requests`, after which
//! requests are rejected without touching the window. Once `now >= reset_at`
//! the window is treated as absent and the next request replaces it.
//!
//! The table is a `DashMap`, so read-modify-write happens under the owning
//! shard's lock and unrelated clients are not serialized behind one mutex.
//! The sweeper uses `retain`, which takes the same shard locks and re-checks
//! `reset_at` while holding them.
//!
//! State is process-local: running several instances multiplies the
//! effective budget by the instance count.

pub mod sweeper;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::auth::ClientKey;
use crate::clock::Clock;

pub use sweeper::spawn_sweeper;

/// Named rate-limit policy bucket. Every category has its own keyspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LimiterCategory {
    General,
    Upload,
    Chat,
}

impl LimiterCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LimiterCategory::General => "general",
            LimiterCategory::Upload => "upload",
            LimiterCategory::Chat => "chat",
        }
    }
}

impl fmt::Display for LimiterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl LimitPolicy {
    pub const fn new(max_requests: u32, window: Duration) -> Self {
        Self { max_requests, window }
    }

    fn window_delta(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.window.as_millis() as i64)
    }
}

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// When false every request is admitted and nothing is recorded.
    pub enabled: bool,
    pub general: LimitPolicy,
    pub upload: LimitPolicy,
    pub chat: LimitPolicy,
}

impl RateLimitConfig {
    pub fn policy(&self, category: LimiterCategory) -> LimitPolicy {
        match category {
            LimiterCategory::General => self.general,
            LimiterCategory::Upload => self.upload,
            LimiterCategory::Chat => self.chat,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            general: LimitPolicy::new(100, Duration::from_secs(60)),
            upload: LimitPolicy::new(10, Duration::from_secs(300)),
            chat: LimitPolicy::new(50, Duration::from_secs(60)),
        }
    }
}

/// Counter for one `(category, client)` pair.
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    reset_at: DateTime<Utc>,
}

impl RateWindow {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.reset_at
    }
}

/// Outcome of a single admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_at: DateTime<Utc>,
}

impl RateDecision {
    /// Whole seconds until the window resets, rounded up.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.reset_at - now).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000)
    }

    /// Reset time as epoch milliseconds.
    pub fn reset_time_millis(&self) -> i64 {
        self.reset_at.timestamp_millis()
    }
}

type WindowKey = (LimiterCategory, String);

/// Per-client fixed-window rate limiter.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    windows: DashMap<WindowKey, RateWindow>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            windows: DashMap::new(),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Admit or reject one request for `client` in `category`.
    ///
    /// Rejections never consume a slot and never move `reset_at`.
    pub fn check(&self, category: LimiterCategory, client: &ClientKey) -> RateDecision {
        let policy = self.config.policy(category);
        let now = self.clock.now();

        if !self.config.enabled {
            return RateDecision {
                allowed: true,
                remaining: policy.max_requests,
                reset_at: now + policy.window_delta(),
            };
        }

        let mut entry = self
            .windows
            .entry((category, client.as_str().to_string()))
            .or_insert(RateWindow {
                count: 0,
                reset_at: now,
            });
        let window = entry.value_mut();

        if window.count == 0 || window.is_expired(now) {
            *window = RateWindow {
                count: 1,
                reset_at: now + policy.window_delta(),
            };
            return RateDecision {
                allowed: policy.max_requests > 0,
                remaining: policy.max_requests.saturating_sub(1),
                reset_at: window.reset_at,
            };
        }

        if window.count >= policy.max_requests {
            return RateDecision {
                allowed: false,
                remaining: 0,
                reset_at: window.reset_at,
            };
        }

        window.count += 1;
        RateDecision {
            allowed: true,
            remaining: policy.max_requests - window.count,
            reset_at: window.reset_at,
        }
    }

    /// Drop every window whose reset time has passed. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let before = self.windows.len();
        self.windows.retain(|_, window| !window.is_expired(now));
        before.saturating_sub(self.windows.len())
    }

    /// Number of tracked windows, expired or not.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Current count for a pair, ignoring windows that have already expired.
    pub fn current_count(&self, category: LimiterCategory, client: &ClientKey) -> Option<u32> {
        let now = self.clock.now();
        self.windows
            .get(&(category, client.as_str().to_string()))
            .filter(|w| !w.is_expired(now))
            .map(|w| w.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::MockClock;

    fn limiter_with(policy: LimitPolicy) -> (RateLimiter, Arc<MockClock>) {
        let clock = Arc::new(MockClock::at_epoch());
        let config = RateLimitConfig {
            enabled: true,
            general: policy,
            upload: policy,
            chat: policy,
        };
        (RateLimiter::new(config, clock.clone()), clock)
    }

    fn key(s: &str) -> ClientKey {
        ClientKey::new(s)
    }

    #[test]
    fn fixed_window_scenario() {
        let (limiter, clock) = limiter_with(LimitPolicy::new(2, Duration::from_millis(60_000)));
        let client = key("10.0.0.1");

        let first = limiter.check(LimiterCategory::General, &client);
        assert!(first.allowed);
        assert_eq!(first.remaining, 1);
        assert_eq!(first.reset_time_millis(), 60_000);

        clock.advance(Duration::from_millis(1));
        let second = limiter.check(LimiterCategory::General, &client);
        assert!(second.allowed);
        assert_eq!(second.remaining, 0);

        clock.advance(Duration::from_millis(1));
        let third = limiter.check(LimiterCategory::General, &client);
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);
        assert_eq!(third.reset_time_millis(), 60_000);

        clock.set(DateTime::<Utc>::default() + chrono::Duration::milliseconds(61_000));
        let fourth = limiter.check(LimiterCategory::General, &client);
        assert!(fourth.allowed);
        assert_eq!(fourth.remaining, 1);
        assert_eq!(limiter.current_count(LimiterCategory::General, &client), Some(1));
        assert_eq!(fourth.reset_time_millis(), 121_000);
    }

    #[test]
    fn rejection_does_not_extend_window() {
        let (limiter, clock) = limiter_with(LimitPolicy::new(1, Duration::from_secs(10)));
        let client = key("a");

        assert!(limiter.check(LimiterCategory::Chat, &client).allowed);
        for _ in 0..5 {
            clock.advance(Duration::from_secs(1));
            let denied = limiter.check(LimiterCategory::Chat, &client);
            assert!(!denied.allowed);
            assert_eq!(denied.reset_time_millis(), 10_000);
        }
        assert_eq!(limiter.current_count(LimiterCategory::Chat, &client), Some(1));
    }

    #[test]
    fn window_expires_exactly_at_reset_time() {
        let (limiter, clock) = limiter_with(LimitPolicy::new(1, Duration::from_secs(60)));
        let client = key("a");

        assert!(limiter.check(LimiterCategory::General, &client).allowed);
        clock.advance(Duration::from_millis(59_999));
        assert!(!limiter.check(LimiterCategory::General, &client).allowed);
        clock.advance(Duration::from_millis(1));
        assert!(limiter.check(LimiterCategory::General, &client).allowed);
    }

    #[test]
    fn remaining_counts_down_and_never_goes_negative() {
        let (limiter, _clock) = limiter_with(LimitPolicy::new(5, Duration::from_secs(60)));
        let client = key("a");

        let remaining: Vec<u32> = (0..8)
            .map(|_| limiter.check(LimiterCategory::General, &client).remaining)
            .collect();
        assert_eq!(remaining, vec![4, 3, 2, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn categories_and_clients_are_isolated() {
        let (limiter, _clock) = limiter_with(LimitPolicy::new(1, Duration::from_secs(60)));

        assert!(limiter.check(LimiterCategory::General, &key("a")).allowed);
        assert!(!limiter.check(LimiterCategory::General, &key("a")).allowed);

        assert!(limiter.check(LimiterCategory::Upload, &key("a")).allowed);
        assert!(limiter.check(LimiterCategory::Chat, &key("a")).allowed);
        assert!(limiter.check(LimiterCategory::General, &key("b")).allowed);
    }

    #[test]
    fn default_policies() {
        let config = RateLimitConfig::default();
        assert_eq!(config.policy(LimiterCategory::General), LimitPolicy::new(100, Duration::from_secs(60)));
        assert_eq!(config.policy(LimiterCategory::Upload), LimitPolicy::new(10, Duration::from_secs(300)));
        assert_eq!(config.policy(LimiterCategory::Chat), LimitPolicy::new(50, Duration::from_secs(60)));
    }

    #[test]
    fn sweep_keeps_live_windows_and_drops_expired_ones() {
        let clock = Arc::new(MockClock::at_epoch());
        let limiter = RateLimiter::new(RateLimitConfig::default(), clock.clone());

        limiter.check(LimiterCategory::General, &key("short")); // resets at 60s
        limiter.check(LimiterCategory::Upload, &key("long")); // resets at 300s
        assert_eq!(limiter.len(), 2);

        clock.advance(Duration::from_secs(30));
        assert_eq!(limiter.sweep(), 0);
        assert_eq!(limiter.len(), 2);

        clock.advance(Duration::from_secs(30));
        assert_eq!(limiter.sweep(), 1);
        assert_eq!(limiter.current_count(LimiterCategory::Upload, &key("long")), Some(1));
        assert_eq!(limiter.current_count(LimiterCategory::General, &key("short")), None);
    }

    #[test]
    fn retry_after_rounds_up() {
        let decision = RateDecision {
            allowed: false,
            remaining: 0,
            reset_at: DateTime::<Utc>::default() + chrono::Duration::milliseconds(1_001),
        };
        assert_eq!(decision.retry_after_secs(DateTime::<Utc>::default()), 2);
        assert_eq!(
            decision.retry_after_secs(DateTime::<Utc>::default() + chrono::Duration::milliseconds(1_001)),
            0
        );
    }

    #[test]
    fn disabled_limiter_admits_everything() {
        let clock = Arc::new(MockClock::at_epoch());
        let config = RateLimitConfig {
            enabled: false,
            ..RateLimitConfig::default()
        };
        let limiter = RateLimiter::new(config, clock);
        for _ in 0..500 {
            assert!(limiter.check(LimiterCategory::Upload, &key("a")).allowed);
        }
        assert!(limiter.is_empty());
    }

    #[test]
    fn concurrent_checks_never_over_admit() {
        let clock = Arc::new(MockClock::at_epoch());
        let limiter = Arc::new(RateLimiter::new(
            RateLimitConfig {
                enabled: true,
                general: LimitPolicy::new(100, Duration::from_secs(60)),
                ..RateLimitConfig::default()
            },
            clock,
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    (0..50)
                        .filter(|_| limiter.check(LimiterCategory::General, &ClientKey::new("shared")).allowed)
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(admitted, 100);
        assert_eq!(limiter.current_count(LimiterCategory::General, &key("shared")), Some(100));
    }
}
