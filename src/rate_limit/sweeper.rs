use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::RateLimiter;

/// Periodically drop expired windows so abandoned clients don't accumulate.
///
/// The task runs until the returned handle is aborted or the runtime shuts down.
pub fn spawn_sweeper(limiter: Arc<RateLimiter>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = limiter.sweep();
            if removed > 0 {
                tracing::debug!(removed, remaining = limiter.len(), "Swept expired rate limit windows");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ClientKey;
    use crate::clock::MockClock;
    use crate::rate_limit::{LimiterCategory, RateLimitConfig};

    #[tokio::test(start_paused = true)]
    async fn sweeper_removes_expired_windows_within_one_period() {
        let clock = Arc::new(MockClock::at_epoch());
        let limiter = Arc::new(RateLimiter::new(RateLimitConfig::default(), clock.clone()));
        limiter.check(LimiterCategory::General, &ClientKey::new("gone"));
        limiter.check(LimiterCategory::Upload, &ClientKey::new("stays"));

        let handle = spawn_sweeper(limiter.clone(), Duration::from_secs(60));
        tokio::task::yield_now().await;

        clock.advance(Duration::from_secs(61));
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(limiter.len(), 1);
        assert_eq!(
            limiter.current_count(LimiterCategory::Upload, &ClientKey::new("stays")),
            Some(1)
        );
        handle.abort();
    }
}
