//! Minimum-gap pacing between outbound requests.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

/// Enforces a minimum delay between consecutive requests.
///
/// [`RateLimiter::wait`] async-blocks until at least the configured delay
/// has passed since the previous `wait` returned. The lock is held across
/// the sleep, so concurrent callers are serialized and each observes the
/// full gap.
#[derive(Debug)]
pub struct RateLimiter {
    delay: Duration,
    last: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Creates a limiter with the given minimum gap.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            last: Mutex::const_new(None),
        }
    }

    /// Blocks until the minimum gap since the previous call has elapsed.
    pub async fn wait(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.delay {
                sleep(self.delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn first_wait_returns_immediately() {
        let limiter = RateLimiter::new(Duration::from_secs(2));
        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn consecutive_waits_observe_the_gap() {
        let limiter = RateLimiter::new(Duration::from_secs(2));
        limiter.wait().await;
        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn gap_is_measured_from_previous_return() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        limiter.wait().await;
        sleep(Duration::from_secs(5)).await;
        let start = Instant::now();
        limiter.wait().await;
        // Previous wait was long enough ago that no sleep is needed.
        assert!(start.elapsed() < Duration::from_millis(1));
    }
}
