use std::time::{Duration, Instant};
use tokio::time::sleep;

use crate::config::DEFAULT_REQUEST_INTERVAL_MS;

/// Fixed-interval rate limiter for Etsy API requests.
///
/// Keeps the earliest instant at which the next request may start. Each
/// call to [`wait`](Self::wait) sleeps until that instant and pushes it one
/// interval further, so back-to-back requests are spaced by at least
/// `min_interval`. Bursts are never allowed.
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    next_allowed: Option<Instant>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            next_allowed: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// How long a request issued at `now` would have to wait.
    pub fn delay_at(&self, now: Instant) -> Duration {
        self.next_allowed
            .map(|next| next.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    /// Waits for the next slot and returns the instant the request was released.
    pub async fn wait(&mut self) -> Instant {
        let delay = self.delay_at(Instant::now());
        if !delay.is_zero() {
            sleep(delay).await;
        }
        let released = Instant::now();
        self.next_allowed = Some(released + self.min_interval);
        released
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_REQUEST_INTERVAL_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_interval() {
        let limiter = RateLimiter::default();
        assert_eq!(limiter.min_interval(), Duration::from_millis(120));
        assert_eq!(limiter.delay_at(Instant::now()), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_first_request_does_not_wait() {
        let mut limiter = RateLimiter::new(Duration::from_secs(3600));
        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_back_to_back_requests_are_spaced() {
        let interval = Duration::from_millis(50);
        let mut limiter = RateLimiter::new(interval);

        let first = limiter.wait().await;
        let second = limiter.wait().await;
        let third = limiter.wait().await;

        assert!(second.duration_since(first) >= interval);
        assert!(third.duration_since(second) >= interval);
    }

    #[tokio::test]
    async fn test_idle_time_counts_toward_interval() {
        let interval = Duration::from_millis(30);
        let mut limiter = RateLimiter::new(interval);

        limiter.wait().await;
        sleep(Duration::from_millis(40)).await;
        assert_eq!(limiter.delay_at(Instant::now()), Duration::ZERO);
    }
}
