//! Clock and sleep abstraction
//!
//! Link freshness and throttle back-off depend on time. Services take an
//! `Arc<dyn Clock>` so tests can drive time explicitly instead of waiting.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::time::Duration;

/// Source of wall-clock time and suspension
#[async_trait]
pub trait Clock: Send + Sync {
    /// Returns the current time
    fn now(&self) -> DateTime<Utc>;

    /// Suspends the caller for the given duration
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by `chrono::Utc` and `tokio::time::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Manually driven clock
///
/// `sleep` returns immediately after advancing the clock by the requested
/// duration and recording it, so callers observe the same elapsed time they
/// would under a real clock.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    /// Creates a clock frozen at `start`
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Moves the clock forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += chrono::Duration::from_std(duration).unwrap_or(chrono::Duration::zero());
        }
    }

    /// Returns every duration passed to `sleep`, in call order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Total time spent sleeping
    pub fn total_slept(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_else(|_| Utc::now())
    }

    async fn sleep(&self, duration: Duration) {
        if let Ok(mut sleeps) = self.sleeps.lock() {
            sleeps.push(duration);
        }
        self.advance(duration);
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_manual_clock_sleep_advances_time() {
        let start = Utc::now();
        let clock = ManualClock::new(start);

        clock.sleep(Duration::from_secs(10)).await;
        clock.sleep(Duration::from_millis(500)).await;

        assert_eq!(clock.sleeps().len(), 2);
        assert_eq!(clock.total_slept(), Duration::from_millis(10_500));
        assert_eq!(clock.now() - start, chrono::Duration::milliseconds(10_500));
    }

    #[test]
    fn test_manual_clock_advance_does_not_record_sleep() {
        let start = Utc::now();
        let clock = ManualClock::new(start);

        clock.advance(Duration::from_secs(60));

        assert!(clock.sleeps().is_empty());
        assert_eq!(clock.now() - start, chrono::Duration::seconds(60));
    }

    #[tokio::test]
    async fn test_system_clock_sleep_zero() {
        let clock = SystemClock;
        let before = clock.now();
        clock.sleep(Duration::ZERO).await;
        assert!(clock.now() >= before);
    }
}
