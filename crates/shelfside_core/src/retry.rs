//! crates/shelfside_core/src/retry.rs
//!
//! A small, explicit retry policy used by the seek and jump scroll flows.
//! The attempt bound and the cancellation behavior live here so they can be
//! tested in isolation instead of being buried in recursive timer callbacks.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Bounded retry: run an attempt up to `max_attempts` times, `interval`
/// apart, stopping early on success or cancellation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Runs `attempt` until it yields `Some`, the attempt budget is spent,
    /// or `cancel` fires. Exhaustion and cancellation both return `None`;
    /// neither schedules further work.
    pub async fn run<T, F, Fut>(&self, cancel: &CancellationToken, mut attempt: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Option<T>>,
    {
        for n in 1..=self.max_attempts {
            if cancel.is_cancelled() {
                return None;
            }
            if let Some(value) = attempt().await {
                return Some(value);
            }
            if n == self.max_attempts {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => return None,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn stops_after_the_attempt_budget() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));
        let cancel = CancellationToken::new();
        let mut attempts = 0u32;

        let started = tokio::time::Instant::now();
        let result: Option<()> = policy
            .run(&cancel, || {
                attempts += 1;
                async { None }
            })
            .await;

        assert_eq!(result, None);
        assert_eq!(attempts, 5);
        // Four sleeps between five attempts.
        assert_eq!(started.elapsed(), Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn returns_the_first_success() {
        let policy = RetryPolicy::new(10, Duration::from_millis(100));
        let cancel = CancellationToken::new();
        let mut attempts = 0u32;

        let result = policy
            .run(&cancel, || {
                attempts += 1;
                let hit = attempts == 3;
                async move { hit.then_some(42) }
            })
            .await;

        assert_eq!(result, Some(42));
        assert_eq!(attempts, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_further_attempts() {
        let policy = RetryPolicy::new(100, Duration::from_millis(100));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let mut attempts = 0u32;

        let result: Option<()> = policy
            .run(&cancel, || {
                attempts += 1;
                async { None }
            })
            .await;

        assert_eq!(result, None);
        assert_eq!(attempts, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_during_the_wait_interrupts_the_sleep() {
        let policy = RetryPolicy::new(100, Duration::from_secs(10));
        let cancel = CancellationToken::new();

        let child = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            child.cancel();
        });

        let started = tokio::time::Instant::now();
        let result: Option<()> = policy.run(&cancel, || async { None }).await;

        assert_eq!(result, None);
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
