use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use configs::RetryConfig;

/// Errors decide for themselves whether another attempt can help.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

#[derive(Clone, Debug)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: Duration,
    backoff_max: Duration,
    enabled: bool,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration, backoff_max: Duration, enabled: bool) -> Self {
        Self { max_attempts: max_attempts.max(1), backoff_base, backoff_max, enabled }
    }

    pub fn from_config(cfg: &RetryConfig) -> Self {
        Self::new(
            cfg.max_attempts,
            Duration::from_millis(cfg.backoff_base_ms),
            Duration::from_millis(cfg.backoff_max_ms),
            cfg.enabled,
        )
    }

    pub fn max_attempts(&self) -> u32 {
        if self.enabled { self.max_attempts } else { 1 }
    }

    /// `base * 2^(attempt-1)`, capped at `backoff_max`. Attempt 0 never waits.
    pub fn backoff(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        self.backoff_base.saturating_mul(factor).min(self.backoff_max)
    }
}

pub async fn retry_with_policy<F, Fut, T, E>(policy: &RetryPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let max = policy.max_attempts();
    let mut attempt = 0;
    loop {
        if attempt > 0 {
            let wait = policy.backoff(attempt);
            debug!(event = "retry_wait", attempt, wait_ms = wait.as_millis() as u64);
            common::metrics::UPSTREAM_RETRIES_TOTAL.inc();
            sleep(wait).await;
        }
        match operation().await {
            Ok(v) => {
                if attempt > 0 {
                    debug!(event = "retry_succeeded", attempt);
                }
                return Ok(v);
            }
            Err(e) => {
                warn!(event = "attempt_failed", attempt = attempt + 1, error = %e);
                if attempt + 1 >= max || !e.is_retryable() {
                    return Err(e);
                }
            }
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct TestError(bool);

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "test error (retryable={})", self.0)
        }
    }

    impl Retryable for TestError {
        fn is_retryable(&self) -> bool { self.0 }
    }

    fn policy(max: u32, enabled: bool) -> RetryPolicy {
        RetryPolicy::new(max, Duration::from_millis(1), Duration::from_millis(5), enabled)
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();
        let result = retry_with_policy(&policy(3, true), || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 { Err(TestError(true)) } else { Ok(42) }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_at_max_attempts() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();
        let result: Result<(), _> = retry_with_policy(&policy(2, true), || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(TestError(true))
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();
        let result: Result<(), _> = retry_with_policy(&policy(5, true), || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(TestError(false))
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn disabled_policy_tries_once() {
        let counter = Arc::new(AtomicU32::new(0));
        let c = counter.clone();
        let _: Result<(), _> = retry_with_policy(&policy(3, false), || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(TestError(true))
            }
        })
        .await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_is_exponential_and_capped() {
        let p = RetryPolicy::new(10, Duration::from_millis(100), Duration::from_millis(500), true);
        assert_eq!(p.backoff(0), Duration::ZERO);
        assert_eq!(p.backoff(1), Duration::from_millis(100));
        assert_eq!(p.backoff(2), Duration::from_millis(200));
        assert_eq!(p.backoff(3), Duration::from_millis(400));
        assert_eq!(p.backoff(4), Duration::from_millis(500));
        assert_eq!(p.backoff(40), Duration::from_millis(500));
    }
}
