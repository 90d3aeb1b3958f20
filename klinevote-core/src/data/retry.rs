//! Bounded exponential backoff for async operations.
//!
//! Attempt 0 runs immediately; retry `k` (1-based) waits
//! `min(max_delay, base_delay * 2^(k-1))`. Only errors accepted by the
//! caller's predicate are retried; everything else returns at once.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    /// Policy used for outgoing chat messages.
    pub fn messaging() -> Self {
        Self {
            max_delay_ms: 3_000,
            ..Self::default()
        }
    }

    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Wait before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u64.saturating_pow(retry.saturating_sub(1));
        let ms = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(ms)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// retry budget is spent. The last error is returned.
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    label: &str,
    is_retryable: P,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut retry = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if retry < policy.max_retries && is_retryable(&err) => {
                retry += 1;
                let delay = policy.delay_for(retry);
                warn!(
                    operation = label,
                    attempt = retry,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Flaky,
        Fatal,
    }

    impl std::fmt::Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    #[test]
    fn delays_double_and_cap() {
        let p = RetryPolicy {
            max_retries: 5,
            base_delay_ms: 500,
            max_delay_ms: 3_000,
        };
        assert_eq!(p.delay_for(1), Duration::from_millis(500));
        assert_eq!(p.delay_for(2), Duration::from_millis(1_000));
        assert_eq!(p.delay_for(3), Duration::from_millis(2_000));
        assert_eq!(p.delay_for(4), Duration::from_millis(3_000));
        assert_eq!(p.delay_for(60), Duration::from_millis(3_000));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = retry_with_backoff(
            &RetryPolicy::default(),
            "test",
            |e: &TestError| *e == TestError::Flaky,
            || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TestError::Flaky)
                } else {
                    Ok(7)
                }
            },
        )
        .await;
        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_retries() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), TestError> = retry_with_backoff(
            &RetryPolicy::default(),
            "test",
            |_| true,
            || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Flaky)
            },
        )
        .await;
        assert_eq!(result, Err(TestError::Flaky));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), TestError> = retry_with_backoff(
            &RetryPolicy::default(),
            "test",
            |e: &TestError| *e == TestError::Flaky,
            || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Fatal)
            },
        )
        .await;
        assert_eq!(result, Err(TestError::Fatal));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn none_policy_runs_once() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let _: Result<(), TestError> = retry_with_backoff(
            &RetryPolicy::none(),
            "test",
            |_| true,
            || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Flaky)
            },
        )
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
