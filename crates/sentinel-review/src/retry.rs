//! Bounded retry with linear backoff for platform write-backs.

use std::future::Future;
use std::time::Duration;

use sentinel_core::{RetryConfig, SentinelError};

/// How many times to try and how long to wait in between.
///
/// Attempt `n` (1-based) that fails waits `n * base_delay` before the next
/// one. There is no jitter and no distinction between error kinds.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use sentinel_review::retry::RetryPolicy;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts, 2);
/// assert_eq!(policy.delay_after(2), Duration::from_millis(2000));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Delay unit for the linear backoff.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }
}

impl RetryPolicy {
    /// Wait after failed attempt number `attempt`.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }

    /// Run `operation` until it succeeds or the attempts run out.
    ///
    /// Each failure is logged with its attempt number. When attempts remain,
    /// the executor sleeps for [`RetryPolicy::delay_after`] before calling
    /// `operation` again.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::Retry`] wrapping the last error, tagged with
    /// `description`.
    pub async fn run<T, F, Fut>(&self, description: &str, mut operation: F) -> Result<T, SentinelError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SentinelError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        max_attempts,
                        description,
                        error = %e,
                        "attempt failed"
                    );
                    if attempt >= max_attempts {
                        return Err(SentinelError::Retry {
                            description: description.to_string(),
                            attempts: attempt,
                            source: Box::new(e),
                        });
                    }
                    tokio::time::sleep(self.delay_after(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}

/// Run `operation` with up to `max_attempts` tries and a one-second linear
/// backoff unit.
///
/// # Errors
///
/// Returns [`SentinelError::Retry`] wrapping the last error.
pub async fn with_retry<T, F, Fut>(
    operation: F,
    description: &str,
    max_attempts: u32,
) -> Result<T, SentinelError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SentinelError>>,
{
    RetryPolicy {
        max_attempts,
        ..RetryPolicy::default()
    }
    .run(description, operation)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn fails_once_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = fast(2)
            .run("post comment", || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n == 1 {
                        Err(SentinelError::Platform("502".into()))
                    } else {
                        Ok("posted")
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), "posted");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn exhausted_attempts_tag_last_error() {
        let calls = AtomicU32::new(0);
        let err = fast(3)
            .run("post review", || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move { Err::<(), _>(SentinelError::Platform(format!("failure {n}"))) }
            })
            .await
            .unwrap_err();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match err {
            SentinelError::Retry {
                description,
                attempts,
                source,
            } => {
                assert_eq!(description, "post review");
                assert_eq!(attempts, 3);
                assert!(source.to_string().contains("failure 3"));
            }
            other => panic!("expected retry error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_on_first_try_calls_once() {
        let calls = AtomicU32::new(0);
        let value = fast(2)
            .run("noop", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, SentinelError>(7) }
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_attempts_still_tries_once() {
        let calls = AtomicU32::new(0);
        let _ = fast(0)
            .run("noop", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(SentinelError::Platform("x".into())) }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn configuration_errors_are_retried_like_any_other() {
        let calls = AtomicU32::new(0);
        let _ = fast(2)
            .run("noop", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(SentinelError::Config("bad".into())) }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn with_retry_defaults_to_linear_seconds() {
        let start = tokio::time::Instant::now();
        let calls = AtomicU32::new(0);
        let result = with_retry(
            || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 2 {
                        Err(SentinelError::Platform("flaky".into()))
                    } else {
                        Ok(n)
                    }
                }
            },
            "flaky op",
            2,
        )
        .await
        .unwrap();
        assert_eq!(result, 2);
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[test]
    fn policy_from_config() {
        let config = RetryConfig {
            max_attempts: 5,
            base_delay_ms: 20,
        };
        let policy = RetryPolicy::from(&config);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.delay_after(3), Duration::from_millis(60));
    }
}
