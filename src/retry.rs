//! Retry with exponential backoff around remote calls.
//!
//! Rate-limit and connection failures are retried, waiting `backoff_base^n`
//! seconds before retry `n` (0-based). Authentication failures and anything
//! else unclassified are returned to the caller on the first occurrence.
//!
//! The policy is not tied to an endpoint; wrap any async operation:
//!
//! ```rust,no_run
//! use pantry::retry::RetryPolicy;
//!
//! # async fn example() -> pantry::Result<()> {
//! let policy = RetryPolicy::new(3, 2.0);
//! let value = policy.run("vector query", || async { Ok::<_, pantry::PantryError>(42) }).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetrySettings;
use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Exponential backoff retry policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: f64,
}

impl RetryPolicy {
    /// Create a policy. `max_attempts` counts the first call; zero is treated as one.
    pub fn new(max_attempts: u32, backoff_base: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    /// A policy that never retries.
    pub fn none() -> Self {
        Self::new(1, 0.0)
    }

    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self::new(settings.max_attempts, settings.backoff_base)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before retry number `retry` (0-based): `backoff_base^retry` seconds.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let secs = self.backoff_base.powi(exponent);
        if secs.is_nan() || secs <= 0.0 {
            Duration::ZERO
        } else {
            Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
        }
    }

    /// Run `operation` until it succeeds, fails fatally, or attempts run out.
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempt += 1;
                    if !e.is_retryable() {
                        debug!("{} failed with non-retryable error: {}", label, e);
                        return Err(e);
                    }
                    if attempt >= self.max_attempts {
                        warn!("{} failed after {} attempts: {}", label, attempt, e);
                        return Err(e);
                    }

                    let delay = self.delay_for(attempt - 1);
                    warn!(
                        "{} failed ({}), retry {}/{} in {:.1}s",
                        label,
                        e,
                        attempt,
                        self.max_attempts - 1,
                        delay.as_secs_f64()
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, 2.0)
    }
}

/// Run `operation` under a policy built from `max_attempts` and `backoff_base`.
pub async fn with_retry<T, F, Fut>(
    operation: F,
    max_attempts: u32,
    backoff_base: f64,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    RetryPolicy::new(max_attempts, backoff_base)
        .run("remote call", operation)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PantryError;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;
    use tokio_test::assert_ok;

    #[test]
    fn test_delay_sequence() {
        let policy = RetryPolicy::new(4, 2.0);
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));

        let flat = RetryPolicy::new(3, 1.5);
        assert_eq!(flat.delay_for(1), Duration::from_secs_f64(1.5));
    }

    #[test]
    fn test_huge_delays_saturate() {
        let steep = RetryPolicy::new(4, 1e10);
        assert_eq!(steep.delay_for(3), Duration::MAX);
        assert_eq!(RetryPolicy::new(4, f64::MAX).delay_for(2), Duration::MAX);
        assert_eq!(RetryPolicy::new(4, f64::NAN).delay_for(1), Duration::ZERO);
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0, 2.0).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result: Result<()> = with_retry(
            || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(PantryError::auth("groq", "Invalid API Key")) }
            },
            3,
            2.0,
        )
        .await;

        assert!(matches!(result, Err(PantryError::AuthenticationFailed { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limit_then_success_follows_backoff() {
        let attempts: Arc<Mutex<Vec<Instant>>> = Arc::new(Mutex::new(Vec::new()));

        let recorded = attempts.clone();
        let result = with_retry(
            move || {
                let recorded = recorded.clone();
                async move {
                    let mut seen = recorded.lock().unwrap();
                    seen.push(Instant::now());
                    if seen.len() < 3 {
                        Err(PantryError::rate_limited("groq", "Rate limit reached"))
                    } else {
                        Ok("answer")
                    }
                }
            },
            3,
            2.0,
        )
        .await;

        assert_eq!(assert_ok!(result), "answer");

        let seen = attempts.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1] - seen[0], Duration::from_secs(1));
        assert_eq!(seen[2] - seen[1], Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_returns_last_error() {
        let calls = AtomicU32::new(0);

        let result: Result<()> = RetryPolicy::new(2, 2.0)
            .run("upsert", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move { Err(PantryError::transient("upstash", format!("refused #{}", n))) }
            })
            .await;

        match result {
            Err(PantryError::TransientConnection { message, .. }) => {
                assert_eq!(message, "refused #1")
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_other_errors_are_fatal() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = RetryPolicy::default()
            .run("query", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(PantryError::remote("upstash", "bad request")) }
            })
            .await;

        let err = tokio_test::assert_err!(result);
        assert!(!err.is_retryable());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
