//! Retry logic with exponential backoff
//!
//! Used by the HTTP data source for transient failures. The resource engine
//! never retries anything; a fetch that still fails after the last attempt
//! is reported as-is.

use crate::error::{IsRetryable, Result, RmonError};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Exponential backoff retry policy
#[derive(Debug, Clone)]
pub struct ExponentialBackoffPolicy {
    max_attempts: u32,
    initial_delay: Duration,
    max_delay: Duration,
    jitter_factor: f64,
}

impl Default for ExponentialBackoffPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

impl ExponentialBackoffPolicy {
    /// Create a new exponential backoff policy
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            jitter_factor: 0.1,
        }
    }

    /// Override the first backoff delay (tests use a tiny one)
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Calculate backoff delay for given attempt number
    fn calculate_backoff(&self, attempt: u32) -> Duration {
        let exponential = self.initial_delay.as_millis() as f64 * 2f64.powi(attempt as i32);
        let delay_ms = exponential.min(self.max_delay.as_millis() as f64);

        let jitter = delay_ms * self.jitter_factor * fastrand::f64();
        Duration::from_millis((delay_ms + jitter) as u64)
    }

    /// Execute a function with retry logic
    pub async fn execute_with_retry<F, Fut, T>(&self, f: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        loop {
            match f().await {
                Ok(result) => {
                    if attempt > 0 {
                        info!("Request succeeded after {} retries", attempt);
                    }
                    return Ok(result);
                }
                Err(e) if !e.is_retryable() => {
                    return Err(e);
                }
                Err(e) if attempt + 1 >= self.max_attempts => {
                    warn!("Max retries ({}) reached", self.max_attempts);
                    return Err(RmonError::Retryable {
                        attempt: attempt + 1,
                        max_attempts: self.max_attempts,
                        reason: e.to_string(),
                        source: Some(Box::new(e)),
                    });
                }
                Err(e) => {
                    let backoff = self.calculate_backoff(attempt);
                    warn!(
                        "Retryable error (attempt {}/{}), retrying in {:?}: {}",
                        attempt + 1,
                        self.max_attempts,
                        backoff,
                        e
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(attempts: u32) -> ExponentialBackoffPolicy {
        ExponentialBackoffPolicy::new(attempts).with_initial_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_retry_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = fast_policy(3)
            .execute_with_retry(|| async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(RmonError::Network("connection reset".to_string()))
                } else {
                    Ok("catalog")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "catalog");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_fails_immediately() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast_policy(5)
            .execute_with_retry(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RmonError::Auth("token rejected".to_string()))
            })
            .await;

        assert!(matches!(result, Err(RmonError::Auth(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_wrap_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast_policy(2)
            .execute_with_retry(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RmonError::Api {
                    status: 502,
                    message: "bad gateway".to_string(),
                })
            })
            .await;

        match result {
            Err(RmonError::Retryable {
                attempt,
                max_attempts,
                ..
            }) => {
                assert_eq!(attempt, 2);
                assert_eq!(max_attempts, 2);
            }
            other => panic!("expected Retryable, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = ExponentialBackoffPolicy::new(10);
        let delay = policy.calculate_backoff(20);
        assert!(delay <= Duration::from_millis(33_000));
        assert_eq!(ExponentialBackoffPolicy::new(0).max_attempts(), 1);
    }
}
