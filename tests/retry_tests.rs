//! Tests for retry logic
//!
//! Tests verify exponential backoff, retry limits, and which errors are retried.

use rmon::error::{IsRetryable, RmonError};
use rmon::retry::ExponentialBackoffPolicy;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

fn fast_policy(attempts: u32) -> ExponentialBackoffPolicy {
    ExponentialBackoffPolicy::new(attempts).with_initial_delay(Duration::from_millis(1))
}

#[test]
fn test_policy_attempts() {
    assert_eq!(ExponentialBackoffPolicy::new(5).max_attempts(), 5);
    assert_eq!(ExponentialBackoffPolicy::default().max_attempts(), 3);
    // At least one attempt is always made
    assert_eq!(ExponentialBackoffPolicy::new(0).max_attempts(), 1);
}

#[tokio::test]
async fn test_retry_succeeds_immediately() {
    let calls = AtomicU32::new(0);
    let result = fast_policy(3)
        .execute_with_retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, RmonError>(42)
        })
        .await;

    assert_eq!(result.unwrap(), 42);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_retry_exhausts_attempts() {
    let calls = AtomicU32::new(0);
    let result: rmon::Result<()> = fast_policy(3)
        .execute_with_retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RmonError::Api {
                status: 502,
                message: "bad gateway".to_string(),
            })
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    match result {
        Err(RmonError::Retryable {
            attempt,
            max_attempts,
            reason,
            ..
        }) => {
            assert_eq!(attempt, 3);
            assert_eq!(max_attempts, 3);
            assert!(reason.contains("bad gateway"));
        }
        other => panic!("expected Retryable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_validation_errors_not_retried() {
    let calls = AtomicU32::new(0);
    let result: rmon::Result<()> = fast_policy(4)
        .execute_with_retry(|| async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(RmonError::validation("page", "must be positive"))
        })
        .await;

    assert!(matches!(result, Err(RmonError::Validation { .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_backoff_waits_between_attempts() {
    let policy = ExponentialBackoffPolicy::new(3).with_initial_delay(Duration::from_millis(20));
    let start = Instant::now();
    let result: rmon::Result<()> = policy
        .execute_with_retry(|| async { Err(RmonError::Network("timeout".to_string())) })
        .await;

    assert!(result.is_err());
    // 20ms + 40ms of backoff before the third attempt
    assert!(start.elapsed() >= Duration::from_millis(60));
}

#[test]
fn test_retryable_classification() {
    assert!(RmonError::Network("reset".to_string()).is_retryable());
    assert!(RmonError::Api {
        status: 503,
        message: String::new()
    }
    .is_retryable());
    assert!(!RmonError::Api {
        status: 404,
        message: String::new()
    }
    .is_retryable());
    assert!(!RmonError::Auth("expired".to_string()).is_retryable());
    assert!(!RmonError::unavailable("catalog", "bad body").is_retryable());
}
