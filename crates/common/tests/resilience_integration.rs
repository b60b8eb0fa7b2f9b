//! Integration tests for resilience module
//!
//! Tests the retry executor against realistic transient-failure sequences

#![cfg(feature = "runtime")]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use smsdesk_common::resilience::{
    Jitter, RecordingSleeper, RetryConfig, RetryDecision, RetryError, RetryExecutor, RetryPolicy,
};

/// Custom error type for testing
#[derive(Debug, Clone, PartialEq)]
enum TestError {
    Unavailable,
    RateLimited(Duration),
    Rejected,
}

struct TestPolicy;

impl RetryPolicy<TestError> for TestPolicy {
    fn should_retry(&self, error: &TestError, _attempt: u32) -> RetryDecision {
        match error {
            TestError::Unavailable => RetryDecision::Retry,
            TestError::RateLimited(delay) => RetryDecision::RetryAfter(*delay),
            TestError::Rejected => RetryDecision::Stop,
        }
    }
}

fn config(max_retries: u32) -> RetryConfig {
    RetryConfig::builder()
        .max_retries(max_retries)
        .base_delay(Duration::from_millis(100))
        .max_delay(Duration::from_millis(250))
        .build()
}

/// Validates the backoff schedule over a fully failing sequence.
///
/// # Test Steps
/// 1. Configure 3 retries, base 100ms, cap 250ms
/// 2. Fail every attempt with a retryable error
/// 3. Verify 4 physical attempts were made
/// 4. Verify delays are non-decreasing and never exceed the cap
#[tokio::test]
async fn test_backoff_schedule_is_monotonic_and_capped() {
    let sleeper = RecordingSleeper::new();
    let executor =
        RetryExecutor::new(config(3), TestPolicy).with_sleeper(Arc::new(sleeper.clone()));
    let calls = Arc::new(AtomicU32::new(0));
    let calls_clone = Arc::clone(&calls);

    let result = executor
        .execute(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(TestError::Unavailable) }
        })
        .await;

    assert!(matches!(result, Err(RetryError::AttemptsExhausted { attempts: 4, .. })));
    assert_eq!(calls.load(Ordering::SeqCst), 4);

    let delays = sleeper.recorded();
    assert_eq!(
        delays,
        vec![Duration::from_millis(100), Duration::from_millis(200), Duration::from_millis(250)]
    );
    assert!(delays.windows(2).all(|pair| pair[0] <= pair[1]));
}

/// Validates that a server-provided delay replaces the computed backoff.
///
/// # Test Steps
/// 1. Fail once with a rate-limit error carrying a 200ms delay
/// 2. Succeed on the second attempt
/// 3. Verify exactly one 200ms wait was recorded
#[tokio::test]
async fn test_rate_limit_delay_overrides_backoff() {
    let sleeper = RecordingSleeper::new();
    let executor =
        RetryExecutor::new(config(3), TestPolicy).with_sleeper(Arc::new(sleeper.clone()));

    let result = executor
        .execute(|attempt| async move {
            if attempt == 0 {
                Err(TestError::RateLimited(Duration::from_millis(200)))
            } else {
                Ok("sent")
            }
        })
        .await;

    assert_eq!(result.ok(), Some("sent"));
    assert_eq!(sleeper.recorded(), vec![Duration::from_millis(200)]);
}

/// Validates that a rejected request is attempted once and surfaced as-is.
#[tokio::test]
async fn test_rejection_is_not_retried() {
    let sleeper = RecordingSleeper::new();
    let executor =
        RetryExecutor::new(config(3), TestPolicy).with_sleeper(Arc::new(sleeper.clone()));

    let error = executor
        .execute(|_| async { Err::<(), _>(TestError::Rejected) })
        .await
        .expect_err("rejection should fail");

    assert_eq!(error.attempts(), 1);
    assert_eq!(error.into_inner(), TestError::Rejected);
    assert!(sleeper.recorded().is_empty());
}

/// Validates that jitter keeps every delay within the configured ceiling.
///
/// # Test Steps
/// 1. Configure full jitter with 5 retries
/// 2. Fail every attempt
/// 3. Verify each recorded delay is at most the cap
#[tokio::test]
async fn test_jittered_delays_stay_under_cap() {
    let sleeper = RecordingSleeper::new();
    let mut retry_config = config(5);
    retry_config.jitter = Jitter::Full;
    let executor =
        RetryExecutor::new(retry_config, TestPolicy).with_sleeper(Arc::new(sleeper.clone()));

    let outcome = executor
        .execute_with_outcome(|_| async { Err::<(), _>(TestError::Unavailable) })
        .await;

    assert_eq!(outcome.attempts(), 6);
    assert_eq!(outcome.state.delays.len(), 5);
    assert!(sleeper.recorded().iter().all(|delay| *delay <= Duration::from_millis(250)));
}
