/*!
 * Tests for the retry executor and backoff policy
 */

use std::time::{Duration, Instant};

use backtrans::errors::{ErrorKind, ProviderError, TranslationError};
use backtrans::providers::{MockProvider, TranslationProvider};
use backtrans::translation::{CancellationToken, RetryExecutor, RetryPolicy};
use backtrans::translation::retry::MIN_DELAY_MS;

use crate::common;

#[tokio::test]
async fn test_execute_withPersistentRateLimit_shouldMakeExactlyMaxAttempts() {
    let mock = MockProvider::new().failing(ProviderError::RateLimited("429".to_string()));
    let executor = RetryExecutor::new(common::fast_retry_policy());
    let provider = &mock;

    let err = executor
        .execute("test", &CancellationToken::new(), || provider.translate("Hello", "en", "ja"))
        .await
        .unwrap_err();

    assert_eq!(mock.call_count(), 4);
    assert_eq!(err.kind(), ErrorKind::RateLimited);
    assert_eq!(err.attempts(), Some(4));
}

#[tokio::test]
async fn test_execute_withBlocked_shouldNotRetry() {
    let mock = MockProvider::new().failing(ProviderError::Blocked("captcha".to_string()));
    let executor = RetryExecutor::new(common::fast_retry_policy());
    let provider = &mock;

    let err = executor
        .execute("test", &CancellationToken::new(), || provider.translate("Hello", "en", "ja"))
        .await
        .unwrap_err();

    assert_eq!(mock.call_count(), 1);
    assert_eq!(err.kind(), ErrorKind::Blocked);
    assert_eq!(err.attempts(), Some(1));
}

#[tokio::test]
async fn test_execute_withTransientFailures_shouldSucceedAfterRetries() {
    let mock = MockProvider::new()
        .with_translation("Hello", "Bonjour")
        .failing_first(2, ProviderError::NetworkError("timeout".to_string()));
    let executor = RetryExecutor::new(common::fast_retry_policy());
    let provider = &mock;

    let translated = executor
        .execute("test", &CancellationToken::new(), || provider.translate("Hello", "en", "fr"))
        .await
        .unwrap();

    assert_eq!(translated, "Bonjour");
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test]
async fn test_execute_withInvalidResponse_shouldRetry() {
    let mock = MockProvider::new()
        .failing_first(1, ProviderError::InvalidResponse("empty".to_string()));
    let executor = RetryExecutor::new(common::fast_retry_policy());
    let provider = &mock;

    let result = executor
        .execute("test", &CancellationToken::new(), || provider.translate("Hello", "en", "fr"))
        .await;

    assert!(result.is_ok());
    assert_eq!(mock.call_count(), 2);
}

#[tokio::test]
async fn test_executeWithAttempts_withZeroAttempts_shouldStillTryOnce() {
    let mock = MockProvider::new().failing(ProviderError::NetworkError("down".to_string()));
    let executor = RetryExecutor::new(common::fast_retry_policy());
    let provider = &mock;

    let err = executor
        .execute_with_attempts("test", 0, &CancellationToken::new(), || provider.translate("a", "en", "fr"))
        .await
        .unwrap_err();

    assert_eq!(mock.call_count(), 1);
    assert_eq!(err.attempts(), Some(1));
}

#[tokio::test]
async fn test_execute_withCancelDuringBackoff_shouldStopPromptly() {
    let mock = MockProvider::new().failing(ProviderError::NetworkError("down".to_string()));
    let policy = RetryPolicy {
        base_delay_ms: 5_000,
        ..RetryPolicy::default()
    }
    .without_jitter();
    let executor = RetryExecutor::new(policy);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let provider = &mock;
    let err = executor
        .execute("test", &cancel, || provider.translate("Hello", "en", "ja"))
        .await
        .unwrap_err();

    assert!(matches!(err, TranslationError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(2), "cancellation took {:?}", started.elapsed());
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_execute_withCancelledToken_shouldNotCallOperation() {
    let mock = MockProvider::new();
    let executor = RetryExecutor::new(common::fast_retry_policy());
    let cancel = CancellationToken::new();
    cancel.cancel();
    let provider = &mock;

    let err = executor
        .execute("test", &cancel, || provider.translate("Hello", "en", "ja"))
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_execute_withStatusCallback_shouldReportEachRetry() {
    let messages = std::sync::Arc::new(parking_lot::Mutex::new(Vec::<String>::new()));
    let sink = messages.clone();
    let executor = RetryExecutor::new(common::fast_retry_policy())
        .with_status_callback(std::sync::Arc::new(move |msg: &str| sink.lock().push(msg.to_string())));
    let mock = MockProvider::new().failing_first(2, ProviderError::RateLimited("slow down".to_string()));
    let provider = &mock;

    executor
        .execute("lookup", &CancellationToken::new(), || provider.translate("Hello", "en", "ja"))
        .await
        .unwrap();

    let messages = messages.lock();
    assert_eq!(messages.len(), 2);
    assert!(messages[0].contains("attempt 1/4"));
    assert!(messages[1].contains("attempt 2/4"));
}

#[test]
fn test_delay_withoutJitter_shouldBeMonotonicAndCapped() {
    let policy = RetryPolicy::default().without_jitter();
    let delays: Vec<Duration> = (1..=8).map(|attempt| policy.delay(attempt)).collect();

    for pair in delays.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
    assert_eq!(delays[0], Duration::from_millis(1000));
    assert_eq!(*delays.last().unwrap(), Duration::from_millis(policy.max_backoff_ms));
}

#[test]
fn test_delayWithJitter_shouldClampJitterToPolicy() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.delay_with_jitter(1, 10_000), Duration::from_millis(1200));
    assert_eq!(policy.delay_with_jitter(2, 50), Duration::from_millis(2050));
}

#[test]
fn test_delay_shouldNeverGoBelowMinimum() {
    let policy = RetryPolicy {
        base_delay_ms: 0,
        ..RetryPolicy::default()
    }
    .without_jitter();
    assert_eq!(policy.delay(1), Duration::from_millis(MIN_DELAY_MS));
}

#[test]
fn test_policy_withPartialJson_shouldFillDefaults() {
    let policy: RetryPolicy = serde_json::from_str(r#"{"max_attempts": 2}"#).unwrap();
    assert_eq!(policy.max_attempts, 2);
    assert_eq!(policy.base_delay_ms, 1000);
    assert_eq!(policy.jitter_ms, 200);
}
