/*!
 * Mock provider implementation for testing.
 *
 * The mock answers from a small dictionary and can be scripted to fail:
 * - `MockProvider::new()` - Echoes `[TRANSLATED to xx] text` for unknown inputs
 * - `.with_translation(from, to)` - Fixed dictionary reply
 * - `.failing(err)` - Always fails with the given error
 * - `.failing_first(n, err)` - Fails the first `n` calls, then recovers
 * - `.failing_when_contains(pattern, err)` - Fails for matching texts only
 * - `.with_delay(ms)` - Simulates a slow provider
 */

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use parking_lot::Mutex;

use crate::errors::ProviderError;
use crate::providers::TranslationProvider;

/// A recorded call made to the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    /// The text to translate
    pub text: String,
    /// Source language
    pub source_language: String,
    /// Target language
    pub target_language: String,
}

/// Failure script for the mock provider
#[derive(Debug, Clone)]
enum FailureMode {
    /// Never fails
    None,
    /// Always fails
    Always(ProviderError),
    /// Fails the first N calls
    FirstCalls { remaining: Arc<AtomicUsize>, error: ProviderError },
    /// Fails when the text contains the pattern
    WhenContains { pattern: String, error: ProviderError },
}

/// Mock provider for testing translation behavior
#[derive(Debug, Clone)]
pub struct MockProvider {
    /// Dictionary of known translations, keyed by (text, target language)
    dictionary: Arc<HashMap<(String, String), String>>,
    /// Failure script
    failure: FailureMode,
    /// Simulated latency per call
    delay: Option<Duration>,
    /// Whether `test_connection` should fail
    unreachable: bool,
    /// Request counter shared between clones
    request_count: Arc<AtomicUsize>,
    /// Every call received, in order
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockProvider {
    /// Create a working mock provider
    pub fn new() -> Self {
        Self {
            dictionary: Arc::new(HashMap::new()),
            failure: FailureMode::None,
            delay: None,
            unreachable: false,
            request_count: Arc::new(AtomicUsize::new(0)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a dictionary translation used for any target language
    pub fn with_translation(self, from: &str, to: &str) -> Self {
        self.with_translation_to(from, "*", to)
    }

    /// Register a dictionary translation for a specific target language
    pub fn with_translation_to(mut self, from: &str, target_language: &str, to: &str) -> Self {
        Arc::make_mut(&mut self.dictionary)
            .insert((from.to_string(), target_language.to_string()), to.to_string());
        self
    }

    /// Always fail with the given error
    pub fn failing(mut self, error: ProviderError) -> Self {
        self.failure = FailureMode::Always(error);
        self
    }

    /// Fail the first `times` calls with the given error
    pub fn failing_first(mut self, times: usize, error: ProviderError) -> Self {
        self.failure = FailureMode::FirstCalls {
            remaining: Arc::new(AtomicUsize::new(times)),
            error,
        };
        self
    }

    /// Fail every call whose text contains `pattern`
    pub fn failing_when_contains(mut self, pattern: &str, error: ProviderError) -> Self {
        self.failure = FailureMode::WhenContains {
            pattern: pattern.to_string(),
            error,
        };
        self
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay = Some(Duration::from_millis(delay_ms));
        self
    }

    /// Make `test_connection` fail with a network error
    pub fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Number of `translate` calls that reached the provider
    pub fn call_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Snapshot of the calls received so far
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    fn scripted_failure(&self, text: &str) -> Option<ProviderError> {
        match &self.failure {
            FailureMode::None => None,
            FailureMode::Always(error) => Some(error.clone()),
            FailureMode::FirstCalls { remaining, error } => remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .ok()
                .map(|_| error.clone()),
            FailureMode::WhenContains { pattern, error } => {
                text.contains(pattern.as_str()).then(|| error.clone())
            }
        }
    }

    fn reply(&self, text: &str, target_language: &str) -> String {
        self.dictionary
            .get(&(text.to_string(), target_language.to_string()))
            .or_else(|| self.dictionary.get(&(text.to_string(), "*".to_string())))
            .cloned()
            .unwrap_or_else(|| format!("[TRANSLATED to {}] {}", target_language, text))
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TranslationProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }

        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().push(MockCall {
            text: text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.scripted_failure(text) {
            return Err(error);
        }

        Ok(self.reply(text, target_language))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        if self.unreachable {
            return Err(ProviderError::NetworkError("mock provider is unreachable".to_string()));
        }
        Ok(())
    }
}
