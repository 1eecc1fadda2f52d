/*!
 * Retry execution with bounded exponential backoff.
 *
 * Provider calls are unreliable: they get throttled, time out or return
 * garbage. The executor re-runs an operation until it succeeds, fails with a
 * terminal error, runs out of attempts, or the caller cancels.
 */

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::{ProviderError, TranslationError};
use super::cancel::CancellationToken;

/// Lower bound for any computed delay
pub const MIN_DELAY_MS: u64 = 100;

/// Callback receiving human-readable status messages
pub type StatusCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Backoff configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the second attempt
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Growth factor between consecutive delays
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Cap applied before jitter
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Upper bound of the non-negative jitter added to each delay
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

fn default_max_attempts() -> u32 {
    4
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_max_backoff_ms() -> u64 {
    10_000
}

fn default_jitter_ms() -> u64 {
    200
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
            max_backoff_ms: default_max_backoff_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

impl RetryPolicy {
    /// Same policy without jitter
    pub fn without_jitter(mut self) -> Self {
        self.jitter_ms = 0;
        self
    }

    /// Exponential part of the delay after `attempt` failed (1-based), capped.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let raw = self.base_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = if raw.is_finite() {
            raw.min(self.max_backoff_ms as f64)
        } else {
            self.max_backoff_ms as f64
        };
        Duration::from_millis(capped.max(0.0) as u64)
    }

    /// Delay to wait after `attempt` failed, with jitter, never below `MIN_DELAY_MS`
    pub fn delay(&self, attempt: u32) -> Duration {
        let jitter = if self.jitter_ms > 0 {
            rand::rng().random_range(0..=self.jitter_ms)
        } else {
            0
        };
        self.delay_with_jitter(attempt, jitter)
    }

    /// Delay for an explicit jitter value
    pub fn delay_with_jitter(&self, attempt: u32, jitter_ms: u64) -> Duration {
        let total = self.base_delay(attempt).as_millis() as u64 + jitter_ms.min(self.jitter_ms);
        Duration::from_millis(total.max(MIN_DELAY_MS))
    }
}

/// Executes fallible provider operations under a `RetryPolicy`
#[derive(Clone)]
pub struct RetryExecutor {
    /// Backoff configuration
    policy: RetryPolicy,

    /// Receives a message before every backoff sleep
    status_callback: Option<StatusCallback>,
}

impl std::fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .field("status_callback", &self.status_callback.is_some())
            .finish()
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl RetryExecutor {
    /// Create an executor with the given policy
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            status_callback: None,
        }
    }

    /// Attach a status callback
    pub fn with_status_callback(mut self, callback: StatusCallback) -> Self {
        self.status_callback = Some(callback);
        self
    }

    /// The active policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` with the policy's attempt budget
    pub async fn execute<T, F, Fut>(
        &self,
        operation_name: &str,
        cancel: &CancellationToken,
        operation: F,
    ) -> Result<T, TranslationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        self.execute_with_attempts(operation_name, self.policy.max_attempts, cancel, operation).await
    }

    /// Run `operation` at most `max_attempts` times.
    ///
    /// `RateLimited`, `NetworkError` and `InvalidResponse` are retried; `Blocked`
    /// and cancellation end the loop immediately.
    pub async fn execute_with_attempts<T, F, Fut>(
        &self,
        operation_name: &str,
        max_attempts: u32,
        cancel: &CancellationToken,
        mut operation: F,
    ) -> Result<T, TranslationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let max_attempts = max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            if cancel.is_cancelled() {
                return Err(TranslationError::Cancelled);
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TranslationError::Cancelled),
                outcome = operation() => outcome,
            };

            let error = match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", operation_name, attempt);
                    }
                    return Ok(value);
                }
                Err(error) => error,
            };

            if !error.is_retryable() {
                warn!("{} failed with a terminal error: {}", operation_name, error);
                return Err(TranslationError::Provider { source: error, attempts: attempt });
            }

            if attempt >= max_attempts {
                warn!("{} failed after {} attempt(s): {}", operation_name, attempt, error);
                return Err(TranslationError::Provider { source: error, attempts: attempt });
            }

            let delay = self.policy.delay(attempt);
            let message = format!(
                "Error in {}: {}. Retrying in {:.1}s (attempt {}/{})",
                operation_name,
                error,
                delay.as_secs_f64(),
                attempt,
                max_attempts
            );
            warn!("{}", message);

            if cancel.is_cancelled() {
                return Err(TranslationError::Cancelled);
            }

            if let Some(callback) = &self.status_callback {
                callback(&message);
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(TranslationError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }
}
