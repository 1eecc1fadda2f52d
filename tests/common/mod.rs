/*!
 * Common test utilities for the backtrans test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::Result;
use tempfile::TempDir;

use backtrans::providers::MockProvider;
use backtrans::translation::{RetryExecutor, RetryPolicy, TranslationMemory, TranslationService};

/// Route library logs to the test output; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Retry policy with the smallest possible delays
pub fn fast_retry_policy() -> RetryPolicy {
    RetryPolicy {
        base_delay_ms: 1,
        max_backoff_ms: 1,
        jitter_ms: 0,
        ..RetryPolicy::default()
    }
}

/// Service over `provider` with an in-process memory and fast retries
pub fn service_with(provider: MockProvider) -> TranslationService {
    service_with_memory(provider, TranslationMemory::new(true))
}

/// Service over `provider` and `memory` with fast retries
pub fn service_with_memory(provider: MockProvider, memory: TranslationMemory) -> TranslationService {
    TranslationService::new(Arc::new(provider), memory, RetryExecutor::new(fast_retry_policy()))
}

/// Mock that knows the Hello / こんにちは round trip
pub fn hello_provider() -> MockProvider {
    MockProvider::new()
        .with_translation_to("Hello", "ja", "こんにちは")
        .with_translation_to("こんにちは", "en", "Hello")
}
