/*!
 * # backtrans - Back-translation with quality scoring
 *
 * A Rust library that translates text into an intermediate language and back,
 * then estimates how much meaning survived the round trip.
 *
 * ## Features
 *
 * - Retrying provider client with bounded exponential backoff and jitter
 * - Content-addressed translation memory with TTL, persisted in SQLite
 * - BLEU scoring with confidence bands and a quality report
 * - Batch processing of many documents with progress and cancellation
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `app_config`: Configuration management
 * - `translation`: The back-translation pipeline:
 *   - `translation::core`: Two-stage orchestrator
 *   - `translation::batch`: Batch processing of documents
 *   - `translation::cache`: Translation memory
 *   - `translation::retry`: Retry executor
 *   - `translation::quality`: BLEU scorer
 * - `database`: SQLite persistence for the translation memory
 * - `file_utils`: File system operations
 * - `app_controller`: Main application controller
 * - `language_utils`: ISO language code utilities
 * - `providers`: Translation provider clients:
 *   - `providers::google`: Public Google Translate endpoint
 *   - `providers::mock`: Scripted provider for tests
 * - `errors`: Custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]
// Test names follow test_subject_condition_shouldOutcome
#![cfg_attr(test, allow(non_snake_case))]

// Public modules
pub mod app_config;
pub mod file_utils;
pub mod database;
pub mod translation;
pub mod app_controller;
pub mod language_utils;
pub mod providers;
pub mod errors;

// Re-export main types for easier usage
pub use app_config::Config;
pub use translation::{BatchProcessor, CancellationToken, TranslationMemory, TranslationService};
pub use language_utils::{get_language_name, language_codes_match, normalize_to_part1};
pub use errors::{AppError, CacheError, ErrorKind, ProviderError, Stage, TranslationError};
