/*!
 * Back-translation pipeline.
 *
 * - `core`: The orchestrator running the two-stage round trip
 * - `batch`: Fan-out of the pipeline across many files
 * - `cache`: Translation memory
 * - `retry`: Backoff and retry of provider calls
 * - `cancel`: Cooperative cancellation token
 * - `quality`: BLEU scoring and quality assessment
 * - `models`: Requests, results and batch bookkeeping
 */

pub use self::batch::BatchProcessor;
pub use self::cache::{CacheEntry, CacheStore, LookupMetrics, MemoryStats, TranslationMemory};
pub use self::cancel::CancellationToken;
pub use self::core::{PipelineState, TranslationService};
pub use self::models::{
    BackTranslationResult, BatchOperation, BatchProgress, BatchStatus, BatchTranslationResult,
    TranslatableFile, TranslationRequest, TranslationResult,
};
pub use self::quality::{BleuScorer, ConfidenceLevel, QualityAssessment};
pub use self::retry::{RetryExecutor, RetryPolicy, StatusCallback};

pub mod batch;
pub mod cache;
pub mod cancel;
pub mod core;
pub mod models;
pub mod quality;
pub mod retry;
