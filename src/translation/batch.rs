/*!
 * Batch back-translation processing.
 *
 * Runs the back-translation pipeline over many documents with a bounded
 * number of files in flight. A failing file is recorded and the batch moves
 * on; cancellation stops the intake of new files.
 */

use std::sync::Arc;
use std::time::Instant;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use log::{error, info, warn};
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;

use super::cancel::CancellationToken;
use super::core::TranslationService;
use super::models::{BatchOperation, BatchProgress, BatchStatus, BatchTranslationResult, TranslatableFile};

/// Default number of files processed concurrently
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Batch processor for back-translating many files
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    /// The translation service to use
    service: Arc<TranslationService>,

    /// Maximum number of files in flight
    concurrency: usize,

    /// Whether to test the provider connection before starting
    preflight: bool,
}

impl BatchProcessor {
    /// Create a new batch processor
    pub fn new(service: Arc<TranslationService>) -> Self {
        Self {
            service,
            concurrency: DEFAULT_CONCURRENCY,
            preflight: false,
        }
    }

    /// Set the number of files processed concurrently (at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Enable or disable the connection check before the first file
    pub fn with_preflight(mut self, preflight: bool) -> Self {
        self.preflight = preflight;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Back-translate every file.
    ///
    /// A progress snapshot is sent on `progress_tx` after each file finishes.
    /// The returned operation holds one result per started file, in input order.
    pub async fn process_batch(
        &self,
        files: Vec<TranslatableFile>,
        source_language: &str,
        intermediate_language: &str,
        cancel: &CancellationToken,
        progress_tx: Option<UnboundedSender<BatchProgress>>,
    ) -> BatchOperation {
        let mut operation = BatchOperation::new(files);
        let total_files = operation.files.len();
        operation.started_at = Some(Utc::now());
        operation.status = BatchStatus::Running;

        info!("Starting batch {} with {} file(s), concurrency {}",
              operation.id, total_files, self.concurrency);

        if self.preflight {
            if let Err(e) = self.service.test_connection().await {
                error!("Provider {} is unreachable, batch aborted: {}", self.service.provider().name(), e);
                operation.status = BatchStatus::Failed;
                operation.finished_at = Some(Utc::now());
                return operation;
            }
        }

        let progress = Mutex::new(BatchProgress::new(total_files));
        let progress_ref = &progress;
        let progress_tx = progress_tx.as_ref();

        let mut results: Vec<(usize, BatchTranslationResult)> = stream::iter(operation.files.iter().enumerate())
            .map(move |(index, file)| async move {
                if cancel.is_cancelled() {
                    return None;
                }

                let result = self.process_file(file, source_language, intermediate_language, cancel).await;

                {
                    let mut progress = progress_ref.lock();
                    progress.processed_files += 1;
                    if result.success {
                        progress.successful_files += 1;
                    } else {
                        progress.failed_files += 1;
                    }
                    progress.current_file = Some(file.name.clone());

                    // Sent under the lock so snapshots arrive in order
                    if let Some(tx) = progress_tx {
                        let _ = tx.send(progress.clone());
                    }
                }

                Some((index, result))
            })
            .buffer_unordered(self.concurrency)
            .filter_map(|result| async move { result })
            .collect()
            .await;

        results.sort_by_key(|(index, _)| *index);
        operation.results = results.into_iter().map(|(_, result)| result).collect();
        operation.progress = progress.into_inner();
        operation.finished_at = Some(Utc::now());

        operation.status = if cancel.is_cancelled() && operation.progress.processed_files < total_files {
            BatchStatus::Cancelled
        } else {
            BatchStatus::Completed
        };

        info!("Batch {} {}: {}/{} processed, {} succeeded, {} failed",
              operation.id,
              operation.status,
              operation.progress.processed_files,
              total_files,
              operation.progress.successful_files,
              operation.progress.failed_files);

        operation
    }

    async fn process_file(
        &self,
        file: &TranslatableFile,
        source_language: &str,
        intermediate_language: &str,
        cancel: &CancellationToken,
    ) -> BatchTranslationResult {
        let started = Instant::now();
        let outcome = self
            .service
            .back_translate(&file.content, source_language, intermediate_language, cancel)
            .await;
        let processing_time = started.elapsed();

        match outcome {
            Ok(translation) => BatchTranslationResult {
                file_id: file.id.clone(),
                file_name: file.name.clone(),
                success: true,
                translation_result: Some(translation),
                error: None,
                error_kind: None,
                processing_time,
            },
            Err(e) => {
                warn!("File '{}' failed: {}", file.name, e);
                BatchTranslationResult {
                    file_id: file.id.clone(),
                    file_name: file.name.clone(),
                    success: false,
                    translation_result: None,
                    error: Some(e.to_string()),
                    error_kind: Some(e.kind()),
                    processing_time,
                }
            }
        }
    }
}
