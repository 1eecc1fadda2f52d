use anyhow::{Context, Result};
use chrono::Duration as ChronoDuration;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::app_config::Config;
use crate::database::SqliteCacheStore;
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::language_utils;
use crate::providers::{GoogleTranslateClient, TranslationProvider};
use crate::translation::{
    BackTranslationResult, BatchOperation, BatchProcessor, BatchProgress, BatchStatus, CancellationToken,
    LookupMetrics, MemoryStats, RetryExecutor, TranslationMemory, TranslationRequest, TranslationResult, TranslationService,
};

// @module: Application controller behind the CLI

/// Snapshot of the translation memory for `memory stats`
#[derive(Debug, Clone, Serialize)]
pub struct MemorySummary {
    pub enabled: bool,
    pub database_path: Option<PathBuf>,
    /// Entries in the persistent store, or in process memory without one
    pub stored_entries: u64,
    pub session: MemoryStats,
    /// Counters kept in the database across runs
    pub lifetime: Option<LookupMetrics>,
}

/// Main application controller
pub struct Controller {
    // @field: App configuration
    config: Config,

    // @field: Shared pipeline
    service: Arc<TranslationService>,

    // @field: SQLite file backing the memory, when persistent
    memory_path: Option<PathBuf>,
}

impl Controller {
    /// Create a controller talking to the configured provider endpoint
    pub fn with_config(config: Config) -> Result<Self> {
        let provider = GoogleTranslateClient::new_with_config(
            config.provider.endpoint.clone(),
            config.provider.timeout_secs,
            config.provider.user_agent.clone(),
        );

        let (memory, memory_path) = Self::open_memory(&config);
        Ok(Self::with_provider(config, Arc::new(provider), memory, memory_path))
    }

    /// Create a controller with an explicit provider and memory
    pub fn with_provider(
        config: Config,
        provider: Arc<dyn TranslationProvider>,
        memory: TranslationMemory,
        memory_path: Option<PathBuf>,
    ) -> Self {
        let retry = RetryExecutor::new(config.retry.clone());
        let service = TranslationService::new(provider, memory, retry)
            .with_status_callback(Arc::new(|message: &str| info!("{}", message)));

        Self {
            config,
            service: Arc::new(service),
            memory_path,
        }
    }

    /// Build the translation memory described by the config.
    ///
    /// A store that cannot be opened degrades to an in-process memory.
    fn open_memory(config: &Config) -> (TranslationMemory, Option<PathBuf>) {
        let ttl = ChronoDuration::days(i64::from(config.memory.ttl_days));
        let max_in_memory = usize::try_from(config.memory.max_entries).unwrap_or(usize::MAX);

        if !config.memory.enabled {
            return (TranslationMemory::new(false).with_ttl(ttl), None);
        }

        let opened = config
            .memory
            .resolved_database_path()
            .and_then(|path| {
                let store = SqliteCacheStore::open(&path)?
                    .with_max_entries(config.memory.max_entries);
                Ok((store, path))
            });

        match opened {
            Ok((store, path)) => {
                let memory = TranslationMemory::with_store(Arc::new(store))
                    .with_ttl(ttl)
                    .with_max_in_memory(max_in_memory);
                (memory, Some(path))
            }
            Err(e) => {
                warn!("Translation memory is not persistent: {:#}", e);
                (TranslationMemory::new(true).with_ttl(ttl).with_max_in_memory(max_in_memory), None)
            }
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn service(&self) -> &Arc<TranslationService> {
        &self.service
    }

    /// Translate one text
    pub async fn translate(
        &self,
        text: &str,
        source_language: Option<&str>,
        target_language: &str,
        cancel: &CancellationToken,
    ) -> Result<TranslationResult> {
        let source = self.resolve_language(source_language, &self.config.source_language)?;
        let target = language_utils::normalize_to_part1(target_language)
            .with_context(|| format!("Invalid target language: {}", target_language))?;

        let request = TranslationRequest::new(text, source, target);
        let result = self.service.translate(&request, cancel).await.map_err(AppError::from)?;
        Ok(result)
    }

    /// Back-translate one text
    pub async fn back_translate(
        &self,
        text: &str,
        source_language: Option<&str>,
        intermediate_language: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<BackTranslationResult> {
        let source = self.resolve_language(source_language, &self.config.source_language)?;
        let intermediate = self.resolve_language(intermediate_language, &self.config.intermediate_language)?;

        let result = self
            .service
            .back_translate(text, &source, &intermediate, cancel)
            .await
            .map_err(AppError::from)?;
        Ok(result)
    }

    /// Back-translate every matching file under `input_dir`
    pub async fn run_batch(
        &self,
        input_dir: &Path,
        source_language: Option<&str>,
        intermediate_language: Option<&str>,
        concurrency: Option<usize>,
        cancel: &CancellationToken,
        show_progress: bool,
    ) -> Result<BatchOperation> {
        let source = self.resolve_language(source_language, &self.config.source_language)?;
        let intermediate = self.resolve_language(intermediate_language, &self.config.intermediate_language)?;

        let paths = FileManager::find_text_files(input_dir, &self.config.batch.extensions)?;
        if paths.is_empty() {
            warn!("No files with extensions [{}] found in {:?}",
                  self.config.batch.extensions.join(", "), input_dir);
        }
        let files = FileManager::load_translatable_files(input_dir, &paths)?;

        let processor = BatchProcessor::new(self.service.clone())
            .with_concurrency(concurrency.unwrap_or(self.config.batch.concurrency))
            .with_preflight(self.config.batch.preflight);

        let progress_bar = if show_progress {
            let bar = ProgressBar::new(files.len() as u64);
            let style = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg} {eta}")
                .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
                .unwrap_or_else(|_| ProgressStyle::default_bar());
            bar.set_style(style.progress_chars("█▓▒░"));
            bar.set_message("Back-translating");
            bar
        } else {
            ProgressBar::hidden()
        };

        let (tx, mut rx) = mpsc::unbounded_channel::<BatchProgress>();
        let bar = progress_bar.clone();
        let reporter = tokio::spawn(async move {
            while let Some(progress) = rx.recv().await {
                bar.set_position(progress.processed_files as u64);
                if let Some(name) = progress.current_file {
                    bar.set_message(format!("{} ok, {} failed, last: {}",
                                            progress.successful_files, progress.failed_files, name));
                }
            }
        });

        let operation = processor
            .process_batch(files, &source, &intermediate, cancel, Some(tx))
            .await;

        if let Err(e) = reporter.await {
            warn!("Progress reporter stopped unexpectedly: {}", e);
        }

        match operation.status {
            BatchStatus::Cancelled => progress_bar.abandon_with_message("Batch cancelled"),
            BatchStatus::Failed => progress_bar.abandon_with_message("Batch failed"),
            _ => progress_bar.finish_with_message("Batch complete"),
        }

        Ok(operation)
    }

    /// Describe the translation memory
    pub async fn memory_summary(&self) -> Result<MemorySummary> {
        let memory = self.service.memory();
        Ok(MemorySummary {
            enabled: memory.is_enabled(),
            database_path: self.memory_path.clone(),
            stored_entries: memory.persisted_len().await.map_err(AppError::from)?,
            session: memory.stats(),
            lifetime: memory.lifetime_stats().await.map_err(AppError::from)?,
        })
    }

    /// Remove every entry from the translation memory
    pub async fn clear_memory(&self) -> Result<u64> {
        let removed = self.service.memory().clear().await.map_err(AppError::from)?;
        info!("Removed {} translation memory entries", removed);
        Ok(removed)
    }

    /// Remove expired entries from the translation memory
    pub async fn purge_memory(&self) -> u64 {
        let removed = self.service.memory().purge_expired().await;
        info!("Purged {} expired translation memory entries", removed);
        removed
    }

    fn resolve_language(&self, given: Option<&str>, fallback: &str) -> Result<String> {
        let code = given.unwrap_or(fallback);
        language_utils::normalize_to_part1(code)
            .with_context(|| format!("Invalid language: {}", code))
    }
}

/// Human readable rendering of a round trip
pub fn format_back_translation(result: &BackTranslationResult) -> String {
    let mut lines = vec![
        format!("Original ({}):        {}", result.intermediate_translation.source_language, result.original_text),
        format!("Intermediate ({}):    {}", result.intermediate_translation.target_language,
                result.intermediate_translation.translated_text),
        format!("Back-translated ({}): {}", result.final_translation.target_language,
                result.final_translation.translated_text),
    ];

    if let Some(quality) = &result.quality_assessment {
        lines.push(format!("Quality: {} {} ({}) - {}",
                           quality.quality_rating, quality.bleu_percentage,
                           quality.confidence_level, quality.description));
    }

    let cached = result.cached_stages();
    lines.push(format!("Completed in {:.2}s{}",
                       result.total_duration.as_secs_f64(),
                       if cached > 0 { format!(", {} stage(s) from translation memory", cached) } else { String::new() }));

    lines.join("\n")
}

/// One line per file plus a totals line
pub fn format_batch_summary(operation: &BatchOperation) -> String {
    let mut lines = Vec::with_capacity(operation.results.len() + 1);

    for result in &operation.results {
        let detail = match (&result.translation_result, &result.error) {
            (Some(translation), _) => translation
                .quality_assessment
                .as_ref()
                .map(|q| format!("BLEU {}", q.bleu_percentage))
                .unwrap_or_else(|| "empty".to_string()),
            (None, Some(error)) => error.clone(),
            (None, None) => String::new(),
        };
        let mark = if result.success { "ok" } else { "FAILED" };
        lines.push(format!("[{}] {} ({:.2}s) {}", mark, result.file_name,
                           result.processing_time.as_secs_f64(), detail));
    }

    lines.push(format!(
        "Batch {}: {}/{} processed, {} succeeded, {} failed",
        operation.status,
        operation.progress.processed_files,
        operation.progress.total_files,
        operation.progress.successful_files,
        operation.progress.failed_files
    ));

    lines.join("\n")
}
