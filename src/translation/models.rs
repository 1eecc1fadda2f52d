/*!
 * Data model of the back-translation pipeline.
 *
 * Requests and results are transient values. Every type serializes to JSON so
 * the CLI can print machine-readable output.
 */

use std::path::PathBuf;
use std::time::Duration;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::errors::ErrorKind;
use super::quality::QualityAssessment;

/// Serialize a `Duration` as whole milliseconds
fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

/// A single translation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslationRequest {
    pub text: String,
    pub source_language: String,
    pub target_language: String,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, source_language: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
        }
    }
}

/// Outcome of one translation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationResult {
    pub original_text: String,
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
    pub timestamp: DateTime<Utc>,
    /// Unicode scalar values in `translated_text`, unless overridden
    pub character_count: usize,
    /// Whether the translation came from the translation memory
    pub from_cache: bool,
}

impl TranslationResult {
    pub fn new(request: &TranslationRequest, translated_text: impl Into<String>, from_cache: bool) -> Self {
        let translated_text = translated_text.into();
        Self {
            original_text: request.text.clone(),
            character_count: translated_text.chars().count(),
            translated_text,
            source_language: request.source_language.clone(),
            target_language: request.target_language.clone(),
            timestamp: Utc::now(),
            from_cache,
        }
    }

    /// Replace the derived character count
    pub fn with_character_count(mut self, count: usize) -> Self {
        self.character_count = count;
        self
    }
}

/// Outcome of a full round trip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackTranslationResult {
    pub original_text: String,
    /// Source to intermediate
    pub intermediate_translation: TranslationResult,
    /// Intermediate back to source
    pub final_translation: TranslationResult,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "total_duration_ms", serialize_with = "serialize_millis")]
    pub total_duration: Duration,
    /// Absent only for blank input
    pub quality_assessment: Option<QualityAssessment>,
}

impl BackTranslationResult {
    /// Zero-duration result for blank input
    pub fn empty(text: &str, source_language: &str, intermediate_language: &str) -> Self {
        let stage1 = TranslationRequest::new(text, source_language, intermediate_language);
        let stage2 = TranslationRequest::new("", intermediate_language, source_language);
        Self {
            original_text: text.to_string(),
            intermediate_translation: TranslationResult::new(&stage1, "", false),
            final_translation: TranslationResult::new(&stage2, "", false),
            timestamp: Utc::now(),
            total_duration: Duration::ZERO,
            quality_assessment: None,
        }
    }

    /// Number of stages answered by the translation memory
    pub fn cached_stages(&self) -> usize {
        [&self.intermediate_translation, &self.final_translation]
            .iter()
            .filter(|result| result.from_cache)
            .count()
    }
}

/// One input document of a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranslatableFile {
    /// Random UUID v4
    pub id: String,
    pub name: String,
    pub path: Option<PathBuf>,
    #[serde(skip_serializing)]
    pub content: String,
}

impl TranslatableFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            path: None,
            content: content.into(),
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// Lifecycle of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Aggregate batch counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchProgress {
    pub total_files: usize,
    pub processed_files: usize,
    pub successful_files: usize,
    pub failed_files: usize,
    /// Name of the most recently finished file
    pub current_file: Option<String>,
}

impl BatchProgress {
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            ..Self::default()
        }
    }

    /// Fraction of processed files in [0, 1]
    pub fn fraction(&self) -> f64 {
        if self.total_files == 0 {
            1.0
        } else {
            self.processed_files as f64 / self.total_files as f64
        }
    }

    pub fn is_complete(&self) -> bool {
        self.processed_files >= self.total_files
    }
}

/// Per-file outcome within a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchTranslationResult {
    pub file_id: String,
    pub file_name: String,
    pub success: bool,
    pub translation_result: Option<BackTranslationResult>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    #[serde(rename = "processing_time_ms", serialize_with = "serialize_millis")]
    pub processing_time: Duration,
}

/// A batch run and everything it produced
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchOperation {
    pub id: String,
    pub files: Vec<TranslatableFile>,
    pub status: BatchStatus,
    pub progress: BatchProgress,
    /// Ordered by input position; files never started have no entry
    pub results: Vec<BatchTranslationResult>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl BatchOperation {
    pub fn new(files: Vec<TranslatableFile>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            progress: BatchProgress::new(files.len()),
            files,
            status: BatchStatus::Pending,
            results: Vec::new(),
            started_at: None,
            finished_at: None,
        }
    }

    /// Results of files that failed
    pub fn failures(&self) -> impl Iterator<Item = &BatchTranslationResult> {
        self.results.iter().filter(|result| !result.success)
    }
}
