/*!
 * Core translation service implementation.
 *
 * `TranslationService` ties one provider to the translation memory, the retry
 * executor and the BLEU scorer. It exposes single translations and the
 * two-stage back-translation round trip.
 */

use std::sync::Arc;
use std::time::Instant;
use chrono::Utc;
use log::{debug, info};

use crate::errors::{ProviderError, Stage, TranslationError};
use crate::language_utils;
use crate::providers::TranslationProvider;
use super::cache::TranslationMemory;
use super::cancel::CancellationToken;
use super::models::{BackTranslationResult, TranslationRequest, TranslationResult};
use super::quality::BleuScorer;
use super::retry::{RetryExecutor, StatusCallback};

/// States of one back-translation run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    TranslatingStage1,
    TranslatingStage2,
    Scoring,
    Done,
    Failed,
    Cancelled,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::TranslatingStage1 => "translating stage 1",
            Self::TranslatingStage2 => "translating stage 2",
            Self::Scoring => "scoring",
            Self::Done => "done",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Translation service
#[derive(Clone)]
pub struct TranslationService {
    /// The provider every uncached translation goes to
    provider: Arc<dyn TranslationProvider>,

    /// Translation memory consulted before each provider call
    memory: TranslationMemory,

    /// Retry wrapper around provider calls
    retry: RetryExecutor,

    /// Round-trip quality scorer
    scorer: BleuScorer,

    /// Receives pipeline progress messages
    status_callback: Option<StatusCallback>,
}

impl std::fmt::Debug for TranslationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationService")
            .field("provider", &self.provider.name())
            .field("memory", &self.memory)
            .field("retry", &self.retry)
            .finish()
    }
}

impl TranslationService {
    /// Create a new translation service
    pub fn new(provider: Arc<dyn TranslationProvider>, memory: TranslationMemory, retry: RetryExecutor) -> Self {
        Self {
            provider,
            memory,
            retry,
            scorer: BleuScorer::default(),
            status_callback: None,
        }
    }

    /// Report pipeline and retry messages to `callback`
    pub fn with_status_callback(mut self, callback: StatusCallback) -> Self {
        self.retry = self.retry.clone().with_status_callback(callback.clone());
        self.status_callback = Some(callback);
        self
    }

    /// Replace the scorer
    pub fn with_scorer(mut self, scorer: BleuScorer) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn provider(&self) -> &Arc<dyn TranslationProvider> {
        &self.provider
    }

    pub fn memory(&self) -> &TranslationMemory {
        &self.memory
    }

    pub fn scorer(&self) -> &BleuScorer {
        &self.scorer
    }

    /// Check that the provider is reachable, with a single attempt
    pub async fn test_connection(&self) -> Result<(), ProviderError> {
        self.provider.test_connection().await
    }

    /// Translate one text.
    ///
    /// The memory is consulted first; on a miss the provider is called under the
    /// retry policy and a successful answer is written back to the memory.
    pub async fn translate(
        &self,
        request: &TranslationRequest,
        cancel: &CancellationToken,
    ) -> Result<TranslationResult, TranslationError> {
        let source_language = validate_code(&request.source_language)?;
        let target_language = validate_code(&request.target_language)?;

        if request.text.trim().is_empty() {
            return Ok(TranslationResult::new(request, "", false));
        }

        if cancel.is_cancelled() {
            return Err(TranslationError::Cancelled);
        }

        if let Some(cached) = self.memory.lookup(&request.text, &source_language, &target_language).await {
            return Ok(TranslationResult::new(request, cached, true));
        }

        let provider = self.provider.as_ref();
        let text = request.text.as_str();
        let (from, to) = (source_language.as_str(), target_language.as_str());
        let operation_name = format!("{} translation {} -> {}", provider.name(), from, to);

        let translated = self
            .retry
            .execute(&operation_name, cancel, || provider.translate(text, from, to))
            .await?;

        self.memory.store(text, from, to, &translated).await;

        Ok(TranslationResult::new(request, translated, false))
    }

    /// Translate `text` into `intermediate_language` and back.
    ///
    /// Blank text short-circuits to an empty result without touching the
    /// provider or the memory. A failure in either stage aborts the run and is
    /// reported with the stage it happened in.
    pub async fn back_translate(
        &self,
        text: &str,
        source_language: &str,
        intermediate_language: &str,
        cancel: &CancellationToken,
    ) -> Result<BackTranslationResult, TranslationError> {
        if text.trim().is_empty() {
            return Ok(BackTranslationResult::empty(text, source_language, intermediate_language));
        }

        let source_language = validate_code(source_language)?;
        let intermediate_language = validate_code(intermediate_language)?;

        let started = Instant::now();
        let mut state = PipelineState::Idle;

        self.transition(&mut state, PipelineState::TranslatingStage1,
                        &format!("Translating to {}...", intermediate_language));
        let stage1 = TranslationRequest::new(text, source_language.clone(), intermediate_language.clone());
        let intermediate = match self.translate(&stage1, cancel).await {
            Ok(result) => result,
            Err(e) => return Err(self.fail(&mut state, e.in_stage(Stage::Intermediate))),
        };

        self.transition(&mut state, PipelineState::TranslatingStage2,
                        &format!("Translating back to {}...", source_language));
        let stage2 = TranslationRequest::new(
            intermediate.translated_text.clone(),
            intermediate_language,
            source_language,
        );
        let back = match self.translate(&stage2, cancel).await {
            Ok(result) => result,
            Err(e) => return Err(self.fail(&mut state, e.in_stage(Stage::Final))),
        };

        self.transition(&mut state, PipelineState::Scoring, "Scoring round trip...");
        let assessment = self.scorer.assess(text, &back.translated_text);

        let total_duration = started.elapsed();
        self.transition(&mut state, PipelineState::Done,
                        &format!("Back-translation complete ({})", assessment.bleu_percentage));

        info!("Back-translated {} chars via {} in {:.2}s, BLEU {}",
              text.chars().count(),
              intermediate.target_language,
              total_duration.as_secs_f64(),
              assessment.bleu_percentage);

        Ok(BackTranslationResult {
            original_text: text.to_string(),
            intermediate_translation: intermediate,
            final_translation: back,
            timestamp: Utc::now(),
            total_duration,
            quality_assessment: Some(assessment),
        })
    }

    fn transition(&self, state: &mut PipelineState, next: PipelineState, message: &str) {
        debug!("Pipeline {} -> {}", state, next);
        *state = next;
        if let Some(callback) = &self.status_callback {
            callback(message);
        }
    }

    fn fail(&self, state: &mut PipelineState, error: TranslationError) -> TranslationError {
        let next = if error.is_cancelled() {
            PipelineState::Cancelled
        } else {
            PipelineState::Failed
        };
        self.transition(state, next, &error.to_string());
        error
    }
}

fn validate_code(code: &str) -> Result<String, TranslationError> {
    language_utils::validate_language_code(code)
        .map_err(|e| TranslationError::InvalidInput(e.to_string()))
}
