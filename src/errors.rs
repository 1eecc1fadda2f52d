/*!
 * Error types for the backtrans application.
 *
 * This module contains custom error types for the different layers of the
 * translation pipeline, using the thiserror crate for ergonomic error definitions.
 */

use serde::Serialize;
use thiserror::Error;

/// Failures a translation provider can report.
///
/// Adapters must map every transport or payload problem onto one of these
/// four kinds; the retry executor decides what to do based on the kind alone.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider signalled throttling
    #[error("Provider rate limited the request: {0}")]
    RateLimited(String),

    /// The provider answered with a challenge page or an authorization rejection
    #[error("Provider blocked the request: {0}")]
    Blocked(String),

    /// Transport failure, timeout or server side error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Malformed or empty payload
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Blocked(_))
    }

    /// Kind of this failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::RateLimited(_) => ErrorKind::RateLimited,
            Self::Blocked(_) => ErrorKind::Blocked,
            Self::NetworkError(_) => ErrorKind::NetworkError,
            Self::InvalidResponse(_) => ErrorKind::InvalidResponse,
        }
    }
}

/// Errors raised by a translation memory backing store.
///
/// These never fail the pipeline: the memory logs them and falls back to the provider.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The store could not be read or written
    #[error("Cache storage error: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for CacheError {
    fn from(error: anyhow::Error) -> Self {
        Self::Storage(format!("{:#}", error))
    }
}

impl From<rusqlite::Error> for CacheError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Storage(error.to_string())
    }
}

/// Flat classification of every failure surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    RateLimited,
    Blocked,
    NetworkError,
    InvalidResponse,
    Cache,
    Cancelled,
    InvalidInput,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::RateLimited => "rate limited",
            Self::Blocked => "blocked",
            Self::NetworkError => "network error",
            Self::InvalidResponse => "invalid response",
            Self::Cache => "cache error",
            Self::Cancelled => "cancelled",
            Self::InvalidInput => "invalid input",
        };
        f.write_str(name)
    }
}

/// Stage of a back-translation round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Source language to intermediate language
    Intermediate,
    /// Intermediate language back to the source language
    Final,
}

impl Stage {
    /// 1-based stage number
    pub fn number(&self) -> u8 {
        match self {
            Self::Intermediate => 1,
            Self::Final => 2,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Intermediate => write!(f, "stage 1 (source -> intermediate)"),
            Self::Final => write!(f, "stage 2 (intermediate -> source)"),
        }
    }
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// The caller's cancellation token fired
    #[error("Translation cancelled")]
    Cancelled,

    /// Rejected before any provider call, e.g. a malformed language code
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The provider failed and the retry budget could not recover it
    #[error("{source} (after {attempts} attempt(s))")]
    Provider {
        /// Last failure reported by the provider
        source: ProviderError,
        /// Number of provider calls made
        attempts: u32,
    },

    /// A back-translation stage failed
    #[error("Back-translation failed at {stage}: {source}")]
    Stage {
        /// The stage that failed
        stage: Stage,
        /// What went wrong in that stage
        source: Box<TranslationError>,
    },
}

impl TranslationError {
    /// Attribute this error to a round-trip stage.
    ///
    /// Cancellation is left unwrapped so callers can match on it directly.
    pub fn in_stage(self, stage: Stage) -> Self {
        match self {
            Self::Cancelled => Self::Cancelled,
            other => Self::Stage {
                stage,
                source: Box::new(other),
            },
        }
    }

    /// Kind of the innermost failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Cancelled => ErrorKind::Cancelled,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Provider { source, .. } => source.kind(),
            Self::Stage { source, .. } => source.kind(),
        }
    }

    /// Stage the failure is attributed to, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Number of provider attempts consumed, if the provider was reached
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::Provider { attempts, .. } => Some(*attempts),
            Self::Stage { source, .. } => source.attempts(),
            _ => None,
        }
    }

    /// Whether this is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the translation pipeline
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Error from the translation memory
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
