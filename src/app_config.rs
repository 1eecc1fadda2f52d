use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::{Path, PathBuf};

use crate::database::DatabaseConnection;
use crate::language_utils;
use crate::translation::RetryPolicy;

/// Application configuration module
/// This module handles loading, validating and saving the JSON configuration.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Language of the input text (ISO 639-1)
    #[serde(default = "default_source_language")]
    pub source_language: String,

    /// Language the text is routed through (ISO 639-1)
    #[serde(default = "default_intermediate_language")]
    pub intermediate_language: String,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Retry policy for provider calls
    #[serde(default)]
    pub retry: RetryPolicy,

    /// Translation memory settings
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Batch settings
    #[serde(default)]
    pub batch: BatchConfig,
}

/// Provider configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    // @field: Service base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    // @field: Request timeout seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Optional User-Agent header
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            user_agent: None,
        }
    }
}

/// Translation memory configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MemoryConfig {
    // @field: Whether lookups and stores happen at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    // @field: SQLite file; null means the per-user data directory
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    // @field: Entry lifetime in days
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u32,

    // @field: Persisted entry cap; 0 disables it
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            database_path: None,
            ttl_days: default_ttl_days(),
            max_entries: default_max_entries(),
        }
    }
}

impl MemoryConfig {
    /// Effective database location
    pub fn resolved_database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => DatabaseConnection::default_database_path(),
        }
    }
}

/// Batch configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BatchConfig {
    // @field: Files processed concurrently
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    // @field: Test the provider before the first file
    #[serde(default)]
    pub preflight: bool,

    // @field: File extensions picked up from a directory
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            preflight: false,
            extensions: default_extensions(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_source_language() -> String {
    "en".to_string()
}

fn default_intermediate_language() -> String {
    "ja".to_string()
}

fn default_endpoint() -> String {
    crate::providers::google::DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_true() -> bool {
    true
}

fn default_ttl_days() -> u32 {
    30
}

fn default_max_entries() -> u64 {
    10_000
}

fn default_concurrency() -> usize {
    4
}

fn default_extensions() -> Vec<String> {
    vec!["txt".to_string(), "md".to_string()]
}

impl Config {
    /// Load the configuration at `path`, writing a default one if it doesn't exist
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            return Self::from_file(path);
        }

        warn!("Config file not found at '{}', creating default config.", path.display());
        let config = Config::default();
        config.save(path)?;
        Ok(config)
    }

    /// Parse a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        language_utils::validate_language_code(&self.source_language)
            .context("Invalid source_language")?;
        language_utils::validate_language_code(&self.intermediate_language)
            .context("Invalid intermediate_language")?;

        if self.provider.endpoint.trim().is_empty() {
            return Err(anyhow!("Provider endpoint must not be empty"));
        }
        url::Url::parse(&self.provider.endpoint)
            .with_context(|| format!("Invalid provider endpoint: {}", self.provider.endpoint))?;

        if self.provider.timeout_secs == 0 {
            return Err(anyhow!("Provider timeout must be at least 1 second"));
        }

        if self.retry.max_attempts == 0 {
            return Err(anyhow!("retry.max_attempts must be at least 1"));
        }
        if !self.retry.backoff_multiplier.is_finite() || self.retry.backoff_multiplier < 1.0 {
            return Err(anyhow!("retry.backoff_multiplier must be a finite number >= 1.0"));
        }

        if self.batch.concurrency == 0 {
            return Err(anyhow!("batch.concurrency must be at least 1"));
        }

        if self.memory.ttl_days == 0 {
            return Err(anyhow!("memory.ttl_days must be at least 1"));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source_language: default_source_language(),
            intermediate_language: default_intermediate_language(),
            log_level: LogLevel::default(),
            provider: ProviderConfig::default(),
            retry: RetryPolicy::default(),
            memory: MemoryConfig::default(),
            batch: BatchConfig::default(),
        }
    }
}
