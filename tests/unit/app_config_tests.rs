/*!
 * Tests for application configuration functionality
 */

use std::path::PathBuf;

use backtrans::app_config::{Config, LogLevel};

use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.intermediate_language, "ja");
    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(config.provider.timeout_secs, 20);
    assert_eq!(config.retry.max_attempts, 4);
    assert_eq!(config.retry.base_delay_ms, 1000);
    assert_eq!(config.retry.max_backoff_ms, 10_000);
    assert!(config.memory.enabled);
    assert_eq!(config.memory.ttl_days, 30);
    assert_eq!(config.batch.concurrency, 4);
    assert_eq!(config.batch.extensions, vec!["txt".to_string(), "md".to_string()]);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_fromPartialJson_shouldFillDefaults() {
    let json = r#"{
        "intermediate_language": "de",
        "retry": { "max_attempts": 2 },
        "memory": { "enabled": false }
    }"#;

    let config: Config = serde_json::from_str(json).unwrap();

    assert_eq!(config.source_language, "en");
    assert_eq!(config.intermediate_language, "de");
    assert_eq!(config.retry.max_attempts, 2);
    assert_eq!(config.retry.backoff_multiplier, 2.0);
    assert!(!config.memory.enabled);
    assert_eq!(config.memory.max_entries, 10_000);
    assert_eq!(config.batch.concurrency, 4);
}

/// Test configuration validation
#[test]
fn test_config_validation_withVariousConfigs_shouldValidateCorrectly() {
    let valid = Config::default();

    let mut config = valid.clone();
    config.source_language = "xyz".to_string();
    assert!(config.validate().is_err());

    let mut config = valid.clone();
    config.intermediate_language = "jpn".to_string();
    assert!(config.validate().is_err(), "3-letter codes are not accepted in config");

    let mut config = valid.clone();
    config.provider.endpoint = "not a url".to_string();
    assert!(config.validate().is_err());

    let mut config = valid.clone();
    config.provider.timeout_secs = 0;
    assert!(config.validate().is_err());

    let mut config = valid.clone();
    config.retry.max_attempts = 0;
    assert!(config.validate().is_err());

    let mut config = valid.clone();
    config.retry.backoff_multiplier = 0.5;
    assert!(config.validate().is_err());

    let mut config = valid.clone();
    config.batch.concurrency = 0;
    assert!(config.validate().is_err());

    let mut config = valid;
    config.memory.ttl_days = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_loadOrCreate_withMissingFile_shouldWriteDefault() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("conf.json");

    let config = Config::load_or_create(&path).unwrap();

    assert!(path.exists());
    assert_eq!(config, Config::default());
    assert_eq!(Config::from_file(&path).unwrap(), config);
}

#[test]
fn test_saveThenLoad_shouldPreserveValues() {
    let dir = common::create_temp_dir().unwrap();
    let path = dir.path().join("custom.json");

    let mut config = Config::default();
    config.intermediate_language = "fr".to_string();
    config.memory.database_path = Some(PathBuf::from("/tmp/tm.db"));
    config.log_level = LogLevel::Debug;
    config.save(&path).unwrap();

    let loaded = Config::load_or_create(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.memory.resolved_database_path().unwrap(), PathBuf::from("/tmp/tm.db"));
}

#[test]
fn test_fromFile_withInvalidJson_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let path = common::create_test_file(dir.path(), "broken.json", "{ not json").unwrap();
    assert!(Config::from_file(&path).is_err());
}

#[test]
fn test_logLevel_shouldConvertToLevelFilter() {
    assert_eq!(log::LevelFilter::from(LogLevel::Warn), log::LevelFilter::Warn);
    assert_eq!(log::LevelFilter::from(LogLevel::Trace), log::LevelFilter::Trace);
}
