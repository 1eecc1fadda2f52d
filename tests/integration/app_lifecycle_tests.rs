/*!
 * End-to-end tests through the application controller
 */

use std::sync::Arc;

use backtrans::app_config::Config;
use backtrans::app_controller::{self, Controller};
use backtrans::database::SqliteCacheStore;
use backtrans::errors::ProviderError;
use backtrans::providers::MockProvider;
use backtrans::translation::{BatchStatus, CancellationToken, TranslationMemory};

use crate::common;

fn controller(mock: MockProvider) -> Controller {
    let mut config = Config::default();
    config.retry = common::fast_retry_policy();
    Controller::with_provider(config, Arc::new(mock), TranslationMemory::new(true), None)
}

#[tokio::test]
async fn test_backTranslate_withThreeLetterCodes_shouldNormalize() {
    let mock = common::hello_provider();
    let controller = controller(mock.clone());

    let result = controller
        .back_translate("Hello", Some("eng"), Some("jpn"), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.intermediate_translation.target_language, "ja");
    assert_eq!(result.final_translation.translated_text, "Hello");

    let rendered = app_controller::format_back_translation(&result);
    assert!(rendered.contains("Intermediate (ja):    こんにちは"));
    assert!(rendered.contains("100.00%"));
}

#[test]
fn test_backTranslate_withoutLanguages_shouldUseConfiguredDefaults() {
    common::init_test_logging();
    let mock = common::hello_provider();
    let controller = controller(mock.clone());

    let result = tokio_test::block_on(async {
        controller.back_translate("Hello", None, None, &CancellationToken::new()).await
    });
    assert!(result.is_ok());

    let calls = mock.calls();
    assert_eq!(calls[0].source_language, "en");
    assert_eq!(calls[0].target_language, "ja");
}

#[tokio::test]
async fn test_translate_withInvalidTarget_shouldFailBeforeProvider() {
    let mock = MockProvider::new();
    let controller = controller(mock.clone());

    let result = controller
        .translate("Hello", None, "klingon", &CancellationToken::new())
        .await;

    assert!(result.is_err());
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_runBatch_withDirectory_shouldProcessMatchingFiles() {
    common::init_test_logging();
    let dir = common::create_temp_dir().unwrap();
    common::create_test_file(dir.path(), "a.txt", "Hello").unwrap();
    common::create_test_file(dir.path(), "sub/b.md", "Good morning").unwrap();
    common::create_test_file(dir.path(), "sub/c.txt", "please FAIL").unwrap();
    common::create_test_file(dir.path(), "ignored.json", "{}").unwrap();

    let mock = common::hello_provider()
        .failing_when_contains("FAIL", ProviderError::Blocked("captcha".to_string()));
    let controller = controller(mock);

    let operation = controller
        .run_batch(dir.path(), None, None, Some(2), &CancellationToken::new(), false)
        .await
        .unwrap();

    assert_eq!(operation.status, BatchStatus::Completed);
    assert_eq!(operation.progress.total_files, 3);
    assert_eq!(operation.progress.successful_files, 2);
    assert_eq!(operation.progress.failed_files, 1);

    let summary = app_controller::format_batch_summary(&operation);
    assert!(summary.contains("[FAILED]"));
    assert!(summary.contains("3/3 processed, 2 succeeded, 1 failed"));
}

#[tokio::test]
async fn test_runBatch_withMissingDirectory_shouldFail() {
    let dir = common::create_temp_dir().unwrap();
    let controller = controller(MockProvider::new());

    let result = controller
        .run_batch(&dir.path().join("missing"), None, None, None, &CancellationToken::new(), false)
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_memoryCommands_shouldReportAndClear() {
    let controller = controller(common::hello_provider());
    let cancel = CancellationToken::new();

    controller.back_translate("Hello", None, None, &cancel).await.unwrap();
    controller.back_translate("Hello", None, None, &cancel).await.unwrap();

    let summary = controller.memory_summary().await.unwrap();
    assert!(summary.enabled);
    assert_eq!(summary.stored_entries, 2);
    assert_eq!(summary.session.hits, 2);
    assert!(summary.lifetime.is_none());
    assert!(summary.database_path.is_none());

    assert_eq!(controller.purge_memory().await, 0);
    assert_eq!(controller.clear_memory().await.unwrap(), 2);
    assert_eq!(controller.memory_summary().await.unwrap().stored_entries, 0);
}

#[tokio::test]
async fn test_withConfig_shouldOpenSqliteMemoryAtConfiguredPath() {
    let dir = common::create_temp_dir().unwrap();
    let db_path = dir.path().join("data/tm.db");

    let mut config = Config::default();
    config.memory.database_path = Some(db_path.clone());
    let controller = Controller::with_config(config).unwrap();

    let summary = controller.memory_summary().await.unwrap();
    assert_eq!(summary.database_path, Some(db_path.clone()));
    assert_eq!(summary.stored_entries, 0);
    assert!(db_path.exists());
}

#[tokio::test]
async fn test_withConfig_withMemoryDisabled_shouldNotCreateDatabase() {
    let dir = common::create_temp_dir().unwrap();
    let db_path = dir.path().join("tm.db");

    let mut config = Config::default();
    config.memory.enabled = false;
    config.memory.database_path = Some(db_path.clone());
    let controller = Controller::with_config(config).unwrap();

    let summary = controller.memory_summary().await.unwrap();
    assert!(!summary.enabled);
    assert!(summary.database_path.is_none());
    assert!(!db_path.exists());
}

#[tokio::test]
async fn test_memorySummary_acrossControllers_shouldReportPersistedCounters() {
    let dir = common::create_temp_dir().unwrap();
    let db_path = dir.path().join("tm.db");
    let cancel = CancellationToken::new();

    let mut config = Config::default();
    config.retry = common::fast_retry_policy();
    config.memory.database_path = Some(db_path.clone());

    for _ in 0..2 {
        let store = SqliteCacheStore::open(&db_path).unwrap();
        let controller = Controller::with_provider(
            config.clone(),
            Arc::new(common::hello_provider()),
            TranslationMemory::with_store(Arc::new(store)),
            Some(db_path.clone()),
        );
        controller.back_translate("Hello", None, None, &cancel).await.unwrap();
    }

    // A fresh controller, as a separate `memory stats` run would build
    let controller = Controller::with_config(config).unwrap();
    let summary = controller.memory_summary().await.unwrap();

    assert_eq!(summary.session.hits, 0);
    let lifetime = summary.lifetime.expect("persistent memory keeps counters");
    assert_eq!(lifetime.misses, 2);
    assert_eq!(lifetime.hits, 2);
}
