/*!
 * Translation memory persisted in SQLite across instances
 */

use std::sync::Arc;
use std::time::Duration;
use chrono::Duration as ChronoDuration;

use backtrans::database::SqliteCacheStore;
use backtrans::errors::ProviderError;
use backtrans::providers::MockProvider;
use backtrans::translation::{CacheStore, CancellationToken, TranslationMemory};

use crate::common;

fn persistent_memory(path: &std::path::Path) -> TranslationMemory {
    let store = SqliteCacheStore::open(path).unwrap();
    TranslationMemory::with_store(Arc::new(store))
}

#[tokio::test]
async fn test_memory_acrossInstances_shouldSurviveRestart() {
    let dir = common::create_temp_dir().unwrap();
    let db_path = dir.path().join("tm.db");

    {
        let memory = persistent_memory(&db_path);
        memory.store("Hello", "en", "ja", "こんにちは").await;
    }

    let reopened = persistent_memory(&db_path);
    assert!(reopened.is_empty());
    assert_eq!(reopened.lookup("Hello", "en", "ja").await, Some("こんにちは".to_string()));
    assert_eq!(reopened.persisted_len().await.unwrap(), 1);
    assert_eq!(reopened.len(), 1);
}

#[tokio::test]
async fn test_backTranslate_afterRestart_shouldNotNeedProvider() {
    let dir = common::create_temp_dir().unwrap();
    let db_path = dir.path().join("tm.db");
    let cancel = CancellationToken::new();

    let first = common::service_with_memory(common::hello_provider(), persistent_memory(&db_path));
    first.back_translate("Hello", "en", "ja", &cancel).await.unwrap();

    // The provider is down after the restart; both stages must come from disk
    let offline = MockProvider::new().failing(ProviderError::NetworkError("offline".to_string()));
    let second = common::service_with_memory(offline.clone(), persistent_memory(&db_path));
    let result = second.back_translate("Hello", "en", "ja", &cancel).await.unwrap();

    assert_eq!(result.final_translation.translated_text, "Hello");
    assert_eq!(result.cached_stages(), 2);
    assert_eq!(offline.call_count(), 0);
}

#[tokio::test]
async fn test_expiredEntries_shouldBePurgedFromDisk() {
    let dir = common::create_temp_dir().unwrap();
    let db_path = dir.path().join("tm.db");

    let memory = persistent_memory(&db_path).with_ttl(ChronoDuration::zero());
    memory.store("a", "en", "fr", "x").await;
    memory.store("b", "en", "fr", "y").await;

    assert_eq!(memory.purge_expired().await, 2);

    let store = SqliteCacheStore::open(&db_path).unwrap();
    assert_eq!(store.len().await.unwrap(), 0);
}

#[tokio::test]
async fn test_store_withMaxEntries_shouldKeepMostRecent() {
    let dir = common::create_temp_dir().unwrap();
    let db_path = dir.path().join("tm.db");
    let store = SqliteCacheStore::open(&db_path).unwrap().with_max_entries(2);
    let memory = TranslationMemory::with_store(Arc::new(store));

    memory.store("one", "en", "fr", "un").await;
    memory.store("two", "en", "fr", "deux").await;
    memory.store("three", "en", "fr", "trois").await;

    assert_eq!(memory.persisted_len().await.unwrap(), 2);

    let reopened = persistent_memory(&db_path);
    assert_eq!(reopened.lookup("three", "en", "fr").await, Some("trois".to_string()));
    assert_eq!(reopened.lookup("one", "en", "fr").await, None);
}

#[tokio::test]
async fn test_store_withMaxEntries_shouldEvictLeastRecentlyRead() {
    let dir = common::create_temp_dir().unwrap();
    let db_path = dir.path().join("tm.db");
    let store = SqliteCacheStore::open(&db_path).unwrap().with_max_entries(2);
    let memory = TranslationMemory::with_store(Arc::new(store));

    memory.store("one", "en", "fr", "un").await;
    memory.store("two", "en", "fr", "deux").await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    memory.lookup("one", "en", "fr").await;
    tokio::time::sleep(Duration::from_millis(10)).await;
    memory.store("three", "en", "fr", "trois").await;

    let reopened = persistent_memory(&db_path);
    assert_eq!(reopened.lookup("one", "en", "fr").await, Some("un".to_string()));
    assert_eq!(reopened.lookup("two", "en", "fr").await, None);
    assert_eq!(reopened.lookup("three", "en", "fr").await, Some("trois".to_string()));
}

#[tokio::test]
async fn test_lookupCounters_acrossInstances_shouldAccumulate() {
    let dir = common::create_temp_dir().unwrap();
    let db_path = dir.path().join("tm.db");

    {
        let memory = persistent_memory(&db_path);
        memory.store("Hello", "en", "ja", "こんにちは").await;
        memory.lookup("Hello", "en", "ja").await;
        memory.lookup("Bye", "en", "ja").await;
    }

    let reopened = persistent_memory(&db_path);
    assert_eq!(reopened.stats().hits, 0);
    reopened.lookup("Hello", "en", "ja").await;

    let lifetime = reopened.lifetime_stats().await.unwrap().expect("store keeps counters");
    assert_eq!(lifetime.hits, 2);
    assert_eq!(lifetime.misses, 1);
    assert!((lifetime.hit_rate - 2.0 / 3.0).abs() < 1e-9);

    reopened.clear().await.unwrap();
    assert_eq!(reopened.lifetime_stats().await.unwrap().unwrap().total_lookups, 0);
}

#[tokio::test]
async fn test_lifetimeStats_withoutStore_shouldBeNone() {
    let memory = TranslationMemory::new(true);
    memory.lookup("Hello", "en", "ja").await;
    assert!(memory.lifetime_stats().await.unwrap().is_none());
}

#[tokio::test]
async fn test_clear_shouldEmptyDatabase() {
    let dir = common::create_temp_dir().unwrap();
    let db_path = dir.path().join("tm.db");
    let memory = persistent_memory(&db_path);
    memory.store("a", "en", "fr", "x").await;
    memory.store("b", "en", "fr", "y").await;

    assert_eq!(memory.clear().await.unwrap(), 2);
    assert!(persistent_memory(&db_path).lookup("a", "en", "fr").await.is_none());
}
