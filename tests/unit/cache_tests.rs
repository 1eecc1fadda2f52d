/*!
 * Tests for translation memory functionality
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};

use backtrans::errors::CacheError;
use backtrans::translation::cache::cache_key;
use backtrans::translation::{CacheEntry, CacheStore, TranslationMemory};

/// Store whose every operation fails
#[derive(Default)]
struct BrokenStore {
    calls: AtomicUsize,
}

impl BrokenStore {
    fn fail<T>(&self) -> Result<T, CacheError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CacheError::Storage("disk on fire".to_string()))
    }
}

#[async_trait]
impl CacheStore for BrokenStore {
    async fn get(&self, _key: &str) -> Result<Option<CacheEntry>, CacheError> {
        self.fail()
    }

    async fn put(&self, _entry: &CacheEntry) -> Result<(), CacheError> {
        self.fail()
    }

    async fn remove(&self, _key: &str) -> Result<(), CacheError> {
        self.fail()
    }

    async fn clear(&self) -> Result<u64, CacheError> {
        self.fail()
    }

    async fn purge_expired(&self, _now: DateTime<Utc>) -> Result<u64, CacheError> {
        self.fail()
    }

    async fn len(&self) -> Result<u64, CacheError> {
        self.fail()
    }
}

#[test]
fn test_cacheKey_shouldBeStableHexDigest() {
    let key = cache_key("Hello", "en", "ja");
    assert_eq!(key.len(), 64);
    assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(key, cache_key("Hello", "en", "ja"));
}

#[test]
fn test_cacheKey_withDifferentParts_shouldDiffer() {
    let base = cache_key("Hello", "en", "ja");
    assert_ne!(base, cache_key("Hello ", "en", "ja"));
    assert_ne!(base, cache_key("Hello", "de", "ja"));
    assert_ne!(base, cache_key("Hello", "en", "fr"));
}

#[tokio::test]
async fn test_lookup_afterStore_shouldReturnTranslation() {
    let memory = TranslationMemory::new(true);
    memory.store("Hello", "en", "ja", "こんにちは").await;

    assert_eq!(memory.lookup("Hello", "en", "ja").await, Some("こんにちは".to_string()));
    assert_eq!(memory.lookup("Hello", "en", "fr").await, None);
}

#[tokio::test]
async fn test_store_twice_shouldKeepLatestAndOneEntry() {
    let memory = TranslationMemory::new(true);
    memory.store("Hello", "en", "fr", "Salut").await;
    memory.store("Hello", "en", "fr", "Bonjour").await;

    assert_eq!(memory.len(), 1);
    assert_eq!(memory.lookup("Hello", "en", "fr").await, Some("Bonjour".to_string()));
}

#[tokio::test]
async fn test_disabledMemory_shouldNeverHit() {
    let memory = TranslationMemory::new(false);
    memory.store("Hello", "en", "fr", "Bonjour").await;

    assert!(memory.lookup("Hello", "en", "fr").await.is_none());
    assert!(memory.is_empty());
    assert_eq!(memory.stats().misses, 0);
}

#[tokio::test]
async fn test_lookup_withZeroTtl_shouldTreatEntryAsAbsent() {
    let memory = TranslationMemory::new(true).with_ttl(ChronoDuration::zero());
    memory.store("Hello", "en", "fr", "Bonjour").await;

    assert!(memory.lookup("Hello", "en", "fr").await.is_none());
    assert!(memory.is_empty());
}

#[tokio::test]
async fn test_purgeExpired_shouldRemoveOnlyExpiredEntries() {
    let expired = TranslationMemory::new(true).with_ttl(ChronoDuration::zero());
    expired.store("a", "en", "fr", "x").await;
    expired.store("b", "en", "fr", "y").await;
    assert_eq!(expired.purge_expired().await, 2);
    assert!(expired.is_empty());

    let fresh = TranslationMemory::new(true);
    fresh.store("a", "en", "fr", "x").await;
    assert_eq!(fresh.purge_expired().await, 0);
    assert_eq!(fresh.len(), 1);
}

#[tokio::test]
async fn test_stats_shouldCountHitsAndMisses() {
    let memory = TranslationMemory::new(true);
    memory.store("Hello", "en", "fr", "Bonjour").await;

    memory.lookup("Hello", "en", "fr").await;
    memory.lookup("Hello", "en", "fr").await;
    memory.lookup("Bye", "en", "fr").await;

    let stats = memory.stats();
    assert_eq!(stats.hits, 2);
    assert_eq!(stats.misses, 1);
    assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(stats.entries_in_memory, 1);
}

#[tokio::test]
async fn test_clear_shouldEmptyMemoryAndResetCounters() {
    let memory = TranslationMemory::new(true);
    memory.store("a", "en", "fr", "x").await;
    memory.store("b", "en", "fr", "y").await;
    memory.lookup("a", "en", "fr").await;

    assert_eq!(memory.clear().await.unwrap(), 2);
    assert!(memory.is_empty());
    assert_eq!(memory.stats().hits, 0);
}

#[tokio::test]
async fn test_lookup_withFailingStore_shouldBeMissNotError() {
    let store = Arc::new(BrokenStore::default());
    let memory = TranslationMemory::with_store(store.clone());

    assert!(memory.lookup("Hello", "en", "fr").await.is_none());
    assert_eq!(memory.stats().misses, 1);
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_store_withFailingStore_shouldStillServeFromProcessMemory() {
    let memory = TranslationMemory::with_store(Arc::new(BrokenStore::default()));
    memory.store("Hello", "en", "fr", "Bonjour").await;

    assert_eq!(memory.lookup("Hello", "en", "fr").await, Some("Bonjour".to_string()));
    assert!(memory.is_persistent());
    assert!(memory.persisted_len().await.is_err());
}

#[tokio::test]
async fn test_concurrentStores_onSameKey_shouldLeaveOneEntry() {
    let memory = TranslationMemory::new(true);
    let mut handles = Vec::new();
    for i in 0..16 {
        let memory = memory.clone();
        handles.push(tokio::spawn(async move {
            memory.store("Hello", "en", "fr", &format!("Bonjour {}", i)).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(memory.len(), 1);
    let value = memory.lookup("Hello", "en", "fr").await.unwrap();
    assert!(value.starts_with("Bonjour "));
}

#[test]
fn test_cacheEntry_isExpiredAt_shouldCompareWithExpiry() {
    let entry = CacheEntry::new("Hello", "en", "fr", "Bonjour", ChronoDuration::days(1));
    assert!(!entry.is_expired_at(Utc::now()));
    assert!(entry.is_expired_at(Utc::now() + ChronoDuration::days(2)));
    assert_eq!(entry.key, cache_key("Hello", "en", "fr"));
}
