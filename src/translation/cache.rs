/*!
 * Translation memory.
 *
 * A content-addressed cache of exact translations. Entries are keyed by the
 * SHA-256 of `text|from|to`, expire after a TTL, and are optionally mirrored
 * to a persistent `CacheStore` so they survive process restarts.
 */

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{debug, warn};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::errors::CacheError;

/// Default time to live of an entry
pub const DEFAULT_TTL_DAYS: i64 = 30;

/// Default cap on entries held in process memory
pub const DEFAULT_MAX_IN_MEMORY: usize = 10_000;

/// Derive the cache key for a text and language pair
pub fn cache_key(source_text: &str, source_language: &str, target_language: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_text.as_bytes());
    hasher.update(b"|");
    hasher.update(source_language.as_bytes());
    hasher.update(b"|");
    hasher.update(target_language.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// A stored translation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    /// Content hash of (source text, source language, target language)
    pub key: String,
    /// Original text
    pub source_text: String,
    /// Language of the original text
    pub source_language: String,
    /// Language of the translation
    pub target_language: String,
    /// Translated text
    pub translated_text: String,
    /// Instant after which the entry is treated as absent
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Create an entry expiring `ttl` from now
    pub fn new(
        source_text: &str,
        source_language: &str,
        target_language: &str,
        translated_text: &str,
        ttl: ChronoDuration,
    ) -> Self {
        Self {
            key: cache_key(source_text, source_language, target_language),
            source_text: source_text.to_string(),
            source_language: source_language.to_string(),
            target_language: target_language.to_string(),
            translated_text: translated_text.to_string(),
            expires_at: Utc::now() + ttl,
        }
    }

    /// Whether the entry has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Persistent backing store for the translation memory
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch an entry by key, expired or not
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError>;

    /// Insert or replace an entry
    async fn put(&self, entry: &CacheEntry) -> Result<(), CacheError>;

    /// Delete an entry
    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Delete every entry and reset lookup counters, returning how many entries were removed
    async fn clear(&self) -> Result<u64, CacheError>;

    /// Delete entries expired at `now`, returning how many were removed
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, CacheError>;

    /// Number of stored entries
    async fn len(&self) -> Result<u64, CacheError>;

    /// Mark an entry as read at `now`
    async fn touch(&self, _key: &str, _now: DateTime<Utc>) -> Result<(), CacheError> {
        Ok(())
    }

    /// Add one lookup to the persisted counters
    async fn record_lookup(&self, _hit: bool, _elapsed: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    /// Counters accumulated by every process that used the store
    async fn lookup_metrics(&self) -> Result<Option<LookupMetrics>, CacheError> {
        Ok(None)
    }
}

/// Lookup counters persisted across runs
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LookupMetrics {
    pub hits: u64,
    pub misses: u64,
    pub total_lookups: u64,
    pub hit_rate: f64,
    /// Mean wall time of a lookup in milliseconds
    pub avg_lookup_ms: f64,
}

impl LookupMetrics {
    pub fn new(hits: u64, misses: u64, total_lookup_time_ms: f64) -> Self {
        let total_lookups = hits + misses;
        let (hit_rate, avg_lookup_ms) = if total_lookups > 0 {
            (hits as f64 / total_lookups as f64, total_lookup_time_ms / total_lookups as f64)
        } else {
            (0.0, 0.0)
        };

        Self {
            hits,
            misses,
            total_lookups,
            hit_rate,
            avg_lookup_ms,
        }
    }
}

/// Hit/miss counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemoryStats {
    /// Lookups answered from the memory
    pub hits: u64,
    /// Lookups that fell through to the provider
    pub misses: u64,
    /// hits / (hits + misses)
    pub hit_rate: f64,
    /// Entries currently held in process memory
    pub entries_in_memory: usize,
}

/// An in-process entry and the tick of its last use
#[derive(Debug, Clone)]
struct Slot {
    entry: CacheEntry,
    last_used: u64,
}

/// Per-key async locks; released locks are dropped from the map
#[derive(Default)]
struct KeyLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

struct KeyGuard<'a> {
    owner: &'a KeyLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl KeyLocks {
    async fn lock(&self, key: &str) -> KeyGuard<'_> {
        let mutex = {
            let mut locks = self.locks.lock();
            locks.entry(key.to_string()).or_default().clone()
        };
        let guard = mutex.lock_owned().await;
        KeyGuard {
            owner: self,
            key: key.to_string(),
            guard: Some(guard),
        }
    }
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        let mut locks = self.owner.locks.lock();
        if let Some(mutex) = locks.get(&self.key) {
            // Only the map itself still references the lock
            if Arc::strong_count(mutex) == 1 {
                locks.remove(&self.key);
            }
        }
    }
}

/// Translation memory with optional persistence
#[derive(Clone)]
pub struct TranslationMemory {
    /// Entries known to this process
    entries: Arc<RwLock<HashMap<String, Slot>>>,

    /// Monotonic use counter for least-recently-used eviction
    clock: Arc<AtomicU64>,

    /// Cap on `entries`; 0 disables it
    max_in_memory: usize,

    /// Persistent store, if any
    store: Option<Arc<dyn CacheStore>>,

    /// Serializes operations on the same key
    key_locks: Arc<KeyLocks>,

    /// Lifetime of newly stored entries
    ttl: ChronoDuration,

    /// Cache hit counter
    hits: Arc<AtomicU64>,

    /// Cache miss counter
    misses: Arc<AtomicU64>,

    /// Whether caching is enabled
    enabled: bool,
}

impl TranslationMemory {
    /// Create an in-process memory with the default TTL
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            clock: Arc::new(AtomicU64::new(0)),
            max_in_memory: DEFAULT_MAX_IN_MEMORY,
            store: None,
            key_locks: Arc::new(KeyLocks::default()),
            ttl: ChronoDuration::days(DEFAULT_TTL_DAYS),
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            enabled,
        }
    }

    /// Create a memory backed by a persistent store
    pub fn with_store(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store: Some(store),
            ..Self::new(true)
        }
    }

    /// Override the time to live of new entries
    pub fn with_ttl(mut self, ttl: ChronoDuration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Override the cap on entries held in process memory; 0 disables it
    pub fn with_max_in_memory(mut self, max_in_memory: usize) -> Self {
        self.max_in_memory = max_in_memory;
        self
    }

    /// Enable or disable the memory
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Check if the memory is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether a persistent store is attached
    pub fn is_persistent(&self) -> bool {
        self.store.is_some()
    }

    /// Look up an exact translation
    pub async fn lookup(&self, source_text: &str, source_language: &str, target_language: &str) -> Option<String> {
        if !self.enabled {
            return None;
        }

        let key = cache_key(source_text, source_language, target_language);
        let _guard = self.key_locks.lock(&key).await;
        let started = Instant::now();
        let now = Utc::now();

        let in_memory = self.entries.read().get(&key).map(|slot| slot.entry.clone());
        let found = match in_memory {
            Some(entry) if !entry.is_expired_at(now) => {
                self.mark_used(&key);
                Some(entry.translated_text)
            }
            Some(_) => {
                self.entries.write().remove(&key);
                self.remove_from_store(&key).await;
                None
            }
            None => self.lookup_in_store(&key, now).await,
        };

        if let Some(store) = &self.store {
            if found.is_some() {
                if let Err(e) = store.touch(&key, now).await {
                    warn!("Failed to mark memory entry as accessed: {}", e);
                }
            }
            if let Err(e) = store.record_lookup(found.is_some(), started.elapsed()).await {
                warn!("Failed to record memory lookup: {}", e);
            }
        }

        match &found {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Memory hit for '{}' ({} -> {})",
                       truncate_text(source_text, 30),
                       source_language,
                       target_language);
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!("Memory miss for '{}' ({} -> {})",
                       truncate_text(source_text, 30),
                       source_language,
                       target_language);
            }
        }

        found
    }

    /// Store a translation, replacing any previous entry and resetting its TTL
    pub async fn store(&self, source_text: &str, source_language: &str, target_language: &str, translation: &str) {
        if !self.enabled {
            return;
        }

        let entry = CacheEntry::new(source_text, source_language, target_language, translation, self.ttl);
        let _guard = self.key_locks.lock(&entry.key).await;

        self.remember(entry.clone());

        if let Some(store) = &self.store {
            if let Err(e) = store.put(&entry).await {
                warn!("Failed to persist translation memory entry: {}", e);
            }
        }

        debug!("Stored translation for '{}' ({} -> {})",
               truncate_text(source_text, 30),
               source_language,
               target_language);
    }

    /// Remove expired entries from memory and the store
    pub async fn purge_expired(&self) -> u64 {
        let now = Utc::now();
        let mut removed = {
            let mut entries = self.entries.write();
            let before = entries.len();
            entries.retain(|_, slot| !slot.entry.is_expired_at(now));
            (before - entries.len()) as u64
        };

        if let Some(store) = &self.store {
            match store.purge_expired(now).await {
                Ok(count) => removed = removed.max(count),
                Err(e) => warn!("Failed to purge expired memory entries: {}", e),
            }
        }

        removed
    }

    /// Clear the memory, including the persistent store
    pub async fn clear(&self) -> Result<u64, CacheError> {
        let in_memory = {
            let mut entries = self.entries.write();
            let count = entries.len() as u64;
            entries.clear();
            count
        };
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);

        let removed = match &self.store {
            Some(store) => store.clear().await?,
            None => in_memory,
        };

        debug!("Translation memory cleared ({} entries)", removed);
        Ok(removed)
    }

    /// Number of persisted entries, or in-process entries without a store
    pub async fn persisted_len(&self) -> Result<u64, CacheError> {
        match &self.store {
            Some(store) => store.len().await,
            None => Ok(self.len() as u64),
        }
    }

    /// Lookup counters kept by the persistent store, if any
    pub async fn lifetime_stats(&self) -> Result<Option<LookupMetrics>, CacheError> {
        match &self.store {
            Some(store) => store.lookup_metrics().await,
            None => Ok(None),
        }
    }

    /// Get statistics of this process
    pub fn stats(&self) -> MemoryStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;

        MemoryStats {
            hits,
            misses,
            hit_rate: if total > 0 { hits as f64 / total as f64 } else { 0.0 },
            entries_in_memory: self.len(),
        }
    }

    /// Get the number of entries held in process memory
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Check if no entry is held in process memory
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    async fn lookup_in_store(&self, key: &str, now: DateTime<Utc>) -> Option<String> {
        let store = self.store.as_ref()?;

        match store.get(key).await {
            Ok(Some(entry)) if !entry.is_expired_at(now) => {
                let translated = entry.translated_text.clone();
                self.remember(entry);
                Some(translated)
            }
            Ok(Some(_)) => {
                self.remove_from_store(key).await;
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Translation memory lookup failed, treating as miss: {}", e);
                None
            }
        }
    }

    async fn remove_from_store(&self, key: &str) {
        if let Some(store) = &self.store {
            if let Err(e) = store.remove(key).await {
                warn!("Failed to remove expired memory entry: {}", e);
            }
        }
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    fn mark_used(&self, key: &str) {
        let tick = self.tick();
        if let Some(slot) = self.entries.write().get_mut(key) {
            slot.last_used = tick;
        }
    }

    /// Insert into process memory, evicting the least recently used entries over the cap
    fn remember(&self, entry: CacheEntry) {
        let slot = Slot {
            last_used: self.tick(),
            entry,
        };
        let mut entries = self.entries.write();
        entries.insert(slot.entry.key.clone(), slot);

        while self.max_in_memory > 0 && entries.len() > self.max_in_memory {
            let oldest = entries
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }

    /// Insert an entry as-is, bypassing TTL computation
    #[cfg(test)]
    pub(crate) fn insert_entry(&self, entry: CacheEntry) {
        self.remember(entry);
    }
}

impl Default for TranslationMemory {
    fn default() -> Self {
        Self::new(true)
    }
}

impl std::fmt::Debug for TranslationMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationMemory")
            .field("entries", &self.len())
            .field("max_in_memory", &self.max_in_memory)
            .field("persistent", &self.store.is_some())
            .field("ttl_days", &self.ttl.num_days())
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Truncate text to a maximum number of characters with ellipsis
fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        format!("{}...", text.chars().take(max_length).collect::<String>())
    }
}
