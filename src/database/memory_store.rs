/*!
 * SQLite implementation of the translation memory store.
 */

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use log::debug;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;

use crate::errors::CacheError;
use crate::translation::cache::{CacheEntry, CacheStore, LookupMetrics};
use super::connection::DatabaseConnection;

/// Default cap on persisted entries
pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// Translation memory persisted in SQLite
#[derive(Debug, Clone)]
pub struct SqliteCacheStore {
    /// Database connection
    db: DatabaseConnection,
    /// Least recently accessed entries beyond this count are pruned on write; 0 disables the cap
    max_entries: u64,
}

impl SqliteCacheStore {
    /// Wrap an open connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    /// Open the store at a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        Ok(Self::new(DatabaseConnection::new(path)?))
    }

    /// Open a throwaway in-memory store
    pub fn in_memory() -> Result<Self, CacheError> {
        Ok(Self::new(DatabaseConnection::new_in_memory()?))
    }

    /// Set the entry cap
    pub fn with_max_entries(mut self, max_entries: u64) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Location of the database file
    pub fn path(&self) -> &Path {
        self.db.path()
    }
}

fn to_millis(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_millis()
}

fn from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis).single().unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Delete the least recently accessed entries beyond `max_entries`
fn prune_least_recent(conn: &Connection, max_entries: u64) -> rusqlite::Result<usize> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM translation_memory", [], |row| row.get(0))?;
    let overflow = count - max_entries as i64;
    if overflow <= 0 {
        return Ok(0);
    }

    conn.execute(
        r#"
        DELETE FROM translation_memory
        WHERE id IN (
            SELECT id FROM translation_memory
            ORDER BY last_accessed ASC, id ASC
            LIMIT ?1
        )
        "#,
        [overflow],
    )
}

#[async_trait]
impl CacheStore for SqliteCacheStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheError> {
        let key = key.to_string();

        let entry = self
            .db
            .execute_async(move |conn| {
                let entry = conn
                    .query_row(
                        r#"
                        SELECT cache_key, source_text, source_language, target_language,
                               translated_text, expires_at
                        FROM translation_memory
                        WHERE cache_key = ?1
                        "#,
                        [&key],
                        |row| {
                            Ok(CacheEntry {
                                key: row.get(0)?,
                                source_text: row.get(1)?,
                                source_language: row.get(2)?,
                                target_language: row.get(3)?,
                                translated_text: row.get(4)?,
                                expires_at: from_millis(row.get(5)?),
                            })
                        },
                    )
                    .optional()?;
                Ok(entry)
            })
            .await?;

        Ok(entry)
    }

    async fn put(&self, entry: &CacheEntry) -> Result<(), CacheError> {
        let entry = entry.clone();
        let max_entries = self.max_entries;

        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO translation_memory (
                        cache_key, source_text, source_language, target_language,
                        translated_text, expires_at, updated_at, last_accessed
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                    ON CONFLICT(cache_key) DO UPDATE SET
                        translated_text = excluded.translated_text,
                        expires_at = excluded.expires_at,
                        updated_at = excluded.updated_at,
                        last_accessed = excluded.last_accessed
                    "#,
                    params![
                        entry.key,
                        entry.source_text,
                        entry.source_language,
                        entry.target_language,
                        entry.translated_text,
                        to_millis(entry.expires_at),
                        to_millis(Utc::now()),
                    ],
                )?;

                if max_entries > 0 {
                    let pruned = prune_least_recent(conn, max_entries)?;
                    if pruned > 0 {
                        debug!("Pruned {} translation memory entries over the cap of {}", pruned, max_entries);
                    }
                }

                Ok(())
            })
            .await?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let key = key.to_string();
        self.db
            .execute_async(move |conn| {
                conn.execute("DELETE FROM translation_memory WHERE cache_key = ?1", [&key])?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<u64, CacheError> {
        let deleted = self
            .db
            .execute_async(|conn| {
                let deleted = conn.execute("DELETE FROM translation_memory", [])?;
                conn.execute(
                    "UPDATE memory_metrics SET hits = 0, misses = 0, total_lookup_time_ms = 0.0, updated_at = ?1 WHERE id = 1",
                    [to_millis(Utc::now())],
                )?;
                Ok(deleted as u64)
            })
            .await?;
        Ok(deleted)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, CacheError> {
        let now = to_millis(now);
        let deleted = self
            .db
            .execute_async(move |conn| {
                let deleted = conn.execute("DELETE FROM translation_memory WHERE expires_at <= ?1", [now])?;
                Ok(deleted as u64)
            })
            .await?;
        Ok(deleted)
    }

    async fn len(&self) -> Result<u64, CacheError> {
        let count = self
            .db
            .execute_async(|conn| {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM translation_memory", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await?;
        Ok(count)
    }

    async fn touch(&self, key: &str, now: DateTime<Utc>) -> Result<(), CacheError> {
        let key = key.to_string();
        let now = to_millis(now);
        self.db
            .execute_async(move |conn| {
                conn.execute(
                    "UPDATE translation_memory SET last_accessed = ?2, access_count = access_count + 1 WHERE cache_key = ?1",
                    params![key, now],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn record_lookup(&self, hit: bool, elapsed: Duration) -> Result<(), CacheError> {
        let (hits, misses) = if hit { (1, 0) } else { (0, 1) };
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        self.db
            .execute_async(move |conn| {
                conn.execute(
                    r#"
                    UPDATE memory_metrics
                    SET hits = hits + ?1,
                        misses = misses + ?2,
                        total_lookup_time_ms = total_lookup_time_ms + ?3,
                        updated_at = ?4
                    WHERE id = 1
                    "#,
                    params![hits, misses, elapsed_ms, to_millis(Utc::now())],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn lookup_metrics(&self) -> Result<Option<LookupMetrics>, CacheError> {
        let metrics = self
            .db
            .execute_async(|conn| {
                let metrics = conn
                    .query_row(
                        "SELECT hits, misses, total_lookup_time_ms FROM memory_metrics WHERE id = 1",
                        [],
                        |row| {
                            let hits: i64 = row.get(0)?;
                            let misses: i64 = row.get(1)?;
                            let total_ms: f64 = row.get(2)?;
                            Ok(LookupMetrics::new(hits.max(0) as u64, misses.max(0) as u64, total_ms))
                        },
                    )
                    .optional()?;
                Ok(metrics)
            })
            .await?;
        Ok(metrics)
    }
}
