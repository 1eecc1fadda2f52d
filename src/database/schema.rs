/*!
 * Database schema definitions and migrations.
 */

use anyhow::{Context, Result};
use rusqlite::Connection;
use log::{debug, info};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Initialize the database schema
pub fn initialize_schema(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version == 0 {
        info!("Initializing database schema v{}", SCHEMA_VERSION);
        create_all_tables(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if current_version < SCHEMA_VERSION {
        info!(
            "Migrating database schema from v{} to v{}",
            current_version, SCHEMA_VERSION
        );
        migrate_schema(conn, current_version)?;
    } else if current_version > SCHEMA_VERSION {
        return Err(anyhow::anyhow!(
            "Database schema v{} is newer than supported v{}",
            current_version, SCHEMA_VERSION
        ));
    } else {
        debug!("Database schema is up to date (v{})", current_version);
    }

    Ok(())
}

/// Get the current schema version from the database
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let table_exists: bool = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )
        .context("Failed to check schema_version table existence")?;

    if !table_exists {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    Ok(version)
}

/// Set the schema version in the database
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version, updated_at) VALUES (1, ?1, datetime('now'))",
        [version],
    )?;
    Ok(())
}

/// Create all database tables
fn create_all_tables(conn: &Connection) -> Result<()> {
    // WAL lets readers proceed while a batch is writing
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;

    // Timestamps are unix milliseconds (UTC)
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS translation_memory (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            cache_key TEXT NOT NULL UNIQUE,
            source_text TEXT NOT NULL,
            source_language TEXT NOT NULL,
            target_language TEXT NOT NULL,
            translated_text TEXT NOT NULL,
            expires_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            last_accessed INTEGER NOT NULL,
            access_count INTEGER NOT NULL DEFAULT 0
        );

        CREATE INDEX IF NOT EXISTS idx_memory_expires ON translation_memory(expires_at);
        CREATE INDEX IF NOT EXISTS idx_memory_accessed ON translation_memory(last_accessed);
        "#,
    )?;

    create_metrics_table(conn)?;

    info!("Database schema created successfully");
    Ok(())
}

/// Lookup counters that outlive a single process
fn create_metrics_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS memory_metrics (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            hits INTEGER NOT NULL DEFAULT 0,
            misses INTEGER NOT NULL DEFAULT 0,
            total_lookup_time_ms REAL NOT NULL DEFAULT 0.0,
            updated_at INTEGER NOT NULL DEFAULT 0
        );

        INSERT OR IGNORE INTO memory_metrics (id) VALUES (1);
        "#,
    )?;
    Ok(())
}

/// Migrate the schema one version at a time
fn migrate_schema(conn: &Connection, from_version: i32) -> Result<()> {
    let mut current = from_version;

    while current < SCHEMA_VERSION {
        match current {
            1 => migrate_v1_to_v2(conn).context("Failed to migrate schema from v1 to v2")?,
            other => {
                return Err(anyhow::anyhow!(
                    "Unknown schema version: {}. Cannot migrate.",
                    other
                ));
            }
        }
        current += 1;
        set_schema_version(conn, current)?;
    }

    info!("Schema migration completed to v{}", SCHEMA_VERSION);
    Ok(())
}

/// v2 tracks when each entry was last read and keeps lookup counters
fn migrate_v1_to_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        ALTER TABLE translation_memory ADD COLUMN last_accessed INTEGER NOT NULL DEFAULT 0;
        ALTER TABLE translation_memory ADD COLUMN access_count INTEGER NOT NULL DEFAULT 0;
        UPDATE translation_memory SET last_accessed = updated_at;
        DROP INDEX IF EXISTS idx_memory_updated;
        CREATE INDEX IF NOT EXISTS idx_memory_accessed ON translation_memory(last_accessed);
        "#,
    )?;
    create_metrics_table(conn)
}
