//! Database schema migrations for SQLite.
//!
//! Versioned migrations: each one moves the schema from version N to N+1
//! inside a single transaction.

use rusqlite::Connection;

use crate::error::{Result, StoreError};

/// Current schema version.
pub const CURRENT_VERSION: u32 = 1;

/// Initialize or migrate the database schema. Idempotent.
pub fn migrate(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
        [],
        |row| row.get(0),
    )?;

    if current > CURRENT_VERSION {
        return Err(StoreError::Migration(format!(
            "database schema {current} is newer than supported {CURRENT_VERSION}"
        )));
    }

    if current < CURRENT_VERSION {
        let tx = conn.transaction()?;

        for version in (current + 1)..=CURRENT_VERSION {
            apply_migration(&tx, version)?;

            tx.execute(
                "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![version, now_millis()],
            )?;
        }

        tx.commit()?;
        tracing::debug!(from = current, to = CURRENT_VERSION, "schema migrated");
    }

    Ok(())
}

fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
    match version {
        1 => apply_v1(conn),
        _ => Err(StoreError::Migration(format!(
            "unknown migration version: {version}"
        ))),
    }
}

/// Migration v1: the call log and its per-node record index.
fn apply_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per accepted call, seq is the position in the total order
        CREATE TABLE entries (
            seq INTEGER PRIMARY KEY,          -- 0-based, gapless
            digest BLOB NOT NULL,             -- 32 bytes, Blake3 of the CBOR entry
            height INTEGER NOT NULL,          -- host height
            caller BLOB NOT NULL,             -- 20 bytes
            value BLOB NOT NULL,              -- 8 bytes, big-endian u64
            nonce INTEGER,                    -- present for signed calls
            call_name TEXT NOT NULL,
            entry BLOB NOT NULL,              -- CBOR LogEntry
            ingested_at INTEGER NOT NULL      -- local timestamp (Unix ms)
        );

        -- Records emitted by each entry, once per touched node
        CREATE TABLE node_records (
            node INTEGER NOT NULL,
            seq INTEGER NOT NULL REFERENCES entries(seq),
            idx INTEGER NOT NULL,             -- position within the entry's records
            record BLOB NOT NULL,             -- CBOR Record
            PRIMARY KEY (node, seq, idx)
        );

        CREATE INDEX idx_entries_caller ON entries(caller);
        CREATE INDEX idx_entries_height ON entries(height);
        "#,
    )?;

    Ok(())
}

fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
