//! SQLite implementation of the Store trait.
//!
//! This is the durable backend. It uses rusqlite with bundled SQLite,
//! wrapped in async via tokio::spawn_blocking.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use nodegraph_core::{from_cbor, to_cbor, Blake3Hash, LogEntry, NodeId, Record};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{InsertResult, LogHead, Store};

/// SQLite-based store implementation.
///
/// Thread-safe via internal Mutex. All operations use spawn_blocking
/// to avoid blocking the async runtime.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open a SQLite database at the given path.
    ///
    /// Creates the file and runs migrations if needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| StoreError::Poisoned)?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

fn digest_from_blob(bytes: Vec<u8>) -> Result<Blake3Hash> {
    let arr: [u8; 32] = bytes
        .try_into()
        .map_err(|b: Vec<u8>| StoreError::InvalidData(format!("digest of {} bytes", b.len())))?;
    Ok(Blake3Hash::from_bytes(arr))
}

/// Per-node record rows for an entry: (node, index in entry, CBOR record).
fn node_rows(entry: &LogEntry) -> Result<Vec<(NodeId, usize, Vec<u8>)>> {
    let mut rows = Vec::new();
    for (index, record) in entry.records.iter().enumerate() {
        let nodes = record.nodes();
        if nodes.is_empty() {
            continue;
        }
        let bytes = to_cbor(record)?;
        for node in nodes {
            rows.push((node, index, bytes.clone()));
        }
    }
    Ok(rows)
}

#[async_trait]
impl Store for SqliteStore {
    async fn append(&self, entry: &LogEntry) -> Result<InsertResult> {
        let digest = entry.digest()?;
        let encoded = to_cbor(entry)?;
        let rows = node_rows(entry)?;
        let seq = entry.seq;
        let height = entry.height;
        let caller = entry.caller;
        let value = entry.value;
        let nonce = entry.nonce;
        let call_name = entry.call.name();

        let result = self
            .run(move |conn| {
                let tx = conn.transaction()?;

                let expected: u64 = tx.query_row(
                    "SELECT COALESCE(MAX(seq) + 1, 0) FROM entries",
                    [],
                    |row| row.get(0),
                )?;

                if seq < expected {
                    let existing: Vec<u8> = tx.query_row(
                        "SELECT digest FROM entries WHERE seq = ?1",
                        params![seq],
                        |row| row.get(0),
                    )?;
                    let existing = digest_from_blob(existing)?;
                    return Ok(if existing == digest {
                        InsertResult::AlreadyExists
                    } else {
                        InsertResult::Conflict { existing }
                    });
                }
                if seq > expected {
                    return Err(StoreError::OutOfOrder { expected, got: seq });
                }

                tx.execute(
                    "INSERT INTO entries (
                        seq, digest, height, caller, value, nonce, call_name, entry, ingested_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                    params![
                        seq,
                        digest.as_bytes().as_slice(),
                        height,
                        caller.as_bytes().as_slice(),
                        value.to_be_bytes().as_slice(),
                        nonce,
                        call_name,
                        encoded,
                        now_millis(),
                    ],
                )?;

                for (node, index, record) in &rows {
                    tx.execute(
                        "INSERT INTO node_records (node, seq, idx, record) VALUES (?1, ?2, ?3, ?4)",
                        params![node.get(), seq, *index as i64, record],
                    )?;
                }

                tx.commit()?;
                Ok(InsertResult::Inserted)
            })
            .await?;

        if result == InsertResult::Inserted {
            tracing::debug!(seq, call = call_name, "sqlite store append");
        }
        Ok(result)
    }

    async fn get_entry(&self, seq: u64) -> Result<Option<LogEntry>> {
        self.run(move |conn| {
            let bytes: Option<Vec<u8>> = conn
                .query_row(
                    "SELECT entry FROM entries WHERE seq = ?1",
                    params![seq],
                    |row| row.get(0),
                )
                .optional()?;
            bytes
                .map(|b| from_cbor(&b).map_err(StoreError::from))
                .transpose()
        })
        .await
    }

    async fn get_entries_range(&self, start: u64, end: u64) -> Result<Vec<LogEntry>> {
        self.run(move |conn| {
            let mut stmt =
                conn.prepare("SELECT entry FROM entries WHERE seq >= ?1 AND seq <= ?2 ORDER BY seq")?;
            let blobs = stmt
                .query_map(params![start, end], |row| row.get::<_, Vec<u8>>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            blobs
                .iter()
                .map(|b| from_cbor(b).map_err(StoreError::from))
                .collect()
        })
        .await
    }

    async fn head(&self) -> Result<Option<LogHead>> {
        self.run(|conn| {
            let row: Option<(u64, Vec<u8>)> = conn
                .query_row(
                    "SELECT seq, digest FROM entries ORDER BY seq DESC LIMIT 1",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;
            row.map(|(seq, digest)| -> Result<LogHead> {
                Ok(LogHead {
                    seq,
                    digest: digest_from_blob(digest)?,
                })
            })
            .transpose()
        })
        .await
    }

    async fn records_for_node(&self, node: NodeId) -> Result<Vec<(u64, Record)>> {
        self.run(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT seq, record FROM node_records WHERE node = ?1 ORDER BY seq, idx",
            )?;
            let rows = stmt
                .query_map(params![node.get()], |row| {
                    Ok((row.get::<_, u64>(0)?, row.get::<_, Vec<u8>>(1)?))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.into_iter()
                .map(|(seq, bytes)| -> Result<(u64, Record)> { Ok((seq, from_cbor(&bytes)?)) })
                .collect()
        })
        .await
    }
}

fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
