//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use nodegraph_core::{Blake3Hash, LogEntry, NodeId, Record};

use crate::error::{Result, StoreError};
use crate::traits::{InsertResult, LogHead, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Entries indexed by seq, with their digests.
    entries: Vec<(LogEntry, Blake3Hash)>,

    /// Node -> (seq, record index) for every record touching it.
    by_node: HashMap<NodeId, Vec<(u64, usize)>>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn seq_index(seq: u64) -> Option<usize> {
    usize::try_from(seq).ok()
}

#[async_trait]
impl Store for MemoryStore {
    async fn append(&self, entry: &LogEntry) -> Result<InsertResult> {
        let digest = entry.digest()?;
        let mut inner = self.inner.write().map_err(|_| StoreError::Poisoned)?;

        let expected = inner.entries.len() as u64;
        if entry.seq < expected {
            let existing = seq_index(entry.seq)
                .and_then(|index| inner.entries.get(index))
                .map(|(_, digest)| *digest)
                .ok_or_else(|| StoreError::InvalidData(format!("missing seq {}", entry.seq)))?;
            return Ok(if existing == digest {
                InsertResult::AlreadyExists
            } else {
                InsertResult::Conflict { existing }
            });
        }
        if entry.seq > expected {
            return Err(StoreError::OutOfOrder {
                expected,
                got: entry.seq,
            });
        }

        for (index, record) in entry.records.iter().enumerate() {
            for node in record.nodes() {
                inner
                    .by_node
                    .entry(node)
                    .or_default()
                    .push((entry.seq, index));
            }
        }
        inner.entries.push((entry.clone(), digest));

        tracing::debug!(seq = entry.seq, call = entry.call.name(), "memory store append");
        Ok(InsertResult::Inserted)
    }

    async fn get_entry(&self, seq: u64) -> Result<Option<LogEntry>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(seq_index(seq)
            .and_then(|index| inner.entries.get(index))
            .map(|(entry, _)| entry.clone()))
    }

    async fn get_entries_range(&self, start: u64, end: u64) -> Result<Vec<LogEntry>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner
            .entries
            .iter()
            .map(|(entry, _)| entry)
            .filter(|entry| entry.seq >= start && entry.seq <= end)
            .cloned()
            .collect())
    }

    async fn head(&self) -> Result<Option<LogHead>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        Ok(inner.entries.last().map(|(entry, digest)| LogHead {
            seq: entry.seq,
            digest: *digest,
        }))
    }

    async fn records_for_node(&self, node: NodeId) -> Result<Vec<(u64, Record)>> {
        let inner = self.inner.read().map_err(|_| StoreError::Poisoned)?;
        let Some(positions) = inner.by_node.get(&node) else {
            return Ok(Vec::new());
        };
        positions
            .iter()
            .map(|&(seq, index)| {
                seq_index(seq)
                    .and_then(|at| inner.entries.get(at))
                    .and_then(|(entry, _)| entry.records.get(index))
                    .map(|record| (seq, record.clone()))
                    .ok_or_else(|| {
                        StoreError::InvalidData(format!("dangling record {seq}/{index}"))
                    })
            })
            .collect()
    }
}
