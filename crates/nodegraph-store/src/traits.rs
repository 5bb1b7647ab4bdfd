//! Store trait: the abstract interface for call log persistence.
//!
//! The log is the total order the host delivered. Every accepted call is
//! one [`LogEntry`] at a gapless sequence number, together with the records
//! it emitted. Replaying the log through a fresh engine rebuilds state.

use async_trait::async_trait;
use nodegraph_core::{Blake3Hash, LogEntry, NodeId, Record};

use crate::error::Result;

/// Result of appending an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertResult {
    /// Entry was appended at the head.
    Inserted,
    /// The identical entry is already stored at this seq.
    AlreadyExists,
    /// A different entry is stored at this seq.
    Conflict {
        /// Digest of the stored entry.
        existing: Blake3Hash,
    },
}

/// The last stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogHead {
    pub seq: u64,
    pub digest: Blake3Hash,
}

impl LogHead {
    /// The seq the next append must carry.
    pub fn next_seq(&self) -> u64 {
        self.seq + 1
    }
}

/// The Store trait: async interface for the call log.
///
/// SQLite work runs under `spawn_blocking` so callers never block the
/// runtime.
///
/// # Design Notes
///
/// - **Idempotent appends**: re-appending a stored entry returns `AlreadyExists`.
/// - **Conflict detection**: a different entry at a stored seq returns `Conflict`.
/// - **No gaps**: an entry past the head fails with `OutOfOrder`.
#[async_trait]
pub trait Store: Send + Sync {
    /// Append an entry at the head of the log.
    async fn append(&self, entry: &LogEntry) -> Result<InsertResult>;

    /// Get the entry at `seq`.
    async fn get_entry(&self, seq: u64) -> Result<Option<LogEntry>>;

    /// Entries with `start <= seq <= end`, ordered by seq.
    async fn get_entries_range(&self, start: u64, end: u64) -> Result<Vec<LogEntry>>;

    /// The last stored entry, or `None` for an empty log.
    async fn head(&self) -> Result<Option<LogHead>>;

    /// Records touching `node`, with the seq that emitted each, in log order.
    async fn records_for_node(&self, node: NodeId) -> Result<Vec<(u64, Record)>>;
}

/// Extension trait for common store patterns.
pub trait StoreExt: Store {
    /// The seq the next append must carry.
    fn next_seq(&self) -> impl std::future::Future<Output = Result<u64>> + Send;

    /// Every stored entry in order.
    fn load_all(&self) -> impl std::future::Future<Output = Result<Vec<LogEntry>>> + Send;
}

impl<S: Store + ?Sized> StoreExt for S {
    async fn next_seq(&self) -> Result<u64> {
        Ok(self.head().await?.map_or(0, |head| head.next_seq()))
    }

    async fn load_all(&self) -> Result<Vec<LogEntry>> {
        match self.head().await? {
            Some(head) => self.get_entries_range(0, head.seq).await,
            None => Ok(Vec::new()),
        }
    }
}
