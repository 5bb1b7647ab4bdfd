//! The Kernel: an engine bound to a persistent call log.
//!
//! The host delivers calls in a total order. The kernel executes each one
//! on its engine and appends the accepted ones to the store, so the log
//! can be replayed to rebuild the engine after a restart.

use std::collections::HashMap;
use std::sync::Arc;

use nodegraph_core::{Address, Call, CallContext, Height, LogEntry, NodeId, Record, SignedCall};
use nodegraph_store::{InsertResult, Store, StoreExt};

use crate::config::KernelConfig;
use crate::engine::{Engine, Outcome};
use crate::error::{KernelError, Result};

/// An accepted, logged call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Where the call landed in the log.
    pub seq: u64,
    pub outcome: Outcome,
}

/// Engine state rebuilt from a log.
struct Replayed {
    engine: Engine,
    nonces: HashMap<Address, u64>,
    next_seq: u64,
}

pub struct Kernel<S: Store> {
    /// The storage backend.
    store: Arc<S>,
    config: KernelConfig,
    /// State as of the last logged entry.
    engine: Engine,
    /// Next expected nonce per signer.
    nonces: HashMap<Address, u64>,
    next_seq: u64,
}

impl<S: Store> Kernel<S> {
    /// Start a kernel on an empty store.
    ///
    /// Use [`Kernel::open`] for a store that may already hold entries.
    pub fn new(store: S, config: KernelConfig) -> Self {
        Self {
            store: Arc::new(store),
            engine: Engine::new(config.protocol.clone()),
            config,
            nonces: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Open a kernel over `store`, replaying every stored entry.
    pub async fn open(store: S, config: KernelConfig) -> Result<Self> {
        let store = Arc::new(store);
        let replayed = replay(store.as_ref(), &config).await?;
        Ok(Self {
            store,
            config,
            engine: replayed.engine,
            nonces: replayed.nonces,
            next_seq: replayed.next_seq,
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Get the store reference.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// The seq the next accepted call will be logged at.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// The nonce `signer`'s next signed call must carry.
    pub fn nonce_of(&self, signer: &Address) -> u64 {
        self.nonces.get(signer).copied().unwrap_or(0)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Submission
    // ─────────────────────────────────────────────────────────────────────────

    /// Execute a call from an already authenticated caller and log it.
    pub async fn submit(&mut self, ctx: CallContext, call: Call) -> Result<Applied> {
        self.commit(ctx, call, None).await
    }

    /// Verify a signed call, check its nonce, then execute and log it.
    ///
    /// The nonce is only consumed when the call is accepted.
    pub async fn submit_signed(&mut self, signed: &SignedCall, height: Height) -> Result<Applied> {
        let caller = if self.config.verify_signatures {
            signed.verify()?
        } else {
            signed.signer.address()
        };
        let expected = self.nonce_of(&caller);
        if signed.nonce != expected {
            return Err(KernelError::StaleNonce {
                expected,
                got: signed.nonce,
            });
        }
        self.commit(signed.context(height), signed.call.clone(), Some(signed.nonce))
            .await
    }

    /// Execute on a copy of the engine and swap it in once the entry is
    /// stored, so an unlogged call never reaches `self.engine`.
    async fn commit(&mut self, ctx: CallContext, call: Call, nonce: Option<u64>) -> Result<Applied> {
        let mut next = self.engine.clone();
        let outcome = next.execute(ctx, &call)?;
        let entry = LogEntry {
            seq: self.next_seq,
            height: ctx.height,
            caller: ctx.caller,
            value: ctx.value,
            nonce,
            call,
            records: outcome.records.clone(),
        };

        match self.store.append(&entry).await {
            // An identical entry means another writer already logged
            // this exact call; our state matches theirs.
            Ok(InsertResult::Inserted) | Ok(InsertResult::AlreadyExists) => {
                self.engine = next;
                self.next_seq += 1;
                if let Some(nonce) = nonce {
                    self.nonces.insert(ctx.caller, nonce + 1);
                }
                Ok(Applied {
                    seq: entry.seq,
                    outcome,
                })
            }
            Ok(InsertResult::Conflict { existing }) => {
                tracing::warn!(seq = entry.seq, "log conflict, rebuilding from store");
                self.rebuild().await?;
                Err(KernelError::Conflict {
                    seq: entry.seq,
                    existing,
                })
            }
            Err(err) => {
                tracing::warn!(seq = entry.seq, error = %err, "append failed");
                Err(err.into())
            }
        }
    }

    /// Throw away in-memory state and replay the store.
    pub async fn rebuild(&mut self) -> Result<()> {
        let replayed = replay(self.store.as_ref(), &self.config).await?;
        self.engine = replayed.engine;
        self.nonces = replayed.nonces;
        self.next_seq = replayed.next_seq;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Log queries
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn entry(&self, seq: u64) -> Result<Option<LogEntry>> {
        Ok(self.store.get_entry(seq).await?)
    }

    /// Entries with `start <= seq <= end`.
    pub async fn entries(&self, start: u64, end: u64) -> Result<Vec<LogEntry>> {
        Ok(self.store.get_entries_range(start, end).await?)
    }

    /// Every record ever emitted about `node`, with its seq.
    pub async fn records_for_node(&self, node: NodeId) -> Result<Vec<(u64, Record)>> {
        Ok(self.store.records_for_node(node).await?)
    }
}

async fn replay<S: Store + ?Sized>(store: &S, config: &KernelConfig) -> Result<Replayed> {
    let entries = store.load_all().await?;
    let mut engine = Engine::new(config.protocol.clone());
    let mut nonces = HashMap::new();

    for entry in &entries {
        let ctx = CallContext::new(entry.caller, entry.height).with_value(entry.value);
        let outcome = engine
            .execute(ctx, &entry.call)
            .map_err(|source| KernelError::ReplayFailed {
                seq: entry.seq,
                source,
            })?;
        if config.verify_replay && outcome.records != entry.records {
            return Err(KernelError::ReplayDiverged { seq: entry.seq });
        }
        if let Some(nonce) = entry.nonce {
            nonces.insert(entry.caller, nonce + 1);
        }
    }

    tracing::info!(
        entries = entries.len(),
        nodes = engine.node_count(),
        "replayed call log"
    );
    Ok(Replayed {
        engine,
        nonces,
        next_seq: entries.len() as u64,
    })
}
