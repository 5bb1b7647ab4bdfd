//! # Nodegraph Kernel
//!
//! A deterministic engine for a shared graph of labelled, versioned nodes
//! connected by named, togglable edges, with per-node roles, depth-1
//! permission delegation, and a pull-payment ledger for fees.
//!
//! ## Overview
//!
//! - **Nodes**: minted with an immutable label and a first content hash,
//!   then revised, transferred, and eventually burnt.
//! - **Edges**: asserted as full snapshots on mint and merge. Omitted
//!   edges are deactivated, never deleted.
//! - **Roles**: ADMIN and EDITOR per node. A node may delegate role
//!   resolution to one level of other nodes.
//! - **Economics**: mint and connection fees become balance credits that
//!   only leave through `withdraw`.
//!
//! Every call either applies in full or fails with no state change.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use nodegraph_kernel::{Kernel, KernelConfig};
//! use nodegraph_kernel::core::{Address, Call, CallContext};
//! use nodegraph_kernel::store::SqliteStore;
//!
//! async fn example() {
//!     let store = SqliteStore::open("nodegraph.db").unwrap();
//!     let mut kernel = Kernel::open(store, KernelConfig::default()).await.unwrap();
//!
//!     let alice = Address::from_bytes([1; 20]);
//!     let applied = kernel
//!         .submit(CallContext::new(alice, 1), Call::mint("topic", "Qm..."))
//!         .await
//!         .unwrap();
//!     let node = applied.outcome.node.unwrap();
//!     assert_eq!(kernel.engine().label_for(node).unwrap(), "topic");
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `nodegraph_kernel::core` - Primitives, calls and records
//! - `nodegraph_kernel::perms` - Roles and delegation
//! - `nodegraph_kernel::store` - Call log storage and SQLite

pub mod config;
pub mod economics;
pub mod engine;
pub mod error;
pub mod kernel;
pub mod registry;
pub mod revisions;
pub mod view;

mod access;
mod graph;
mod lifecycle;

// Re-export component crates
pub use nodegraph_core as core;
pub use nodegraph_perms as perms;
pub use nodegraph_store as store;

pub use config::{KernelConfig, ProtocolParams};
pub use economics::{Economics, ProtocolConfig};
pub use engine::{Engine, Outcome};
pub use error::{EngineError, ErrorKind, KernelError, Result};
pub use kernel::{Applied, Kernel};
pub use registry::NodeRecord;
pub use revisions::Revision;
pub use view::{EdgeView, NodeView};

// Re-export commonly used core types
pub use nodegraph_core::{
    Address, Amount, Call, CallContext, EdgeInput, Keypair, LogEntry, NodeId, Record, Role,
    Royalty, SignedCall,
};
