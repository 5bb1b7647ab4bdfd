//! # Nodegraph Kernel Store
//!
//! Storage abstraction for the Nodegraph Kernel. Provides a trait-based
//! interface for the accepted call log with SQLite and in-memory
//! implementations.
//!
//! ## Overview
//!
//! The engine is a deterministic state machine, so its state is never
//! stored directly. The store keeps the total order instead: one
//! [`LogEntry`](nodegraph_core::LogEntry) per accepted call plus a per-node
//! index of the records it emitted. Replaying the log rebuilds the engine.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`InsertResult`] - Result of appending an entry
//!
//! ## Usage
//!
//! ```rust,no_run
//! use nodegraph_store::{SqliteStore, Store, StoreExt};
//!
//! async fn example() {
//!     let store = SqliteStore::open("nodegraph.db").unwrap();
//!     let next = store.next_seq().await.unwrap();
//!     // let result = store.append(&entry).await.unwrap();
//! }
//! ```

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{InsertResult, LogHead, Store, StoreExt};
