//! # Nodegraph Kernel Core
//!
//! Pure primitives for the Nodegraph Kernel: node identifiers, accounts,
//! validated strings, edges, calls, and the records emitted for indexers.
//!
//! This crate contains no I/O, no storage, no networking. It is pure
//! computation over the data structures shared by every other crate.
//!
//! ## Key Types
//!
//! - [`NodeId`] - Sequential identifier assigned at mint
//! - [`Address`] - Account identifier (owner, role holder, fee receiver)
//! - [`Label`], [`ContentHash`], [`EdgeName`] - Validated strings
//! - [`EdgeIndex`] - Directed, named, togglable edges with enumeration
//! - [`Call`] / [`SignedCall`] - Mutating operations as submitted by hosts
//! - [`Record`] / [`LogEntry`] - What accepted calls emit and persist
//!
//! ## Reserved Names
//!
//! Labels and edge names must not start with `_`. The only exceptions are
//! the system edges in [`SystemEdge`], which the kernel sets internally.

pub mod call;
pub mod canonical;
pub mod crypto;
pub mod edge;
pub mod error;
pub mod record;
pub mod set;
pub mod types;
pub mod validation;

pub use call::{Call, CallContext, SignedCall};
pub use canonical::{from_cbor, to_cbor};
pub use crypto::{Blake3Hash, Ed25519PublicKey, Ed25519Signature, Keypair};
pub use edge::{Edge, EdgeIndex, EdgeInput};
pub use error::{CoreError, Result};
pub use record::{LogEntry, Record};
pub use set::EnumerableSet;
pub use types::{
    Address, Amount, ContentHash, EdgeName, Height, Label, NodeId, Role, Royalty,
    ROYALTY_DENOMINATOR,
};
pub use validation::{SystemEdge, RESERVED_PREFIX};
