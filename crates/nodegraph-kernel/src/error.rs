//! Error types for the engine and the kernel host.

use nodegraph_core::{Amount, Blake3Hash, CoreError, NodeId};
use nodegraph_perms::PermsError;
use nodegraph_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The error kinds surfaced verbatim to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    NodeNonexistent,
    InvalidString,
    ReservedString,
    InsufficientPermissions,
    RecursiveDelegation,
    OnlyProtocolSteward,
    InsufficientFunds,
    InvalidArgument,
    IndexOutOfBounds,
    InternalConsistency,
}

/// Why the engine rejected a call. State is unchanged whenever one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("node {0} does not exist")]
    NodeNonexistent(NodeId),

    /// Burnt nodes accept no further mutation.
    #[error("node {0} is burnt")]
    NodeBurnt(NodeId),

    /// Owner-only operation attempted by someone else.
    #[error("caller is not the owner of node {0}")]
    NotOwner(NodeId),

    /// Royalty overrides need the caller to be both owner and creator.
    #[error("caller is not both owner and creator of node {0}")]
    NotOwnerCreator(NodeId),

    #[error("only the protocol steward may do this")]
    OnlyProtocolSteward,

    /// Value arrived before the first mint established a steward.
    #[error("no protocol steward has been established")]
    StewardUnset,

    #[error("insufficient funds: {required} required, {supplied} supplied")]
    InsufficientFunds { required: Amount, supplied: Amount },

    #[error("royalty of {0} basis points exceeds 100%")]
    InvalidRoyalty(u16),

    #[error("recipient must not be the null address")]
    InvalidRecipient,

    /// Crediting would overflow an account balance.
    #[error("balance overflow")]
    BalanceOverflow,

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error(transparent)]
    Perms(#[from] PermsError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

fn core_kind(err: &CoreError) -> ErrorKind {
    match err {
        CoreError::InvalidString(_) => ErrorKind::InvalidString,
        CoreError::ReservedString(_) => ErrorKind::ReservedString,
        _ => ErrorKind::InvalidArgument,
    }
}

impl EngineError {
    /// The caller-facing kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NodeNonexistent(_) => ErrorKind::NodeNonexistent,
            EngineError::NodeBurnt(_)
            | EngineError::NotOwner(_)
            | EngineError::NotOwnerCreator(_) => ErrorKind::InsufficientPermissions,
            EngineError::OnlyProtocolSteward | EngineError::StewardUnset => {
                ErrorKind::OnlyProtocolSteward
            }
            EngineError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            EngineError::InvalidRoyalty(_)
            | EngineError::InvalidRecipient
            | EngineError::BalanceOverflow => ErrorKind::InvalidArgument,
            EngineError::IndexOutOfBounds { .. } => ErrorKind::IndexOutOfBounds,
            EngineError::Perms(PermsError::InsufficientPermissions { .. }) => {
                ErrorKind::InsufficientPermissions
            }
            EngineError::Perms(PermsError::RecursiveDelegation { .. }) => {
                ErrorKind::RecursiveDelegation
            }
            EngineError::Perms(PermsError::DelegationDepthExceeded { .. }) => {
                ErrorKind::InternalConsistency
            }
            EngineError::Perms(PermsError::Core(err)) | EngineError::Core(err) => core_kind(err),
        }
    }
}

/// Errors that can occur during Kernel operations.
#[derive(Debug, Error)]
pub enum KernelError {
    /// The engine rejected the call; nothing was logged.
    #[error("call rejected: {0}")]
    Engine(#[from] EngineError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Signature or encoding failure.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// A signed call carried the wrong nonce for its signer.
    #[error("stale nonce: expected {expected}, got {got}")]
    StaleNonce { expected: u64, got: u64 },

    /// The store already holds a different entry at this seq.
    #[error("log conflict at seq {seq}: existing entry {existing:?}")]
    Conflict { seq: u64, existing: Blake3Hash },

    /// A logged call failed when replayed.
    #[error("replay of seq {seq} failed: {source}")]
    ReplayFailed { seq: u64, source: EngineError },

    /// A logged call replayed to different records than were stored.
    #[error("replay of seq {seq} diverged from the stored records")]
    ReplayDiverged { seq: u64 },
}

impl KernelError {
    /// The engine error kind, when the engine rejected the call.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            KernelError::Engine(err) => Some(err.kind()),
            _ => None,
        }
    }
}

/// Result type for Kernel operations.
pub type Result<T> = std::result::Result<T, KernelError>;

#[cfg(test)]
mod tests {
    use super::*;
    use nodegraph_core::Role;

    #[test]
    fn test_kinds() {
        let reserved = EngineError::from(CoreError::ReservedString("_x".into()));
        assert_eq!(reserved.kind(), ErrorKind::ReservedString);

        let denied = EngineError::from(PermsError::InsufficientPermissions {
            node: NodeId(1),
            role: Role::Editor,
        });
        assert_eq!(denied.kind(), ErrorKind::InsufficientPermissions);
        assert_eq!(
            EngineError::NodeBurnt(NodeId(1)).kind(),
            ErrorKind::InsufficientPermissions
        );
        assert_eq!(
            EngineError::StewardUnset.kind(),
            ErrorKind::OnlyProtocolSteward
        );
        assert_eq!(
            EngineError::from(PermsError::DelegationDepthExceeded { node: NodeId(0) }).kind(),
            ErrorKind::InternalConsistency
        );
    }
}
