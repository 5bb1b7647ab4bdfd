//! Error types for the permissions module.

use nodegraph_core::{NodeId, Role};
use thiserror::Error;

/// Errors that can occur during role and delegation operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermsError {
    /// The caller does not hold the role the operation demands.
    #[error("insufficient permissions: {role} required on node {node}")]
    InsufficientPermissions { node: NodeId, role: Role },

    /// The delegation would create a chain longer than one hop.
    #[error("recursive delegation: {delegator} -> {target}")]
    RecursiveDelegation { delegator: NodeId, target: NodeId },

    /// Resolution walked further than any valid delegation graph allows.
    ///
    /// Only reachable if stored state was corrupted outside the engine.
    #[error("delegation depth exceeded resolving node {node}")]
    DelegationDepthExceeded { node: NodeId },

    /// Core error.
    #[error("core error: {0}")]
    Core(#[from] nodegraph_core::CoreError),
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
