//! String validation and the reserved-name policy.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Labels and user edge names must not start with this character.
pub const RESERVED_PREFIX: char = '_';

/// Edges the kernel sets itself. Their names carry the reserved prefix,
/// so they can never be asserted through `merge`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemEdge {
    /// "Resolve my role holders through the target's role holders."
    Delegation,
    Stash,
    Precedes,
}

impl SystemEdge {
    pub const ALL: [SystemEdge; 3] = [
        SystemEdge::Delegation,
        SystemEdge::Stash,
        SystemEdge::Precedes,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            SystemEdge::Delegation => "_delegate",
            SystemEdge::Stash => "_stash",
            SystemEdge::Precedes => "_precedes",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|edge| edge.name() == name)
    }
}

fn is_reserved(s: &str) -> bool {
    s.starts_with(RESERVED_PREFIX)
}

/// Labels must be non-empty and unreserved.
pub fn validate_label(label: &str) -> Result<()> {
    if label.is_empty() {
        return Err(CoreError::InvalidString("label"));
    }
    if is_reserved(label) {
        return Err(CoreError::ReservedString(label.to_string()));
    }
    Ok(())
}

/// Content hashes must be non-empty.
pub fn validate_content_hash(hash: &str) -> Result<()> {
    if hash.is_empty() {
        return Err(CoreError::InvalidString("content hash"));
    }
    Ok(())
}

/// User edge names must be non-empty and unreserved, system names included.
pub fn validate_edge_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(CoreError::InvalidString("edge name"));
    }
    if is_reserved(name) {
        return Err(CoreError::ReservedString(name.to_string()));
    }
    Ok(())
}
