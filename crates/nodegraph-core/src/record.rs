//! Records: what accepted calls emit for indexers.
//!
//! Records are the only output of a successful call besides its return
//! value. The external indexer replays them to rebuild its node and
//! revision views; the log persists them next to the call that produced
//! them.

use serde::{Deserialize, Serialize};

use crate::call::Call;
use crate::canonical::to_cbor;
use crate::crypto::Blake3Hash;
use crate::error::Result;
use crate::types::{Address, Amount, ContentHash, EdgeName, Height, Label, NodeId, Role, Royalty};

/// One emitted state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Record {
    /// Ownership moved. Mint transfers from NULL, burn transfers to NULL.
    Transfer {
        node: NodeId,
        from: Address,
        to: Address,
    },
    LabelAssigned {
        node: NodeId,
        label: Label,
    },
    Revised {
        node: NodeId,
        hash: ContentHash,
        sequence: u64,
        height: Height,
    },
    Connected {
        source: NodeId,
        target: NodeId,
        name: EdgeName,
    },
    Disconnected {
        source: NodeId,
        target: NodeId,
        name: EdgeName,
    },
    RoleGranted {
        node: NodeId,
        role: Role,
        account: Address,
        sender: Address,
    },
    RoleRevoked {
        node: NodeId,
        role: Role,
        account: Address,
        sender: Address,
    },
    PermissionsDelegated {
        source: NodeId,
        target: NodeId,
    },
    DelegationRenounced {
        source: NodeId,
        target: NodeId,
    },
    ConnectionFeeSet {
        node: NodeId,
        amount: Amount,
    },
    PermissionsBypassSet {
        node: NodeId,
        enabled: bool,
    },
    ProtocolMintFeeSet {
        amount: Amount,
    },
    DefaultConnectionFeeSet {
        amount: Amount,
    },
    DefaultRoyaltySet {
        royalty: Option<Royalty>,
    },
    TokenRoyaltySet {
        node: NodeId,
        royalty: Option<Royalty>,
    },
    StewardEstablished {
        steward: Address,
    },
    Burnt {
        node: NodeId,
    },
    BalanceCredited {
        account: Address,
        amount: Amount,
    },
    Withdrawn {
        account: Address,
        amount: Amount,
    },
}

impl Record {
    /// The nodes this record is about, for per-node indexing.
    pub fn nodes(&self) -> Vec<NodeId> {
        match self {
            Record::Transfer { node, .. }
            | Record::LabelAssigned { node, .. }
            | Record::Revised { node, .. }
            | Record::RoleGranted { node, .. }
            | Record::RoleRevoked { node, .. }
            | Record::ConnectionFeeSet { node, .. }
            | Record::PermissionsBypassSet { node, .. }
            | Record::TokenRoyaltySet { node, .. }
            | Record::Burnt { node } => vec![*node],
            Record::Connected { source, target, .. }
            | Record::Disconnected { source, target, .. }
            | Record::PermissionsDelegated { source, target }
            | Record::DelegationRenounced { source, target } => {
                if source == target {
                    vec![*source]
                } else {
                    vec![*source, *target]
                }
            }
            Record::ProtocolMintFeeSet { .. }
            | Record::DefaultConnectionFeeSet { .. }
            | Record::DefaultRoyaltySet { .. }
            | Record::StewardEstablished { .. }
            | Record::BalanceCredited { .. }
            | Record::Withdrawn { .. } => Vec::new(),
        }
    }
}

/// One accepted call at its position in the total order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Position in the log, starting at 0 with no gaps.
    pub seq: u64,

    /// Host height the call executed at.
    pub height: Height,

    pub caller: Address,

    /// Value attached to the call.
    pub value: Amount,

    /// Caller nonce, present when the call arrived signed.
    pub nonce: Option<u64>,

    pub call: Call,

    /// Records the call emitted, in emission order.
    pub records: Vec<Record>,
}

impl LogEntry {
    /// Blake3 of the canonical encoding. Two entries with the same seq
    /// conflict when their digests differ.
    pub fn digest(&self) -> Result<Blake3Hash> {
        Ok(Blake3Hash::hash(&to_cbor(self)?))
    }

    /// Distinct nodes touched by this entry's records, in first-seen order.
    pub fn touched_nodes(&self) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        for node in self.records.iter().flat_map(Record::nodes) {
            if !nodes.contains(&node) {
                nodes.push(node);
            }
        }
        nodes
    }
}
