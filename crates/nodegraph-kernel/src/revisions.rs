//! Revision ledger: append-only content hash history per node.

use std::collections::HashMap;

use nodegraph_core::{CallContext, ContentHash, Height, NodeId, Record, Role};
use serde::{Deserialize, Serialize};

use crate::engine::{Engine, Outcome, Result};
use crate::error::EngineError;

/// One entry of a node's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    pub hash: ContentHash,
    /// Position in the node's history, starting at 0.
    #[serde(rename = "sequenceNumber")]
    pub sequence: u64,
    pub height: Height,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionLedger {
    logs: HashMap<NodeId, Vec<Revision>>,
}

impl RevisionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to `node`'s history. Never fails; callers validate first.
    pub(crate) fn append(&mut self, node: NodeId, hash: ContentHash, height: Height) -> Revision {
        let log = self.logs.entry(node).or_default();
        let revision = Revision {
            hash,
            sequence: log.len() as u64,
            height,
        };
        log.push(revision.clone());
        revision
    }

    pub fn count(&self, node: NodeId) -> usize {
        self.logs.get(&node).map_or(0, Vec::len)
    }

    pub fn get(&self, node: NodeId, index: usize) -> Result<&Revision> {
        self.logs
            .get(&node)
            .and_then(|log| log.get(index))
            .ok_or(EngineError::IndexOutOfBounds {
                index,
                len: self.count(node),
            })
    }

    pub fn current(&self, node: NodeId) -> Option<&Revision> {
        self.logs.get(&node).and_then(|log| log.last())
    }
}

impl Engine {
    /// Append a revision to `node` and record it.
    pub(crate) fn push_revision(
        &mut self,
        node: NodeId,
        hash: ContentHash,
        height: Height,
        records: &mut Vec<Record>,
    ) {
        let revision = self.revisions.append(node, hash, height);
        records.push(Record::Revised {
            node,
            hash: revision.hash,
            sequence: revision.sequence,
            height: revision.height,
        });
    }

    /// New content for `node` without touching its edges.
    ///
    /// Editors may revise. So may anyone when the node has the
    /// permissions bypass set.
    pub(crate) fn revise(&mut self, ctx: &CallContext, node: NodeId, hash: &str) -> Result<Outcome> {
        let record = self.registry.live(node)?;
        if !record.permissions_bypass {
            self.require_role(node, Role::Editor, &ctx.caller)?;
        }
        let hash = ContentHash::new(hash)?;
        let settlement = self.plan_value(ctx, &[])?;

        let mut records = Vec::new();
        self.push_revision(node, hash, ctx.height, &mut records);
        self.economics.settle(settlement, &mut records);
        Ok(Outcome::with_records(records))
    }
}
