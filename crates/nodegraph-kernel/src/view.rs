//! Denormalized per-node snapshot for indexers and API consumers.

use std::collections::BTreeSet;

use nodegraph_core::{Address, EdgeName, Label, NodeId, Role};
use serde::{Deserialize, Serialize};

use crate::engine::{Engine, Result};
use crate::revisions::Revision;

/// One side of a user edge as seen from the viewed node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeView {
    pub node: NodeId,
    pub name: EdgeName,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeView {
    pub id: NodeId,
    pub label: Label,
    pub owner: Address,
    pub creator: Address,
    pub burnt: bool,
    pub permissions_bypass: bool,
    pub admins: Vec<Address>,
    pub editors: Vec<Address>,
    pub current_revision: Option<Revision>,
    pub revision_count: usize,
    /// Distinct neighbours over active user edges, ascending.
    pub related: Vec<NodeId>,
    pub incoming: Vec<EdgeView>,
    pub outgoing: Vec<EdgeView>,
}

impl Engine {
    pub fn node_view(&self, node: NodeId) -> Result<NodeView> {
        let record = self.registry.get(node)?;

        let outgoing: Vec<EdgeView> = self
            .edges
            .active_outgoing(node)
            .into_iter()
            .filter(|edge| !edge.name.is_system())
            .map(|edge| EdgeView {
                node: edge.target,
                name: edge.name,
            })
            .collect();
        let incoming: Vec<EdgeView> = self
            .edges
            .active_incoming(node)
            .into_iter()
            .filter(|edge| !edge.name.is_system())
            .map(|edge| EdgeView {
                node: edge.source,
                name: edge.name,
            })
            .collect();
        let related: BTreeSet<NodeId> = outgoing
            .iter()
            .chain(&incoming)
            .map(|edge| edge.node)
            .filter(|other| *other != node)
            .collect();

        Ok(NodeView {
            id: node,
            label: record.label.clone(),
            owner: record.owner,
            creator: record.creator,
            burnt: record.burnt,
            permissions_bypass: record.permissions_bypass,
            admins: self.role_members(node, Role::Admin).to_vec(),
            editors: self.role_members(node, Role::Editor).to_vec(),
            current_revision: self.revisions.current(node).cloned(),
            revision_count: self.revisions.count(node),
            related: related.into_iter().collect(),
            incoming,
            outgoing,
        })
    }
}
