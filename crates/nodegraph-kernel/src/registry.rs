//! Identity & label registry: node existence, labels, ownership.

use std::collections::HashMap;

use nodegraph_core::{Address, EnumerableSet, Label, NodeId};

use crate::error::EngineError;

/// Everything the registry knows about one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRecord {
    pub id: NodeId,
    pub label: Label,
    pub owner: Address,
    /// The minter. Never changes, even across transfers.
    pub creator: Address,
    pub burnt: bool,
    /// Lets anyone revise the node and connect into it for free.
    pub permissions_bypass: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    nodes: Vec<NodeRecord>,
    by_label: HashMap<Label, EnumerableSet<NodeId>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The id the next mint will receive.
    pub fn next_id(&self) -> NodeId {
        NodeId(self.nodes.len() as u64)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn exists(&self, node: NodeId) -> bool {
        self.index(node).is_some()
    }

    fn index(&self, node: NodeId) -> Option<usize> {
        usize::try_from(node.get())
            .ok()
            .filter(|index| *index < self.nodes.len())
    }

    pub fn get(&self, node: NodeId) -> Result<&NodeRecord, EngineError> {
        self.index(node)
            .map(|index| &self.nodes[index])
            .ok_or(EngineError::NodeNonexistent(node))
    }

    pub(crate) fn get_mut(&mut self, node: NodeId) -> Result<&mut NodeRecord, EngineError> {
        match self.index(node) {
            Some(index) => Ok(&mut self.nodes[index]),
            None => Err(EngineError::NodeNonexistent(node)),
        }
    }

    /// Existing and not burnt.
    pub fn live(&self, node: NodeId) -> Result<&NodeRecord, EngineError> {
        let record = self.get(node)?;
        if record.burnt {
            return Err(EngineError::NodeBurnt(node));
        }
        Ok(record)
    }

    /// Register a new node owned and created by `owner`.
    pub(crate) fn insert(&mut self, label: Label, owner: Address) -> NodeId {
        let id = self.next_id();
        self.by_label.entry(label.clone()).or_default().insert(id);
        self.nodes.push(NodeRecord {
            id,
            label,
            owner,
            creator: owner,
            burnt: false,
            permissions_bypass: false,
        });
        id
    }

    /// Hand `node` to `to`, returning the previous owner.
    pub(crate) fn set_owner(&mut self, node: NodeId, to: Address) -> Option<Address> {
        let record = self.get_mut(node).ok()?;
        Some(std::mem::replace(&mut record.owner, to))
    }

    /// Mark `node` burnt and clear its owner, returning the previous owner.
    pub(crate) fn burn(&mut self, node: NodeId) -> Option<Address> {
        let record = self.get_mut(node).ok()?;
        record.burnt = true;
        Some(std::mem::replace(&mut record.owner, Address::NULL))
    }

    pub(crate) fn set_permissions_bypass(&mut self, node: NodeId, enabled: bool) {
        if let Ok(record) = self.get_mut(node) {
            record.permissions_bypass = enabled;
        }
    }

    pub fn node_count_for_label(&self, label: &str) -> usize {
        self.label_set(label).map_or(0, EnumerableSet::len)
    }

    pub fn node_for_label_at(&self, label: &str, index: usize) -> Result<NodeId, EngineError> {
        let set = self.label_set(label);
        set.and_then(|set| set.at(index))
            .copied()
            .ok_or(EngineError::IndexOutOfBounds {
                index,
                len: set.map_or(0, EnumerableSet::len),
            })
    }

    fn label_set(&self, label: &str) -> Option<&EnumerableSet<NodeId>> {
        // Invalid labels simply have no nodes.
        let label = Label::new(label).ok()?;
        self.by_label.get(&label)
    }
}
