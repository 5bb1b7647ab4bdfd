//! Directed, named, togglable edges between nodes.
//!
//! An edge is stored once, keyed by `(source, target, name)`, and keeps its
//! row after deactivation. Re-asserting it flips `active` back instead of
//! adding a duplicate. Only active edges appear in the enumerable neighbour
//! sets, which back the connected/backlinked read views.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::set::EnumerableSet;
use crate::types::{EdgeName, NodeId};

/// Identity of an edge.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    pub name: EdgeName,
}

impl Edge {
    pub fn new(source: NodeId, target: NodeId, name: EdgeName) -> Self {
        Self {
            source,
            target,
            name,
        }
    }

    /// Whether `node` is either endpoint.
    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }
}

fn default_active() -> bool {
    true
}

/// One entry of the edge lists passed to mint and merge.
///
/// `node` is the other endpoint: the target for outgoing lists, the source
/// for incoming lists. The name is unvalidated until the kernel checks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeInput {
    pub node: NodeId,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

impl EdgeInput {
    /// An edge to assert.
    pub fn new(node: NodeId, name: impl Into<String>) -> Self {
        Self {
            node,
            name: name.into(),
            active: true,
        }
    }

    /// An edge to explicitly deactivate.
    pub fn inactive(node: NodeId, name: impl Into<String>) -> Self {
        Self {
            node,
            name: name.into(),
            active: false,
        }
    }
}

type Neighbours = HashMap<NodeId, BTreeMap<EdgeName, EnumerableSet<NodeId>>>;

/// Every edge ever asserted, with per-node enumeration of active ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeIndex {
    /// Edge -> active flag.
    edges: HashMap<Edge, bool>,

    /// source -> name -> active targets.
    outgoing: Neighbours,

    /// target -> name -> active sources.
    incoming: Neighbours,
}

fn link(map: &mut Neighbours, node: NodeId, name: &EdgeName, other: NodeId) {
    map.entry(node)
        .or_default()
        .entry(name.clone())
        .or_default()
        .insert(other);
}

fn unlink(map: &mut Neighbours, node: NodeId, name: &EdgeName, other: NodeId) {
    let Some(by_name) = map.get_mut(&node) else {
        return;
    };
    if let Some(set) = by_name.get_mut(name) {
        set.remove(&other);
        if set.is_empty() {
            by_name.remove(name);
        }
    }
    if by_name.is_empty() {
        map.remove(&node);
    }
}

fn neighbours<'a>(map: &'a Neighbours, node: NodeId, name: &EdgeName) -> &'a [NodeId] {
    map.get(&node)
        .and_then(|by_name| by_name.get(name))
        .map(EnumerableSet::as_slice)
        .unwrap_or(&[])
}

impl EdgeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an edge's active flag, creating the row on first assertion.
    ///
    /// Returns whether the flag changed. Deactivating an unknown edge is a
    /// no-op and creates no row.
    pub fn set_active(&mut self, edge: &Edge, active: bool) -> bool {
        let current = self.edges.get(edge).copied();
        match (current, active) {
            (Some(true), true) | (Some(false), false) | (None, false) => false,
            (_, true) => {
                self.edges.insert(edge.clone(), true);
                link(&mut self.outgoing, edge.source, &edge.name, edge.target);
                link(&mut self.incoming, edge.target, &edge.name, edge.source);
                true
            }
            (Some(true), false) => {
                self.edges.insert(edge.clone(), false);
                unlink(&mut self.outgoing, edge.source, &edge.name, edge.target);
                unlink(&mut self.incoming, edge.target, &edge.name, edge.source);
                true
            }
        }
    }

    pub fn is_active(&self, edge: &Edge) -> bool {
        self.edges.get(edge).copied().unwrap_or(false)
    }

    /// Active targets of `node`'s outgoing edges named `name`.
    pub fn outgoing(&self, node: NodeId, name: &EdgeName) -> &[NodeId] {
        neighbours(&self.outgoing, node, name)
    }

    /// Active sources of `node`'s incoming edges named `name`.
    pub fn incoming(&self, node: NodeId, name: &EdgeName) -> &[NodeId] {
        neighbours(&self.incoming, node, name)
    }

    /// All active edges leaving `node`, ordered by name then enumeration.
    pub fn active_outgoing(&self, node: NodeId) -> Vec<Edge> {
        self.outgoing
            .get(&node)
            .into_iter()
            .flat_map(|by_name| by_name.iter())
            .flat_map(|(name, targets)| {
                targets
                    .iter()
                    .map(move |&target| Edge::new(node, target, name.clone()))
            })
            .collect()
    }

    /// All active edges arriving at `node`, ordered by name then enumeration.
    pub fn active_incoming(&self, node: NodeId) -> Vec<Edge> {
        self.incoming
            .get(&node)
            .into_iter()
            .flat_map(|by_name| by_name.iter())
            .flat_map(|(name, sources)| {
                sources
                    .iter()
                    .map(move |&source| Edge::new(source, node, name.clone()))
            })
            .collect()
    }

    /// Deactivate every active edge with `node` as an endpoint.
    ///
    /// Returns the deactivated edges, outgoing first.
    pub fn deactivate_touching(&mut self, node: NodeId) -> Vec<Edge> {
        let mut touched = self.active_outgoing(node);
        for edge in self.active_incoming(node) {
            // Self-loops already appear in the outgoing list.
            if edge.source != node {
                touched.push(edge);
            }
        }
        for edge in &touched {
            self.set_active(edge, false);
        }
        touched
    }

    /// Number of edge rows, active or not.
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn active_len(&self) -> usize {
        self.edges.values().filter(|active| **active).count()
    }
}
