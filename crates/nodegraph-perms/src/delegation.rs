//! The delegation subgraph.
//!
//! Delegation edges live in the shared [`EdgeIndex`] under the reserved
//! `_delegate` name. A source defers role resolution to each of its active
//! targets. The graph stays a forest of depth-1 stars: a hub never
//! delegates onward and a delegating node is never a hub.

use nodegraph_core::{Edge, EdgeIndex, EdgeName, NodeId, SystemEdge};

use crate::error::{PermsError, Result};

/// Hops `has_role` will follow before declaring the graph corrupt.
///
/// Valid state needs one. The extra hop turns a violated invariant into an
/// error instead of a wrong answer.
pub const MAX_DELEGATION_HOPS: usize = 2;

/// The reserved edge name delegation is stored under.
pub fn delegation_name() -> EdgeName {
    EdgeName::system(SystemEdge::Delegation)
}

/// The delegation edge from `source` to `target`.
pub fn delegation_edge(source: NodeId, target: NodeId) -> Edge {
    Edge::new(source, target, delegation_name())
}

/// Nodes `node` currently defers to.
pub fn delegates_of(edges: &EdgeIndex, node: NodeId) -> &[NodeId] {
    edges.outgoing(node, &delegation_name())
}

/// Nodes currently deferring to `node`.
pub fn delegators_of(edges: &EdgeIndex, node: NodeId) -> &[NodeId] {
    edges.incoming(node, &delegation_name())
}

pub fn is_delegating(edges: &EdgeIndex, source: NodeId, target: NodeId) -> bool {
    edges.is_active(&delegation_edge(source, target))
}

/// Check that adding `source -> target` keeps every chain at one hop.
///
/// Re-asserting an existing delegation passes.
pub fn check_delegation(edges: &EdgeIndex, source: NodeId, target: NodeId) -> Result<()> {
    let recursive = || PermsError::RecursiveDelegation {
        delegator: source,
        target,
    };

    if source == target {
        return Err(recursive());
    }
    // The target would become the middle of a two-hop chain.
    if !delegates_of(edges, target).is_empty() {
        return Err(recursive());
    }
    // The source is already a hub.
    if !delegators_of(edges, source).is_empty() {
        return Err(recursive());
    }
    Ok(())
}

/// Longest delegation chain starting anywhere in `nodes`.
///
/// Used by tests and consistency checks. Stops counting at
/// `MAX_DELEGATION_HOPS + 1`.
pub fn max_depth(edges: &EdgeIndex, nodes: impl IntoIterator<Item = NodeId>) -> usize {
    let mut deepest = 0;
    for start in nodes {
        let mut frontier = vec![start];
        let mut depth = 0;
        while depth <= MAX_DELEGATION_HOPS {
            let next: Vec<NodeId> = frontier
                .iter()
                .flat_map(|node| delegates_of(edges, *node).iter().copied())
                .collect();
            if next.is_empty() {
                break;
            }
            depth += 1;
            frontier = next;
        }
        deepest = deepest.max(depth);
    }
    deepest
}
