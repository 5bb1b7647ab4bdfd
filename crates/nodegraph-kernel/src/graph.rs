//! Graph edits: the edge snapshot planner shared by mint and merge, and
//! the merge handler itself.
//!
//! The lists passed to mint and merge describe the node's full set of
//! user edges. Any active user edge touching the node that the lists do
//! not mention is deactivated; system edges are never touched here.

use std::collections::BTreeMap;

use nodegraph_core::{
    Address, CallContext, ContentHash, Edge, EdgeInput, EdgeName, NodeId, Record, Role,
    SystemEdge,
};
use nodegraph_perms::PermsError;

use crate::economics::Charge;
use crate::engine::{Engine, Outcome, Result};
use crate::error::EngineError;

/// Which end of the edge the edited node sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Source,
    Target,
}

/// Validated edge toggles and the connection fees they incur.
#[derive(Debug, Default)]
pub(crate) struct EdgePlan {
    changes: Vec<(Edge, bool)>,
    pub(crate) charges: Vec<Charge>,
}

impl EdgePlan {
    pub(crate) fn len(&self) -> usize {
        self.changes.len()
    }
}

impl Engine {
    /// Diff the desired edge snapshot for `node` against the index.
    ///
    /// `node` need not exist yet: mint plans edges for the id it is about
    /// to assign, and self references resolve to it.
    pub(crate) fn plan_edges(
        &self,
        caller: &Address,
        node: NodeId,
        incoming: &[EdgeInput],
        outgoing: &[EdgeInput],
    ) -> Result<EdgePlan> {
        let mut desired: BTreeMap<Edge, bool> = BTreeMap::new();
        for edge in self
            .edges
            .active_outgoing(node)
            .into_iter()
            .chain(self.edges.active_incoming(node))
        {
            if !edge.name.is_system() {
                desired.insert(edge, false);
            }
        }
        // Later entries win, so a repeated edge takes its last state.
        for input in outgoing {
            desired.insert(self.resolve_input(node, input, Side::Source)?, input.active);
        }
        for input in incoming {
            desired.insert(self.resolve_input(node, input, Side::Target)?, input.active);
        }

        let mut plan = EdgePlan::default();
        for (edge, active) in desired {
            if self.edges.is_active(&edge) == active {
                continue;
            }
            if active {
                if let Some(charge) = self.connection_gate(caller, node, &edge)? {
                    plan.charges.push(charge);
                }
            }
            plan.changes.push((edge, active));
        }
        Ok(plan)
    }

    fn resolve_input(&self, node: NodeId, input: &EdgeInput, side: Side) -> Result<Edge> {
        if input.node != node && !self.registry.exists(input.node) {
            return Err(EngineError::NodeNonexistent(input.node));
        }
        let name = EdgeName::new(input.name.as_str())?;
        Ok(match side {
            Side::Source => Edge::new(node, input.node, name),
            Side::Target => Edge::new(input.node, node, name),
        })
    }

    /// Decide whether `caller` may activate `edge` while editing `node`.
    ///
    /// Connecting into another node is free for its owner and its editors,
    /// and for anyone when it has the bypass set. Otherwise it takes a
    /// non-zero connection fee, owed to the owner.
    fn connection_gate(
        &self,
        caller: &Address,
        node: NodeId,
        edge: &Edge,
    ) -> Result<Option<Charge>> {
        for endpoint in [edge.source, edge.target] {
            if endpoint != node && self.registry.get(endpoint)?.burnt {
                return Err(EngineError::NodeBurnt(endpoint));
            }
        }

        let target = edge.target;
        if target == node {
            return Ok(None);
        }
        let record = self.registry.get(target)?;
        if record.permissions_bypass
            || record.owner == *caller
            || self
                .perms
                .has_at_least(&self.edges, target, Role::Editor, caller)?
        {
            return Ok(None);
        }
        match self.economics.connection_fee(target) {
            0 => Err(PermsError::InsufficientPermissions {
                node: target,
                role: Role::Editor,
            }
            .into()),
            amount => Ok(Some(Charge {
                payee: record.owner,
                amount,
            })),
        }
    }

    /// Apply a plan, recording each toggle.
    pub(crate) fn apply_edges(&mut self, plan: EdgePlan, records: &mut Vec<Record>) {
        for (edge, active) in plan.changes {
            self.edges.set_active(&edge, active);
            records.push(edge_record(edge, active));
        }
    }

    /// New content for `node` plus a full snapshot of its user edges.
    pub(crate) fn merge(
        &mut self,
        ctx: &CallContext,
        node: NodeId,
        hash: &str,
        incoming: &[EdgeInput],
        outgoing: &[EdgeInput],
    ) -> Result<Outcome> {
        self.registry.live(node)?;
        self.require_role(node, Role::Editor, &ctx.caller)?;
        let hash = ContentHash::new(hash)?;
        let plan = self.plan_edges(&ctx.caller, node, incoming, outgoing)?;
        let settlement = self.plan_value(ctx, &plan.charges)?;

        tracing::trace!(node = %node, changes = plan.len(), "merging edge snapshot");
        let mut records = Vec::new();
        self.push_revision(node, hash, ctx.height, &mut records);
        self.apply_edges(plan, &mut records);
        self.economics.settle(settlement, &mut records);
        Ok(Outcome::with_records(records))
    }
}

/// The record for one toggle. Delegation edges report as delegation
/// changes rather than plain connections.
pub(crate) fn edge_record(edge: Edge, active: bool) -> Record {
    let Edge {
        source,
        target,
        name,
    } = edge;
    match (name.as_system(), active) {
        (Some(SystemEdge::Delegation), true) => Record::PermissionsDelegated { source, target },
        (Some(SystemEdge::Delegation), false) => Record::DelegationRenounced { source, target },
        (_, true) => Record::Connected {
            source,
            target,
            name,
        },
        (_, false) => Record::Disconnected {
            source,
            target,
            name,
        },
    }
}
