//! The engine: a deterministic state machine over one call at a time.
//!
//! Every handler runs in two phases. The check phase reads committed
//! state and computes everything the call will change (edge toggles,
//! balance credits) without writing. The commit phase then applies that
//! plan and cannot fail. A rejected call therefore leaves the engine
//! exactly as it was.

use nodegraph_core::{
    Address, Amount, Call, CallContext, EdgeIndex, EdgeName, NodeId, Record, Role, Royalty,
};
use nodegraph_perms::PermissionState;

use crate::config::ProtocolParams;
use crate::economics::{Charge, Economics, ProtocolConfig, Settlement};
use crate::error::EngineError;
use crate::registry::{NodeRecord, Registry};
use crate::revisions::{Revision, RevisionLedger};

pub type Result<T> = std::result::Result<T, EngineError>;

/// What an accepted call produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// The node a mint created.
    pub node: Option<NodeId>,
    /// Emitted records, in order.
    pub records: Vec<Record>,
    /// Value the host must pay out for a withdrawal.
    pub withdrawal: Option<(Address, Amount)>,
}

impl Outcome {
    pub(crate) fn with_records(records: Vec<Record>) -> Self {
        Self {
            records,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Engine {
    pub(crate) registry: Registry,
    pub(crate) revisions: RevisionLedger,
    pub(crate) edges: EdgeIndex,
    pub(crate) perms: PermissionState,
    pub(crate) economics: Economics,
}

impl Engine {
    pub fn new(params: ProtocolParams) -> Self {
        Self {
            economics: Economics::new(ProtocolConfig::from(params)),
            ..Self::default()
        }
    }

    /// Apply one call. On error, state is unchanged.
    pub fn execute(&mut self, ctx: CallContext, call: &Call) -> Result<Outcome> {
        let result = match call {
            Call::Mint {
                label,
                hash,
                incoming,
                outgoing,
            } => self.mint(&ctx, label, hash, incoming, outgoing),
            Call::Merge {
                node,
                hash,
                incoming,
                outgoing,
            } => self.merge(&ctx, *node, hash, incoming, outgoing),
            Call::Revise { node, hash } => self.revise(&ctx, *node, hash),
            Call::Burn { node } => self.burn(&ctx, *node),
            Call::Transfer { node, to } => self.transfer(&ctx, *node, *to),
            Call::GrantRole {
                node,
                role,
                account,
            } => self.grant_role(&ctx, *node, *role, *account),
            Call::RevokeRole {
                node,
                role,
                account,
            } => self.revoke_role(&ctx, *node, *role, *account),
            Call::RenounceRole { node, role } => self.renounce_role(&ctx, *node, *role),
            Call::DelegatePermissions { source, target } => {
                self.delegate_permissions(&ctx, *source, *target)
            }
            Call::RenounceDelegatePermissions { source, target } => {
                self.renounce_delegate_permissions(&ctx, *source, *target)
            }
            Call::SetConnectionFee { node, amount } => {
                self.set_connection_fee(&ctx, *node, *amount)
            }
            Call::SetPermissionsBypass { node, enabled } => {
                self.set_permissions_bypass(&ctx, *node, *enabled)
            }
            Call::SetProtocolMintFee { amount } => self.set_protocol_mint_fee(&ctx, *amount),
            Call::SetDefaultConnectionFee { amount } => {
                self.set_default_connection_fee(&ctx, *amount)
            }
            Call::SetDefaultRoyalty { royalty } => self.set_default_royalty(&ctx, *royalty),
            Call::SetTokenRoyalty { node, royalty } => {
                self.set_token_royalty(&ctx, *node, *royalty)
            }
            Call::DepositProtocolBalance => self.deposit_protocol_balance(&ctx),
            Call::Withdraw => self.withdraw(&ctx),
        };

        match &result {
            Ok(outcome) => tracing::debug!(
                call = call.name(),
                caller = %ctx.caller,
                height = ctx.height,
                records = outcome.records.len(),
                "call applied"
            ),
            Err(err) => tracing::debug!(
                call = call.name(),
                caller = %ctx.caller,
                kind = ?err.kind(),
                error = %err,
                "call rejected"
            ),
        }
        result
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Shared checks
    // ─────────────────────────────────────────────────────────────────────────

    /// Fail unless `caller` holds `role` or better on `node`.
    pub(crate) fn require_role(&self, node: NodeId, role: Role, caller: &Address) -> Result<()> {
        Ok(self.perms.require(&self.edges, node, role, caller)?)
    }

    /// Plan the attached value against `charges`, excess to the steward.
    pub(crate) fn plan_value(&self, ctx: &CallContext, charges: &[Charge]) -> Result<Settlement> {
        self.economics
            .plan(self.economics.steward(), ctx.value, charges)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Identity & labels
    // ─────────────────────────────────────────────────────────────────────────

    pub fn exists(&self, node: NodeId) -> bool {
        self.registry.exists(node)
    }

    pub fn node(&self, node: NodeId) -> Result<&NodeRecord> {
        self.registry.get(node)
    }

    pub fn node_count(&self) -> usize {
        self.registry.node_count()
    }

    pub fn label_for(&self, node: NodeId) -> Result<&str> {
        Ok(self.registry.get(node)?.label.as_str())
    }

    pub fn node_count_for_label(&self, label: &str) -> usize {
        self.registry.node_count_for_label(label)
    }

    pub fn node_for_label_at(&self, label: &str, index: usize) -> Result<NodeId> {
        self.registry.node_for_label_at(label, index)
    }

    pub fn owner_of(&self, node: NodeId) -> Result<Address> {
        Ok(self.registry.get(node)?.owner)
    }

    pub fn creator_of(&self, node: NodeId) -> Result<Address> {
        Ok(self.registry.get(node)?.creator)
    }

    pub fn is_burnt(&self, node: NodeId) -> Result<bool> {
        Ok(self.registry.get(node)?.burnt)
    }

    pub fn permissions_bypass(&self, node: NodeId) -> Result<bool> {
        Ok(self.registry.get(node)?.permissions_bypass)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Edges
    // ─────────────────────────────────────────────────────────────────────────

    /// Active targets of `node`'s edges named `name`.
    pub fn connected_nodes(&self, node: NodeId, name: &str) -> Result<&[NodeId]> {
        self.registry.get(node)?;
        Ok(match EdgeName::try_from(name.to_string()) {
            Ok(name) => self.edges.outgoing(node, &name),
            Err(_) => &[],
        })
    }

    pub fn connected_node_count(&self, node: NodeId, name: &str) -> Result<usize> {
        Ok(self.connected_nodes(node, name)?.len())
    }

    pub fn connected_node_at(&self, node: NodeId, name: &str, index: usize) -> Result<NodeId> {
        at_index(self.connected_nodes(node, name)?, index)
    }

    /// Active sources of edges named `name` into `node`.
    pub fn backlinked_nodes(&self, node: NodeId, name: &str) -> Result<&[NodeId]> {
        self.registry.get(node)?;
        Ok(match EdgeName::try_from(name.to_string()) {
            Ok(name) => self.edges.incoming(node, &name),
            Err(_) => &[],
        })
    }

    pub fn backlinked_node_count(&self, node: NodeId, name: &str) -> Result<usize> {
        Ok(self.backlinked_nodes(node, name)?.len())
    }

    pub fn backlinked_node_at(&self, node: NodeId, name: &str, index: usize) -> Result<NodeId> {
        at_index(self.backlinked_nodes(node, name)?, index)
    }

    pub fn edges(&self) -> &EdgeIndex {
        &self.edges
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Roles & delegation
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether `account` holds `role` on `node`, directly or by delegation.
    pub fn has_role(&self, node: NodeId, role: Role, account: &Address) -> Result<bool> {
        self.registry.get(node)?;
        Ok(self.perms.has_role(&self.edges, node, role, account)?)
    }

    pub fn role_member_count(&self, node: NodeId, role: Role) -> usize {
        self.perms.roles().member_count(node, role)
    }

    pub fn role_member(&self, node: NodeId, role: Role, index: usize) -> Result<Address> {
        at_index(self.perms.roles().members(node, role), index)
    }

    pub fn role_members(&self, node: NodeId, role: Role) -> &[Address] {
        self.perms.roles().members(node, role)
    }

    pub fn is_delegating(&self, source: NodeId, target: NodeId) -> bool {
        nodegraph_perms::is_delegating(&self.edges, source, target)
    }

    pub fn delegates_of(&self, node: NodeId) -> &[NodeId] {
        nodegraph_perms::delegates_of(&self.edges, node)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Revisions
    // ─────────────────────────────────────────────────────────────────────────

    pub fn revision_count(&self, node: NodeId) -> Result<usize> {
        self.registry.get(node)?;
        Ok(self.revisions.count(node))
    }

    pub fn revision(&self, node: NodeId, index: usize) -> Result<&Revision> {
        self.registry.get(node)?;
        self.revisions.get(node, index)
    }

    pub fn current_revision(&self, node: NodeId) -> Result<Option<&Revision>> {
        self.registry.get(node)?;
        Ok(self.revisions.current(node))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Economics
    // ─────────────────────────────────────────────────────────────────────────

    pub fn protocol_steward(&self) -> Option<Address> {
        self.economics.steward()
    }

    pub fn protocol_mint_fee(&self) -> Amount {
        self.economics.protocol().protocol_mint_fee
    }

    pub fn default_connection_fee(&self) -> Amount {
        self.economics.protocol().default_connection_fee
    }

    pub fn default_royalty(&self) -> Option<Royalty> {
        self.economics.protocol().default_royalty
    }

    /// The fee charged for connecting into `node`.
    pub fn connection_fee(&self, node: NodeId) -> Result<Amount> {
        self.registry.get(node)?;
        Ok(self.economics.connection_fee(node))
    }

    pub fn royalty_info(&self, node: NodeId, sale_price: Amount) -> Result<(Address, Amount)> {
        self.registry.get(node)?;
        Ok(self.economics.royalty_info(node, sale_price))
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.economics.balance_of(account)
    }

    /// Sum of all withdrawable balances.
    pub fn total_balance(&self) -> Amount {
        self.economics.total_balance()
    }
}

fn at_index<T: Copy>(items: &[T], index: usize) -> Result<T> {
    items
        .get(index)
        .copied()
        .ok_or(EngineError::IndexOutOfBounds {
            index,
            len: items.len(),
        })
}
