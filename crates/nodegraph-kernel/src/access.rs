//! Access control handlers: role assignment, delegation, and the
//! per-node permissions bypass.

use nodegraph_core::{Address, CallContext, NodeId, Record, Role};
use nodegraph_perms::delegation_edge;

use crate::engine::{Engine, Outcome, Result};

impl Engine {
    pub(crate) fn grant_role(
        &mut self,
        ctx: &CallContext,
        node: NodeId,
        role: Role,
        account: Address,
    ) -> Result<Outcome> {
        self.registry.live(node)?;
        self.require_role(node, Role::Admin, &ctx.caller)?;
        let settlement = self.plan_value(ctx, &[])?;

        let mut records = Vec::new();
        if self.perms.roles_mut().grant(node, role, account) {
            records.push(Record::RoleGranted {
                node,
                role,
                account,
                sender: ctx.caller,
            });
        }
        self.economics.settle(settlement, &mut records);
        Ok(Outcome::with_records(records))
    }

    pub(crate) fn revoke_role(
        &mut self,
        ctx: &CallContext,
        node: NodeId,
        role: Role,
        account: Address,
    ) -> Result<Outcome> {
        self.registry.live(node)?;
        self.require_role(node, Role::Admin, &ctx.caller)?;
        let settlement = self.plan_value(ctx, &[])?;

        let mut records = Vec::new();
        if self.perms.roles_mut().revoke(node, role, account) {
            records.push(Record::RoleRevoked {
                node,
                role,
                account,
                sender: ctx.caller,
            });
        }
        self.economics.settle(settlement, &mut records);
        Ok(Outcome::with_records(records))
    }

    /// Drop a role the caller holds directly. Roles held only through
    /// delegation cannot be renounced here.
    pub(crate) fn renounce_role(&mut self, ctx: &CallContext, node: NodeId, role: Role) -> Result<Outcome> {
        self.registry.live(node)?;
        let settlement = self.plan_value(ctx, &[])?;

        let mut records = Vec::new();
        if self.perms.roles_mut().revoke(node, role, ctx.caller) {
            records.push(Record::RoleRevoked {
                node,
                role,
                account: ctx.caller,
                sender: ctx.caller,
            });
        }
        self.economics.settle(settlement, &mut records);
        Ok(Outcome::with_records(records))
    }

    /// Resolve `source`'s roles through `target`'s holders.
    pub(crate) fn delegate_permissions(
        &mut self,
        ctx: &CallContext,
        source: NodeId,
        target: NodeId,
    ) -> Result<Outcome> {
        self.registry.live(source)?;
        self.registry.live(target)?;
        self.require_role(source, Role::Admin, &ctx.caller)?;
        self.perms.check_delegate(&self.edges, source, target)?;
        let settlement = self.plan_value(ctx, &[])?;

        let mut records = Vec::new();
        if self.edges.set_active(&delegation_edge(source, target), true) {
            records.push(Record::PermissionsDelegated { source, target });
        }
        self.economics.settle(settlement, &mut records);
        Ok(Outcome::with_records(records))
    }

    /// Undo a delegation. The target may already be burnt; burning it
    /// would have removed the edge anyway.
    pub(crate) fn renounce_delegate_permissions(
        &mut self,
        ctx: &CallContext,
        source: NodeId,
        target: NodeId,
    ) -> Result<Outcome> {
        self.registry.live(source)?;
        self.registry.get(target)?;
        self.require_role(source, Role::Admin, &ctx.caller)?;
        let settlement = self.plan_value(ctx, &[])?;

        let mut records = Vec::new();
        if self.perms.renounce_delegation(&mut self.edges, source, target) {
            records.push(Record::DelegationRenounced { source, target });
        }
        self.economics.settle(settlement, &mut records);
        Ok(Outcome::with_records(records))
    }

    pub(crate) fn set_permissions_bypass(
        &mut self,
        ctx: &CallContext,
        node: NodeId,
        enabled: bool,
    ) -> Result<Outcome> {
        self.registry.live(node)?;
        self.require_role(node, Role::Admin, &ctx.caller)?;
        let settlement = self.plan_value(ctx, &[])?;

        self.registry.set_permissions_bypass(node, enabled);
        let mut records = vec![Record::PermissionsBypassSet { node, enabled }];
        self.economics.settle(settlement, &mut records);
        Ok(Outcome::with_records(records))
    }
}
