//! Permission state: direct roles plus delegated resolution.
//!
//! [`PermissionState`] owns the role registry. The delegation edges it
//! resolves through are borrowed from the engine's edge index, so a
//! renounced delegation is reflected by the very next query.

use nodegraph_core::{Address, EdgeIndex, NodeId, Role};

use crate::delegation::{self, MAX_DELEGATION_HOPS};
use crate::error::{PermsError, Result};
use crate::roles::RoleRegistry;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionState {
    roles: RoleRegistry,
}

impl PermissionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    pub fn roles_mut(&mut self) -> &mut RoleRegistry {
        &mut self.roles
    }

    /// Whether `account` holds `role` on `node`, directly or through the
    /// node's delegation targets.
    pub fn has_role(
        &self,
        edges: &EdgeIndex,
        node: NodeId,
        role: Role,
        account: &Address,
    ) -> Result<bool> {
        self.resolve(edges, node, account, |held| held == role)
    }

    /// Whether `account` holds `required` or any role that satisfies it.
    pub fn has_at_least(
        &self,
        edges: &EdgeIndex,
        node: NodeId,
        required: Role,
        account: &Address,
    ) -> Result<bool> {
        self.resolve(edges, node, account, |held| held.satisfies(required))
    }

    /// Fail with `InsufficientPermissions` unless `has_at_least` holds.
    pub fn require(
        &self,
        edges: &EdgeIndex,
        node: NodeId,
        required: Role,
        account: &Address,
    ) -> Result<()> {
        if self.has_at_least(edges, node, required, account)? {
            Ok(())
        } else {
            Err(PermsError::InsufficientPermissions {
                node,
                role: required,
            })
        }
    }

    /// Breadth-first walk over delegation targets, one hop per round.
    fn resolve(
        &self,
        edges: &EdgeIndex,
        node: NodeId,
        account: &Address,
        accepts: impl Fn(Role) -> bool,
    ) -> Result<bool> {
        let holds_here = |n: NodeId| {
            Role::ALL
                .into_iter()
                .filter(|held| accepts(*held))
                .any(|held| self.roles.holds(n, held, account))
        };

        let mut frontier = vec![node];
        for _ in 0..=MAX_DELEGATION_HOPS {
            if frontier.iter().any(|n| holds_here(*n)) {
                return Ok(true);
            }
            frontier = frontier
                .iter()
                .flat_map(|n| delegation::delegates_of(edges, *n).iter().copied())
                .collect();
            if frontier.is_empty() {
                return Ok(false);
            }
        }
        Err(PermsError::DelegationDepthExceeded { node })
    }

    /// Validate a new delegation without applying it.
    pub fn check_delegate(
        &self,
        edges: &EdgeIndex,
        source: NodeId,
        target: NodeId,
    ) -> Result<()> {
        delegation::check_delegation(edges, source, target)
    }

    /// Add `source -> target`. Returns `false` if it was already active.
    pub fn delegate(
        &self,
        edges: &mut EdgeIndex,
        source: NodeId,
        target: NodeId,
    ) -> Result<bool> {
        self.check_delegate(edges, source, target)?;
        Ok(edges.set_active(&delegation::delegation_edge(source, target), true))
    }

    /// Remove `source -> target`. Returns `false` if it was not active.
    pub fn renounce_delegation(
        &self,
        edges: &mut EdgeIndex,
        source: NodeId,
        target: NodeId,
    ) -> bool {
        edges.set_active(&delegation::delegation_edge(source, target), false)
    }
}
