//! Enumerable role membership per (node, role).

use std::collections::HashMap;

use nodegraph_core::{Address, EnumerableSet, NodeId, Role};

/// Direct role assignments. Delegation is resolved elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleRegistry {
    members: HashMap<(NodeId, Role), EnumerableSet<Address>>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `account` to `role` on `node`. Returns `false` if already held.
    pub fn grant(&mut self, node: NodeId, role: Role, account: Address) -> bool {
        self.members
            .entry((node, role))
            .or_default()
            .insert(account)
    }

    /// Remove `account` from `role` on `node`. Returns `false` if not held.
    pub fn revoke(&mut self, node: NodeId, role: Role, account: Address) -> bool {
        let Some(set) = self.members.get_mut(&(node, role)) else {
            return false;
        };
        let removed = set.remove(&account);
        if set.is_empty() {
            self.members.remove(&(node, role));
        }
        removed
    }

    /// Whether `account` holds exactly `role` on `node`, ignoring delegation.
    pub fn holds(&self, node: NodeId, role: Role, account: &Address) -> bool {
        self.members
            .get(&(node, role))
            .is_some_and(|set| set.contains(account))
    }

    pub fn member_count(&self, node: NodeId, role: Role) -> usize {
        self.members.get(&(node, role)).map_or(0, EnumerableSet::len)
    }

    pub fn member(&self, node: NodeId, role: Role, index: usize) -> Option<Address> {
        self.members
            .get(&(node, role))
            .and_then(|set| set.at(index))
            .copied()
    }

    /// Direct holders of `role` on `node`, in enumeration order.
    pub fn members(&self, node: NodeId, role: Role) -> &[Address] {
        self.members
            .get(&(node, role))
            .map(EnumerableSet::as_slice)
            .unwrap_or(&[])
    }

    /// Drop every assignment on `node`, returning what was removed.
    pub fn clear_node(&mut self, node: NodeId) -> Vec<(Role, Address)> {
        let mut removed = Vec::new();
        for role in Role::ALL {
            if let Some(mut set) = self.members.remove(&(node, role)) {
                removed.extend(set.drain().into_iter().map(|account| (role, account)));
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const X: Address = Address::from_bytes([1; 20]);
    const Y: Address = Address::from_bytes([2; 20]);

    #[test]
    fn test_grant_revoke_enumerate() {
        let mut roles = RoleRegistry::new();
        let node = NodeId(4);

        assert!(roles.grant(node, Role::Editor, X));
        assert!(!roles.grant(node, Role::Editor, X));
        assert!(roles.grant(node, Role::Editor, Y));
        assert_eq!(roles.member_count(node, Role::Editor), 2);
        assert_eq!(roles.member(node, Role::Editor, 1), Some(Y));
        assert_eq!(roles.member(node, Role::Editor, 2), None);

        assert!(roles.revoke(node, Role::Editor, X));
        assert!(!roles.revoke(node, Role::Editor, X));
        assert_eq!(roles.members(node, Role::Editor), &[Y]);
        assert!(!roles.holds(node, Role::Admin, &Y));
    }

    #[test]
    fn test_clear_node_only_touches_that_node() {
        let mut roles = RoleRegistry::new();
        roles.grant(NodeId(1), Role::Admin, X);
        roles.grant(NodeId(1), Role::Editor, Y);
        roles.grant(NodeId(2), Role::Admin, X);

        let removed = roles.clear_node(NodeId(1));
        assert_eq!(removed, vec![(Role::Admin, X), (Role::Editor, Y)]);
        assert_eq!(roles.member_count(NodeId(1), Role::Admin), 0);
        assert!(roles.holds(NodeId(2), Role::Admin, &X));
    }
}
