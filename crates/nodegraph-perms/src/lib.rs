//! # Nodegraph Kernel Permissions
//!
//! Per-node roles and the permission delegation graph.
//!
//! ## Overview
//!
//! Every node carries two enumerable role sets, ADMIN and EDITOR. A node
//! may also delegate: it defers role resolution to one or more hub nodes
//! through reserved `_delegate` edges. Delegation never chains, so a
//! resolution looks at the node itself and then at its hubs.
//!
//! ## Key Concepts
//!
//! - **RoleRegistry**: direct assignments, enumerable per (node, role)
//! - **Delegation**: structural checks that keep the graph at depth one
//! - **PermissionState**: bounded resolution of `has_role` over both
//!
//! The authority to grant, revoke or delegate is checked by the engine;
//! this crate answers "who holds what" and "is this delegation allowed".

pub mod delegation;
pub mod error;
pub mod roles;
pub mod state;

pub use delegation::{
    check_delegation, delegates_of, delegation_edge, delegation_name, delegators_of,
    is_delegating, max_depth, MAX_DELEGATION_HOPS,
};
pub use error::{PermsError, Result};
pub use roles::RoleRegistry;
pub use state::PermissionState;
