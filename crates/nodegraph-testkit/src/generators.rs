//! Proptest generators for property-based testing.
//!
//! Calls are drawn from small id and account spaces so that random
//! sequences hit existing nodes, collide on edges, and trip permission
//! checks often enough to be interesting.

use proptest::prelude::*;

use nodegraph_core::{Amount, Call, EdgeInput, NodeId, Role, Royalty};

use crate::fixtures::{parties, Party};

/// Number of distinct callers a generated script uses.
pub const PARTY_COUNT: usize = 4;

/// Node ids are drawn from `0..MAX_NODE`, so some reference nodes that
/// were never minted.
pub const MAX_NODE: u64 = 8;

pub fn node_id() -> impl Strategy<Value = NodeId> {
    (0..MAX_NODE).prop_map(NodeId)
}

pub fn party_index() -> impl Strategy<Value = usize> + Clone {
    0..PARTY_COUNT
}

pub fn role() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Admin), Just(Role::Editor)]
}

/// Labels, including the occasional invalid one.
pub fn label() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => prop_oneof![Just("topic"), Just("document"), Just("subgraph")].prop_map(String::from),
        1 => prop_oneof![Just(""), Just("_reserved")].prop_map(String::from),
    ]
}

/// Edge names, including reserved ones.
pub fn edge_name() -> impl Strategy<Value = String> {
    prop_oneof![
        6 => prop_oneof![Just("cites"), Just("answers"), Just("parent")].prop_map(String::from),
        1 => prop_oneof![Just("_delegate"), Just("")].prop_map(String::from),
    ]
}

pub fn edge_input() -> impl Strategy<Value = EdgeInput> {
    (node_id(), edge_name(), prop::bool::weighted(0.8)).prop_map(|(node, name, active)| {
        EdgeInput { node, name, active }
    })
}

pub fn edge_list() -> impl Strategy<Value = Vec<EdgeInput>> {
    prop::collection::vec(edge_input(), 0..4)
}

pub fn amount() -> impl Strategy<Value = Amount> {
    prop_oneof![3 => Just(0 as Amount), 1 => 1 as Amount..50]
}

pub fn royalty() -> impl Strategy<Value = Option<Royalty>> {
    let parties = parties(PARTY_COUNT);
    prop::option::of((party_index(), 0u16..=10_500)).prop_map(move |choice| {
        choice.map(|(party, bps)| Royalty::new(parties[party].address(), bps))
    })
}

/// Any call, weighted towards graph edits.
pub fn call() -> impl Strategy<Value = Call> {
    let accounts: Vec<Party> = parties(PARTY_COUNT);
    let account = party_index().prop_map(move |i| accounts[i].address());

    prop_oneof![
        4 => (label(), "[a-z0-9]{0,4}", edge_list(), edge_list()).prop_map(
            |(label, hash, incoming, outgoing)| Call::Mint {
                label,
                hash,
                incoming,
                outgoing,
            }
        ),
        4 => (node_id(), "[a-z0-9]{0,4}", edge_list(), edge_list()).prop_map(
            |(node, hash, incoming, outgoing)| Call::Merge {
                node,
                hash,
                incoming,
                outgoing,
            }
        ),
        2 => (node_id(), "[a-z0-9]{1,4}").prop_map(|(node, hash)| Call::Revise { node, hash }),
        1 => node_id().prop_map(|node| Call::Burn { node }),
        1 => (node_id(), account.clone()).prop_map(|(node, to)| Call::Transfer { node, to }),
        2 => (node_id(), role(), account.clone()).prop_map(|(node, role, account)| {
            Call::GrantRole {
                node,
                role,
                account,
            }
        }),
        1 => (node_id(), role(), account).prop_map(|(node, role, account)| Call::RevokeRole {
            node,
            role,
            account,
        }),
        1 => (node_id(), role()).prop_map(|(node, role)| Call::RenounceRole { node, role }),
        2 => (node_id(), node_id())
            .prop_map(|(source, target)| Call::DelegatePermissions { source, target }),
        1 => (node_id(), node_id())
            .prop_map(|(source, target)| Call::RenounceDelegatePermissions { source, target }),
        1 => (node_id(), amount()).prop_map(|(node, amount)| Call::SetConnectionFee { node, amount }),
        1 => (node_id(), any::<bool>())
            .prop_map(|(node, enabled)| Call::SetPermissionsBypass { node, enabled }),
        1 => amount().prop_map(|amount| Call::SetProtocolMintFee { amount }),
        1 => amount().prop_map(|amount| Call::SetDefaultConnectionFee { amount }),
        1 => royalty().prop_map(|royalty| Call::SetDefaultRoyalty { royalty }),
        1 => (node_id(), royalty()).prop_map(|(node, royalty)| Call::SetTokenRoyalty { node, royalty }),
        1 => Just(Call::DepositProtocolBalance),
        1 => Just(Call::Withdraw),
    ]
}

/// One step of a generated script.
#[derive(Debug, Clone)]
pub struct Step {
    pub party: usize,
    pub value: Amount,
    pub call: Call,
}

pub fn step() -> impl Strategy<Value = Step> {
    (party_index(), amount(), call()).prop_map(|(party, value, call)| Step { party, value, call })
}

pub fn script(max_len: usize) -> impl Strategy<Value = Vec<Step>> {
    prop::collection::vec(step(), 1..=max_len)
}
