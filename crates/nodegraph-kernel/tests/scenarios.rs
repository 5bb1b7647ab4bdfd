//! End-to-end engine behaviour: documented scenarios and properties over
//! random call scripts.

use nodegraph_kernel::core::{Amount, Call, EdgeInput, NodeId, Role, Royalty};
use nodegraph_kernel::perms::max_depth;
use nodegraph_kernel::{EngineError, ErrorKind, ProtocolParams};
use nodegraph_testkit::generators::script;
use nodegraph_testkit::TestFixture;
use proptest::prelude::*;

const X: usize = 0;
const Y: usize = 1;
const Z: usize = 2;

fn kind<T: std::fmt::Debug>(result: Result<T, EngineError>) -> ErrorKind {
    result.unwrap_err().kind()
}

#[test]
fn test_invalid_labels() {
    let mut fixture = TestFixture::new();
    assert_eq!(
        kind(fixture.call(X, Call::mint("", "h"))),
        ErrorKind::InvalidString
    );
    assert_eq!(
        kind(fixture.call(X, Call::mint("_topic", "h"))),
        ErrorKind::ReservedString
    );
    assert_eq!(
        kind(fixture.call(X, Call::mint("topic", ""))),
        ErrorKind::InvalidString
    );
    assert_eq!(fixture.engine.node_count(), 0);
    assert_eq!(fixture.engine.protocol_steward(), None);
}

#[test]
fn test_revision_history() {
    let mut fixture = TestFixture::new();
    let id = fixture.mint(X, "document");
    assert_eq!(fixture.engine.revision_count(id).unwrap(), 1);

    fixture
        .call(
            X,
            Call::Revise {
                node: id,
                hash: "456".into(),
            },
        )
        .unwrap();
    assert_eq!(fixture.engine.revision_count(id).unwrap(), 2);
    let revision = fixture.engine.revision(id, 1).unwrap();
    assert_eq!(revision.hash.as_str(), "456");
    assert_eq!(revision.sequence, 1);
    assert_eq!(
        kind(fixture.engine.revision(id, 2)),
        ErrorKind::IndexOutOfBounds
    );
}

#[test]
fn test_merge_requires_editor() {
    let mut fixture = TestFixture::new();
    let s = fixture.mint(X, "subgraph");
    let t = fixture.mint(X, "topic");
    let merge = Call::merge(s, "h2", vec![], vec![EdgeInput::new(t, "DESCRIBES")]);

    assert_eq!(
        kind(fixture.call(Y, merge.clone())),
        ErrorKind::InsufficientPermissions
    );
    fixture.call(X, merge).unwrap();
    assert_eq!(
        fixture.engine.connected_nodes(s, "DESCRIBES").unwrap(),
        &[t]
    );
    assert_eq!(
        fixture.engine.backlinked_nodes(t, "DESCRIBES").unwrap(),
        &[s]
    );
}

#[test]
fn test_editor_lifecycle() {
    let mut fixture = TestFixture::new();
    let s = fixture.mint(X, "subgraph");
    let y = fixture.address(Y);
    let z = fixture.address(Z);

    fixture
        .call(
            X,
            Call::GrantRole {
                node: s,
                role: Role::Editor,
                account: y,
            },
        )
        .unwrap();
    fixture.call(Y, Call::merge(s, "h2", vec![], vec![])).unwrap();
    assert_eq!(
        kind(fixture.call(
            Y,
            Call::GrantRole {
                node: s,
                role: Role::Editor,
                account: z,
            },
        )),
        ErrorKind::InsufficientPermissions
    );

    fixture
        .call(
            Y,
            Call::RenounceRole {
                node: s,
                role: Role::Editor,
            },
        )
        .unwrap();
    assert!(!fixture.engine.has_role(s, Role::Editor, &y).unwrap());
    assert_eq!(fixture.engine.role_member_count(s, Role::Editor), 0);
}

#[test]
fn test_burn_retains_history_and_blocks_mutation() {
    let mut fixture = TestFixture::new();
    let a = fixture.mint(X, "topic");
    let b = fixture.mint(X, "document");
    let y = fixture.address(Y);
    let x = fixture.address(X);
    fixture
        .call(X, Call::merge(a, "h2", vec![], vec![EdgeInput::new(b, "cites")]))
        .unwrap();
    fixture
        .call(
            X,
            Call::GrantRole {
                node: a,
                role: Role::Editor,
                account: y,
            },
        )
        .unwrap();

    fixture.call(X, Call::Burn { node: a }).unwrap();

    assert!(fixture.engine.exists(a));
    assert_eq!(fixture.engine.revision_count(a).unwrap(), 2);
    assert_eq!(fixture.engine.backlinked_node_count(b, "cites").unwrap(), 0);
    for (account, role) in [(x, Role::Admin), (y, Role::Editor)] {
        assert!(!fixture.engine.has_role(a, role, &account).unwrap());
    }

    let attempts = [
        Call::merge(a, "h3", vec![], vec![]),
        Call::Revise {
            node: a,
            hash: "h3".into(),
        },
        Call::GrantRole {
            node: a,
            role: Role::Editor,
            account: y,
        },
    ];
    for call in attempts {
        assert_eq!(
            fixture.call(X, call),
            Err(EngineError::NodeBurnt(a))
        );
    }
    // Nor can live nodes connect into it.
    assert_eq!(
        fixture.call(X, Call::merge(b, "h2", vec![], vec![EdgeInput::new(a, "cites")])),
        Err(EngineError::NodeBurnt(a))
    );
}

#[test]
fn test_merge_is_idempotent_on_edges() {
    let mut fixture = TestFixture::new();
    let nodes = fixture.populate(4, 0);
    let edges: Vec<EdgeInput> = nodes[1..]
        .iter()
        .map(|node| EdgeInput::new(*node, "cites"))
        .collect();

    let first = fixture
        .call(X, Call::merge(nodes[0], "h1", vec![], edges.clone()))
        .unwrap();
    assert_eq!(first.records.len(), 1 + 3);

    let second = fixture
        .call(X, Call::merge(nodes[0], "h2", vec![], edges))
        .unwrap();
    // Only the revision; no edge toggles.
    assert_eq!(second.records.len(), 1);
    assert_eq!(
        fixture.engine.connected_node_count(nodes[0], "cites").unwrap(),
        3
    );
    assert_eq!(fixture.engine.revision_count(nodes[0]).unwrap(), 3);
}

#[test]
fn test_delegation_depth() {
    let mut fixture = TestFixture::new();
    let a = fixture.mint(X, "topic");
    let b = fixture.mint(X, "topic");
    let c = fixture.mint(X, "topic");

    fixture
        .call(X, Call::DelegatePermissions { source: a, target: b })
        .unwrap();
    assert_eq!(
        kind(fixture.call(X, Call::DelegatePermissions { source: b, target: c })),
        ErrorKind::RecursiveDelegation
    );
    assert_eq!(
        kind(fixture.call(X, Call::DelegatePermissions { source: c, target: a })),
        ErrorKind::RecursiveDelegation
    );
    assert_eq!(
        kind(fixture.call(X, Call::DelegatePermissions { source: a, target: a })),
        ErrorKind::RecursiveDelegation
    );
    // Fan-out from one source stays at depth 1.
    fixture
        .call(X, Call::DelegatePermissions { source: a, target: c })
        .unwrap();
    assert_eq!(fixture.engine.delegates_of(a), &[b, c]);
}

#[test]
fn test_delegated_role_reverts_on_renounce() {
    let mut fixture = TestFixture::new();
    let a = fixture.mint(X, "topic");
    let b = fixture.mint(Y, "topic");
    let y = fixture.address(Y);

    assert!(!fixture.engine.has_role(a, Role::Admin, &y).unwrap());
    fixture
        .call(X, Call::DelegatePermissions { source: a, target: b })
        .unwrap();
    assert!(fixture.engine.has_role(a, Role::Admin, &y).unwrap());
    // Delegated admins can act on the source.
    fixture.call(Y, Call::merge(a, "h2", vec![], vec![])).unwrap();

    fixture
        .call(
            X,
            Call::RenounceDelegatePermissions { source: a, target: b },
        )
        .unwrap();
    assert!(!fixture.engine.has_role(a, Role::Admin, &y).unwrap());
}

#[test]
fn test_paid_connection() {
    let mut fixture = TestFixture::new();
    let a = fixture.mint(X, "topic");
    let b = fixture.mint(Y, "topic");
    let x = fixture.address(X);
    let y = fixture.address(Y);

    let connect = Call::merge(a, "h2", vec![], vec![EdgeInput::new(b, "cites")]);
    assert_eq!(
        kind(fixture.call(X, connect.clone())),
        ErrorKind::InsufficientPermissions
    );

    fixture
        .call(Y, Call::SetConnectionFee { node: b, amount: 10 })
        .unwrap();
    assert_eq!(
        kind(fixture.call_with_value(X, connect.clone(), 9)),
        ErrorKind::InsufficientFunds
    );
    fixture.call_with_value(X, connect.clone(), 15).unwrap();
    assert_eq!(fixture.engine.balance_of(&y), 10);
    // X is the steward and receives the excess.
    assert_eq!(fixture.engine.balance_of(&x), 5);

    // Re-asserting an active edge is free.
    fixture.call(X, connect).unwrap();
    assert_eq!(fixture.engine.balance_of(&y), 10);

    let outcome = fixture.call(Y, Call::Withdraw).unwrap();
    assert_eq!(outcome.withdrawal, Some((y, 10)));
    assert_eq!(fixture.engine.balance_of(&y), 0);
}

#[test]
fn test_owner_connects_after_transfer() {
    let mut fixture = TestFixture::new();
    let _a = fixture.mint(X, "topic");
    let b = fixture.mint(X, "topic");
    let y = fixture.address(Y);
    fixture.call(X, Call::Transfer { node: b, to: y }).unwrap();
    assert!(!fixture.engine.has_role(b, Role::Editor, &y).unwrap());

    let c = fixture.mint(Y, "document");
    let connect = Call::merge(c, "h2", vec![], vec![EdgeInput::new(b, "cites")]);
    fixture.call(Y, connect).unwrap();
    assert_eq!(fixture.engine.connected_nodes(c, "cites").unwrap(), &[b]);

    // Roles stay with X, who can still price B; its owner is not charged.
    fixture
        .call(X, Call::SetConnectionFee { node: b, amount: 7 })
        .unwrap();
    let d = fixture.mint(Y, "document");
    let link = Call::merge(d, "h2", vec![], vec![EdgeInput::new(b, "cites")]);
    fixture.call(Y, link).unwrap();
    assert_eq!(fixture.engine.backlinked_node_count(b, "cites").unwrap(), 2);
    assert_eq!(fixture.engine.balance_of(&y), 0);
}

#[test]
fn test_bypass_connection_is_free() {
    let mut fixture = TestFixture::new();
    let a = fixture.mint(X, "topic");
    let b = fixture.mint(Y, "topic");
    fixture
        .call(Y, Call::SetPermissionsBypass { node: b, enabled: true })
        .unwrap();
    fixture
        .call(Y, Call::SetConnectionFee { node: b, amount: 10 })
        .unwrap();

    // X holds no role on B and attaches no value.
    let connect = Call::merge(a, "h2", vec![], vec![EdgeInput::new(b, "cites")]);
    fixture.call(X, connect).unwrap();
    assert_eq!(fixture.engine.backlinked_nodes(b, "cites").unwrap(), &[a]);
    assert_eq!(fixture.engine.balance_of(&fixture.address(Y)), 0);
}

#[test]
fn test_editor_connection_skips_fee() {
    let mut fixture = TestFixture::new();
    let a = fixture.mint(X, "topic");
    let b = fixture.mint(Y, "topic");
    let x = fixture.address(X);
    fixture
        .call(Y, Call::SetConnectionFee { node: b, amount: 10 })
        .unwrap();
    fixture
        .call(
            Y,
            Call::GrantRole {
                node: b,
                role: Role::Editor,
                account: x,
            },
        )
        .unwrap();

    let connect = Call::merge(a, "h2", vec![], vec![EdgeInput::new(b, "cites")]);
    fixture.call(X, connect).unwrap();
    assert_eq!(fixture.engine.connected_nodes(a, "cites").unwrap(), &[b]);
    assert_eq!(fixture.engine.balance_of(&fixture.address(Y)), 0);
}

#[test]
fn test_protocol_defaults() {
    let params = ProtocolParams {
        protocol_mint_fee: 3,
        default_connection_fee: 2,
        default_royalty: None,
    };
    let mut fixture = TestFixture::with_params(3, params);
    let x = fixture.address(X);

    // The establishing mint pays nothing.
    let a = fixture.mint(X, "topic");
    assert_eq!(fixture.engine.protocol_steward(), Some(x));
    assert_eq!(fixture.engine.connection_fee(a).unwrap(), 2);
    assert_eq!(
        kind(fixture.call(Y, Call::mint("topic", "h"))),
        ErrorKind::InsufficientFunds
    );

    let mint_and_connect = Call::Mint {
        label: "document".into(),
        hash: "h".into(),
        incoming: vec![],
        outgoing: vec![EdgeInput::new(a, "cites")],
    };
    fixture.call_with_value(Y, mint_and_connect, 5).unwrap();
    assert_eq!(fixture.engine.balance_of(&x), 5);

    assert_eq!(
        kind(fixture.call(Y, Call::SetDefaultConnectionFee { amount: 0 })),
        ErrorKind::OnlyProtocolSteward
    );
    fixture
        .call(
            X,
            Call::SetDefaultRoyalty {
                royalty: Some(Royalty::new(x, 500)),
            },
        )
        .unwrap();
    assert_eq!(fixture.engine.royalty_info(a, 200).unwrap(), (x, 10));
}

#[test]
fn test_label_enumeration() {
    let mut fixture = TestFixture::new();
    fixture.populate(5, 0);
    assert_eq!(fixture.engine.node_count_for_label("topic"), 3);
    assert_eq!(fixture.engine.node_count_for_label("document"), 2);
    assert_eq!(
        fixture.engine.node_for_label_at("document", 1).unwrap(),
        NodeId(3)
    );
    assert_eq!(
        kind(fixture.engine.label_for(NodeId(9))),
        ErrorKind::NodeNonexistent
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A rejected call leaves every part of the engine untouched.
    #[test]
    fn prop_failed_calls_change_nothing(steps in script(40)) {
        let mut fixture = TestFixture::with_params(4, ProtocolParams::default());
        for step in steps {
            let before = fixture.engine.clone();
            if fixture.call_with_value(step.party, step.call, step.value).is_err() {
                prop_assert_eq!(&before, &fixture.engine);
            }
        }
    }

    #[test]
    fn prop_delegation_depth_at_most_one(steps in script(40)) {
        let mut fixture = TestFixture::with_params(4, ProtocolParams::default());
        for step in steps {
            let _ = fixture.call_with_value(step.party, step.call, step.value);
            let nodes = (0..fixture.engine.node_count() as u64).map(NodeId);
            prop_assert!(max_depth(fixture.engine.edges(), nodes) <= 1);
        }
    }

    /// Balances always equal value paid in minus value withdrawn.
    #[test]
    fn prop_balances_conserved(steps in script(40)) {
        let mut fixture = TestFixture::with_params(4, ProtocolParams::default());
        let mut paid_in: Amount = 0;
        let mut paid_out: Amount = 0;
        for step in steps {
            let value = step.value;
            if let Ok(outcome) = fixture.call_with_value(step.party, step.call, value) {
                paid_in += value;
                if let Some((_, amount)) = outcome.withdrawal {
                    paid_out += amount;
                }
            }
            prop_assert_eq!(fixture.engine.total_balance(), paid_in - paid_out);
        }
    }
}
