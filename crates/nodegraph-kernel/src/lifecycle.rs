//! Node lifecycle: mint, transfer, burn.

use nodegraph_core::{
    Address, CallContext, ContentHash, EdgeInput, Label, NodeId, Record, Role,
};

use crate::economics::Charge;
use crate::engine::{Engine, Outcome, Result};
use crate::error::EngineError;
use crate::graph::edge_record;

impl Engine {
    /// Create a node owned by the caller, with its first revision and
    /// initial edges.
    ///
    /// The very first mint establishes the caller as protocol steward and
    /// pays no mint fee.
    pub(crate) fn mint(
        &mut self,
        ctx: &CallContext,
        label: &str,
        hash: &str,
        incoming: &[EdgeInput],
        outgoing: &[EdgeInput],
    ) -> Result<Outcome> {
        let label = Label::new(label)?;
        let hash = ContentHash::new(hash)?;
        let node = self.registry.next_id();
        let plan = self.plan_edges(&ctx.caller, node, incoming, outgoing)?;

        let steward = self.economics.steward();
        let mut charges = Vec::with_capacity(plan.charges.len() + 1);
        if let Some(steward) = steward {
            charges.push(Charge {
                payee: steward,
                amount: self.economics.protocol().protocol_mint_fee,
            });
        }
        charges.extend(plan.charges.iter().copied());
        let settlement =
            self.economics
                .plan(Some(steward.unwrap_or(ctx.caller)), ctx.value, &charges)?;

        let minted = self.registry.insert(label.clone(), ctx.caller);
        debug_assert_eq!(minted, node);
        let mut records = vec![
            Record::Transfer {
                node,
                from: Address::NULL,
                to: ctx.caller,
            },
            Record::LabelAssigned { node, label },
        ];
        if steward.is_none() {
            self.economics.protocol.steward = Some(ctx.caller);
            records.push(Record::StewardEstablished {
                steward: ctx.caller,
            });
            tracing::info!(steward = %ctx.caller, "protocol steward established");
        }
        self.perms.roles_mut().grant(node, Role::Admin, ctx.caller);
        records.push(Record::RoleGranted {
            node,
            role: Role::Admin,
            account: ctx.caller,
            sender: ctx.caller,
        });
        self.push_revision(node, hash, ctx.height, &mut records);
        self.apply_edges(plan, &mut records);
        self.economics.settle(settlement, &mut records);

        Ok(Outcome {
            node: Some(node),
            records,
            withdrawal: None,
        })
    }

    /// Hand ownership to `to`. Roles are left as they are.
    pub(crate) fn transfer(&mut self, ctx: &CallContext, node: NodeId, to: Address) -> Result<Outcome> {
        let record = self.registry.live(node)?;
        if record.owner != ctx.caller {
            return Err(EngineError::NotOwner(node));
        }
        if to.is_null() {
            return Err(EngineError::InvalidRecipient);
        }
        let settlement = self.plan_value(ctx, &[])?;

        let mut records = Vec::new();
        if let Some(from) = self.registry.set_owner(node, to) {
            records.push(Record::Transfer { node, from, to });
        }
        self.economics.settle(settlement, &mut records);
        Ok(Outcome::with_records(records))
    }

    /// Retire `node` for good: ownership goes to the null address, every
    /// edge touching it is deactivated and every role on it revoked.
    ///
    /// Labels and revision history stay readable.
    pub(crate) fn burn(&mut self, ctx: &CallContext, node: NodeId) -> Result<Outcome> {
        self.registry.live(node)?;
        self.require_role(node, Role::Admin, &ctx.caller)?;
        let settlement = self.plan_value(ctx, &[])?;

        let mut records = Vec::new();
        if let Some(from) = self.registry.burn(node) {
            records.push(Record::Transfer {
                node,
                from,
                to: Address::NULL,
            });
        }
        for edge in self.edges.deactivate_touching(node) {
            records.push(edge_record(edge, false));
        }
        for (role, account) in self.perms.roles_mut().clear_node(node) {
            records.push(Record::RoleRevoked {
                node,
                role,
                account,
                sender: ctx.caller,
            });
        }
        records.push(Record::Burnt { node });
        self.economics.settle(settlement, &mut records);

        tracing::info!(node = %node, caller = %ctx.caller, "node burnt");
        Ok(Outcome::with_records(records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodegraph_core::Call;

    const ALICE: Address = Address::from_bytes([1; 20]);
    const BOB: Address = Address::from_bytes([2; 20]);

    #[test]
    fn test_first_mint_records() {
        let mut engine = Engine::default();
        let outcome = engine
            .execute(CallContext::new(ALICE, 7), &Call::mint("topic", "Qm1"))
            .unwrap();
        let node = NodeId(0);

        assert_eq!(outcome.node, Some(node));
        assert_eq!(
            outcome.records,
            vec![
                Record::Transfer {
                    node,
                    from: Address::NULL,
                    to: ALICE
                },
                Record::LabelAssigned {
                    node,
                    label: Label::new("topic").unwrap()
                },
                Record::StewardEstablished { steward: ALICE },
                Record::RoleGranted {
                    node,
                    role: Role::Admin,
                    account: ALICE,
                    sender: ALICE
                },
                Record::Revised {
                    node,
                    hash: ContentHash::new("Qm1").unwrap(),
                    sequence: 0,
                    height: 7
                },
            ]
        );
        assert_eq!(engine.protocol_steward(), Some(ALICE));
    }

    #[test]
    fn test_mint_fee_goes_to_steward() {
        let mut engine = Engine::default();
        engine
            .execute(CallContext::new(ALICE, 1), &Call::mint("topic", "h"))
            .unwrap();
        engine
            .execute(
                CallContext::new(ALICE, 1),
                &Call::SetProtocolMintFee { amount: 10 },
            )
            .unwrap();

        let short = CallContext::new(BOB, 2).with_value(9);
        assert_eq!(
            engine.execute(short, &Call::mint("topic", "h")),
            Err(EngineError::InsufficientFunds {
                required: 10,
                supplied: 9
            })
        );
        assert_eq!(engine.node_count(), 1);

        let paid = CallContext::new(BOB, 2).with_value(12);
        engine.execute(paid, &Call::mint("topic", "h")).unwrap();
        assert_eq!(engine.balance_of(&ALICE), 12);
        assert_eq!(engine.owner_of(NodeId(1)).unwrap(), BOB);
    }

    #[test]
    fn test_mint_self_edge() {
        let mut engine = Engine::default();
        let call = Call::Mint {
            label: "topic".into(),
            hash: "h".into(),
            incoming: vec![],
            outgoing: vec![EdgeInput::new(NodeId(0), "self")],
        };
        engine.execute(CallContext::new(ALICE, 1), &call).unwrap();
        assert_eq!(engine.connected_nodes(NodeId(0), "self").unwrap(), &[NodeId(0)]);
        assert_eq!(engine.backlinked_nodes(NodeId(0), "self").unwrap(), &[NodeId(0)]);
    }

    #[test]
    fn test_transfer_rules() {
        let mut engine = Engine::default();
        engine
            .execute(CallContext::new(ALICE, 1), &Call::mint("topic", "h"))
            .unwrap();
        let node = NodeId(0);

        let by_bob = Call::Transfer { node, to: BOB };
        assert_eq!(
            engine.execute(CallContext::new(BOB, 2), &by_bob),
            Err(EngineError::NotOwner(node))
        );
        let to_null = Call::Transfer {
            node,
            to: Address::NULL,
        };
        assert_eq!(
            engine.execute(CallContext::new(ALICE, 2), &to_null),
            Err(EngineError::InvalidRecipient)
        );

        engine
            .execute(CallContext::new(ALICE, 2), &Call::Transfer { node, to: BOB })
            .unwrap();
        assert_eq!(engine.owner_of(node).unwrap(), BOB);
        assert_eq!(engine.creator_of(node).unwrap(), ALICE);
        // Roles do not follow ownership.
        assert!(engine.has_role(node, Role::Admin, &ALICE).unwrap());
    }

    #[test]
    fn test_burn_clears_node() {
        let mut engine = Engine::default();
        let ctx = CallContext::new(ALICE, 1);
        engine.execute(ctx, &Call::mint("topic", "h")).unwrap();
        engine
            .execute(
                ctx,
                &Call::Mint {
                    label: "doc".into(),
                    hash: "h".into(),
                    incoming: vec![],
                    outgoing: vec![EdgeInput::new(NodeId(0), "in")],
                },
            )
            .unwrap();

        let outcome = engine.execute(ctx, &Call::Burn { node: NodeId(0) }).unwrap();
        assert_eq!(outcome.records.last(), Some(&Record::Burnt { node: NodeId(0) }));
        assert!(engine.is_burnt(NodeId(0)).unwrap());
        assert_eq!(engine.owner_of(NodeId(0)).unwrap(), Address::NULL);
        assert_eq!(engine.role_member_count(NodeId(0), Role::Admin), 0);
        assert_eq!(engine.connected_node_count(NodeId(1), "in").unwrap(), 0);
        assert_eq!(engine.label_for(NodeId(0)).unwrap(), "topic");
        assert_eq!(engine.revision_count(NodeId(0)).unwrap(), 1);

        assert_eq!(
            engine.execute(ctx, &Call::Burn { node: NodeId(0) }),
            Err(EngineError::NodeBurnt(NodeId(0)))
        );
    }
}
