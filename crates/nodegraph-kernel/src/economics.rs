//! Economics: protocol config, per-node fees and royalties, and the
//! pull-payment ledger.
//!
//! Value attached to a call is split into what the call owes (mint fee,
//! connection fees) and an excess that goes to the steward. Nothing is
//! ever paid out inline; every share is a balance credit, and balances
//! only leave through `withdraw`.

use std::collections::{BTreeMap, HashMap};

use nodegraph_core::{Address, Amount, CallContext, NodeId, Record, Role, Royalty};

use crate::config::ProtocolParams;
use crate::engine::{Engine, Outcome};
use crate::error::EngineError;

/// Protocol-wide settings. The steward is fixed by the first mint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtocolConfig {
    pub steward: Option<Address>,
    pub protocol_mint_fee: Amount,
    pub default_connection_fee: Amount,
    pub default_royalty: Option<Royalty>,
}

impl From<ProtocolParams> for ProtocolConfig {
    fn from(params: ProtocolParams) -> Self {
        Self {
            steward: None,
            protocol_mint_fee: params.protocol_mint_fee,
            default_connection_fee: params.default_connection_fee,
            default_royalty: params.default_royalty,
        }
    }
}

/// An amount a call owes to `payee`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Charge {
    pub payee: Address,
    pub amount: Amount,
}

/// Validated balance credits for one call, applied by [`Economics::settle`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settlement {
    credits: Vec<(Address, Amount)>,
}

impl Settlement {
    pub fn credits(&self) -> &[(Address, Amount)] {
        &self.credits
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Economics {
    pub(crate) protocol: ProtocolConfig,
    connection_fees: HashMap<NodeId, Amount>,
    royalties: HashMap<NodeId, Royalty>,
    balances: BTreeMap<Address, Amount>,
}

impl Economics {
    pub fn new(protocol: ProtocolConfig) -> Self {
        Self {
            protocol,
            ..Self::default()
        }
    }

    pub fn protocol(&self) -> &ProtocolConfig {
        &self.protocol
    }

    pub fn steward(&self) -> Option<Address> {
        self.protocol.steward
    }

    /// Fail unless `caller` is the established steward.
    pub fn require_steward(&self, caller: &Address) -> Result<(), EngineError> {
        match self.protocol.steward {
            Some(steward) if steward == *caller => Ok(()),
            _ => Err(EngineError::OnlyProtocolSteward),
        }
    }

    /// The node's own fee, falling back to the protocol default.
    pub fn connection_fee(&self, node: NodeId) -> Amount {
        self.connection_fees
            .get(&node)
            .copied()
            .unwrap_or(self.protocol.default_connection_fee)
    }

    pub(crate) fn set_connection_fee(&mut self, node: NodeId, amount: Amount) {
        self.connection_fees.insert(node, amount);
    }

    pub fn token_royalty(&self, node: NodeId) -> Option<Royalty> {
        self.royalties.get(&node).copied()
    }

    pub(crate) fn set_token_royalty(&mut self, node: NodeId, royalty: Option<Royalty>) {
        match royalty {
            Some(royalty) => {
                self.royalties.insert(node, royalty);
            }
            None => {
                self.royalties.remove(&node);
            }
        }
    }

    /// Receiver and amount owed on a sale of `node` at `sale_price`.
    ///
    /// `(NULL, 0)` when neither an override nor a default is set.
    pub fn royalty_info(&self, node: NodeId, sale_price: Amount) -> (Address, Amount) {
        match self.token_royalty(node).or(self.protocol.default_royalty) {
            Some(royalty) => (royalty.receiver, royalty.amount_for(sale_price)),
            None => (Address::NULL, 0),
        }
    }

    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    /// Sum of every balance.
    pub fn total_balance(&self) -> Amount {
        self.balances
            .values()
            .fold(0, |total, balance| total.saturating_add(*balance))
    }

    /// Split `value` into `charges` plus an excess for the steward.
    ///
    /// `steward` is passed in so the establishing mint can name itself
    /// before the protocol config records it.
    pub fn plan(
        &self,
        steward: Option<Address>,
        value: Amount,
        charges: &[Charge],
    ) -> Result<Settlement, EngineError> {
        let total = charges
            .iter()
            .try_fold(0 as Amount, |total, charge| total.checked_add(charge.amount));
        let required = match total {
            Some(required) if required <= value => required,
            // An overflowing total can never be covered.
            _ => {
                return Err(EngineError::InsufficientFunds {
                    required: total.unwrap_or(Amount::MAX),
                    supplied: value,
                })
            }
        };

        let mut credits: Vec<(Address, Amount)> = Vec::new();
        let mut credit = |payee: Address, amount: Amount| {
            if amount == 0 {
                return;
            }
            match credits.iter_mut().find(|(account, _)| *account == payee) {
                Some((_, total)) => *total += amount,
                None => credits.push((payee, amount)),
            }
        };
        for charge in charges {
            credit(charge.payee, charge.amount);
        }
        let excess = value - required;
        if excess > 0 {
            credit(steward.ok_or(EngineError::StewardUnset)?, excess);
        }

        for (account, amount) in &credits {
            self.balance_of(account)
                .checked_add(*amount)
                .ok_or(EngineError::BalanceOverflow)?;
        }
        Ok(Settlement { credits })
    }

    /// Apply a planned settlement.
    pub(crate) fn settle(&mut self, settlement: Settlement, records: &mut Vec<Record>) {
        for (account, amount) in settlement.credits {
            let balance = self.balances.entry(account).or_insert(0);
            *balance = balance.saturating_add(amount);
            records.push(Record::BalanceCredited { account, amount });
        }
    }

    /// Zero `account`'s balance, returning what it held.
    pub(crate) fn take_balance(&mut self, account: &Address) -> Amount {
        self.balances.remove(account).unwrap_or(0)
    }
}

fn check_royalty(royalty: Option<Royalty>) -> Result<(), EngineError> {
    match royalty {
        Some(royalty) if !royalty.is_valid() => Err(EngineError::InvalidRoyalty(royalty.basis_points)),
        _ => Ok(()),
    }
}

impl Engine {
    pub(crate) fn set_connection_fee(
        &mut self,
        ctx: &CallContext,
        node: NodeId,
        amount: Amount,
    ) -> Result<Outcome, EngineError> {
        self.registry.live(node)?;
        self.require_role(node, Role::Admin, &ctx.caller)?;
        let settlement = self.plan_value(ctx, &[])?;

        self.economics.set_connection_fee(node, amount);
        let mut records = vec![Record::ConnectionFeeSet { node, amount }];
        self.economics.settle(settlement, &mut records);
        Ok(Outcome::with_records(records))
    }

    pub(crate) fn set_protocol_mint_fee(
        &mut self,
        ctx: &CallContext,
        amount: Amount,
    ) -> Result<Outcome, EngineError> {
        self.economics.require_steward(&ctx.caller)?;
        let settlement = self.plan_value(ctx, &[])?;

        self.economics.protocol.protocol_mint_fee = amount;
        let mut records = vec![Record::ProtocolMintFeeSet { amount }];
        self.economics.settle(settlement, &mut records);
        Ok(Outcome::with_records(records))
    }

    pub(crate) fn set_default_connection_fee(
        &mut self,
        ctx: &CallContext,
        amount: Amount,
    ) -> Result<Outcome, EngineError> {
        self.economics.require_steward(&ctx.caller)?;
        let settlement = self.plan_value(ctx, &[])?;

        self.economics.protocol.default_connection_fee = amount;
        let mut records = vec![Record::DefaultConnectionFeeSet { amount }];
        self.economics.settle(settlement, &mut records);
        Ok(Outcome::with_records(records))
    }

    pub(crate) fn set_default_royalty(
        &mut self,
        ctx: &CallContext,
        royalty: Option<Royalty>,
    ) -> Result<Outcome, EngineError> {
        self.economics.require_steward(&ctx.caller)?;
        check_royalty(royalty)?;
        let settlement = self.plan_value(ctx, &[])?;

        self.economics.protocol.default_royalty = royalty;
        let mut records = vec![Record::DefaultRoyaltySet { royalty }];
        self.economics.settle(settlement, &mut records);
        Ok(Outcome::with_records(records))
    }

    /// Per-node royalty override. Only a creator who still owns the node
    /// may set it; `None` falls back to the protocol default.
    pub(crate) fn set_token_royalty(
        &mut self,
        ctx: &CallContext,
        node: NodeId,
        royalty: Option<Royalty>,
    ) -> Result<Outcome, EngineError> {
        let record = self.registry.live(node)?;
        if record.owner != ctx.caller || record.creator != ctx.caller {
            return Err(EngineError::NotOwnerCreator(node));
        }
        check_royalty(royalty)?;
        let settlement = self.plan_value(ctx, &[])?;

        self.economics.set_token_royalty(node, royalty);
        let mut records = vec![Record::TokenRoyaltySet { node, royalty }];
        self.economics.settle(settlement, &mut records);
        Ok(Outcome::with_records(records))
    }

    /// Credit all attached value to the steward.
    pub(crate) fn deposit_protocol_balance(&mut self, ctx: &CallContext) -> Result<Outcome, EngineError> {
        let settlement = self.plan_value(ctx, &[])?;
        let mut records = Vec::new();
        self.economics.settle(settlement, &mut records);
        Ok(Outcome::with_records(records))
    }

    /// Pay out the caller's whole balance. The host performs the transfer
    /// named in the outcome.
    pub(crate) fn withdraw(&mut self, ctx: &CallContext) -> Result<Outcome, EngineError> {
        let settlement = self.plan_value(ctx, &[])?;
        let mut records = Vec::new();
        self.economics.settle(settlement, &mut records);

        let amount = self.economics.take_balance(&ctx.caller);
        let mut outcome = Outcome::with_records(records);
        if amount > 0 {
            outcome.records.push(Record::Withdrawn {
                account: ctx.caller,
                amount,
            });
            outcome.withdrawal = Some((ctx.caller, amount));
            tracing::info!(account = %ctx.caller, amount, "balance withdrawn");
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEWARD: Address = Address::from_bytes([1; 20]);
    const OWNER: Address = Address::from_bytes([2; 20]);

    fn economics() -> Economics {
        Economics::new(ProtocolConfig {
            steward: Some(STEWARD),
            ..ProtocolConfig::default()
        })
    }

    #[test]
    fn test_plan_splits_fees_and_excess() {
        let economics = economics();
        let charges = [
            Charge {
                payee: OWNER,
                amount: 30,
            },
            Charge {
                payee: OWNER,
                amount: 20,
            },
        ];
        let settlement = economics.plan(Some(STEWARD), 60, &charges).unwrap();
        assert_eq!(settlement.credits(), &[(OWNER, 50), (STEWARD, 10)]);
    }

    #[test]
    fn test_plan_rejects_underpayment() {
        let economics = economics();
        let charges = [Charge {
            payee: OWNER,
            amount: 30,
        }];
        assert_eq!(
            economics.plan(Some(STEWARD), 29, &charges),
            Err(EngineError::InsufficientFunds {
                required: 30,
                supplied: 29
            })
        );
    }

    #[test]
    fn test_excess_without_steward() {
        let economics = Economics::default();
        assert_eq!(
            economics.plan(None, 1, &[]),
            Err(EngineError::StewardUnset)
        );
        assert!(economics.plan(None, 0, &[]).unwrap().credits().is_empty());
    }

    #[test]
    fn test_settle_and_withdraw() {
        let mut economics = economics();
        let settlement = economics.plan(Some(STEWARD), 5, &[]).unwrap();
        let mut records = Vec::new();
        economics.settle(settlement, &mut records);

        assert_eq!(economics.balance_of(&STEWARD), 5);
        assert_eq!(
            records,
            vec![Record::BalanceCredited {
                account: STEWARD,
                amount: 5
            }]
        );
        assert_eq!(economics.take_balance(&STEWARD), 5);
        assert_eq!(economics.take_balance(&STEWARD), 0);
    }

    #[test]
    fn test_royalty_fallback() {
        let mut economics = economics();
        assert_eq!(economics.royalty_info(NodeId(0), 1_000), (Address::NULL, 0));

        economics.protocol.default_royalty = Some(Royalty::new(STEWARD, 100));
        assert_eq!(economics.royalty_info(NodeId(0), 1_000), (STEWARD, 10));

        economics.set_token_royalty(NodeId(0), Some(Royalty::new(OWNER, 500)));
        assert_eq!(economics.royalty_info(NodeId(0), 1_000), (OWNER, 50));
        assert_eq!(economics.royalty_info(NodeId(1), 1_000), (STEWARD, 10));

        economics.set_token_royalty(NodeId(0), None);
        assert_eq!(economics.royalty_info(NodeId(0), 1_000), (STEWARD, 10));
    }

    #[test]
    fn test_steward_setters() {
        use nodegraph_core::Call;

        let mut engine = Engine::default();
        let fee = Call::SetProtocolMintFee { amount: 3 };
        assert_eq!(
            engine.execute(CallContext::new(STEWARD, 1), &fee),
            Err(EngineError::OnlyProtocolSteward)
        );
        engine
            .execute(CallContext::new(STEWARD, 1), &Call::mint("topic", "h"))
            .unwrap();
        assert_eq!(
            engine.execute(CallContext::new(OWNER, 1), &fee),
            Err(EngineError::OnlyProtocolSteward)
        );
        engine.execute(CallContext::new(STEWARD, 2), &fee).unwrap();
        assert_eq!(engine.protocol_mint_fee(), 3);

        let too_much = Call::SetDefaultRoyalty {
            royalty: Some(Royalty::new(STEWARD, 10_001)),
        };
        assert_eq!(
            engine.execute(CallContext::new(STEWARD, 2), &too_much),
            Err(EngineError::InvalidRoyalty(10_001))
        );
    }

    #[test]
    fn test_token_royalty_needs_owner_creator() {
        use nodegraph_core::Call;

        let mut engine = Engine::default();
        engine
            .execute(CallContext::new(STEWARD, 1), &Call::mint("topic", "h"))
            .unwrap();
        let node = NodeId(0);
        let set = Call::SetTokenRoyalty {
            node,
            royalty: Some(Royalty::new(OWNER, 250)),
        };
        engine.execute(CallContext::new(STEWARD, 2), &set).unwrap();
        assert_eq!(engine.royalty_info(node, 10_000).unwrap(), (OWNER, 250));

        engine
            .execute(
                CallContext::new(STEWARD, 3),
                &Call::Transfer { node, to: OWNER },
            )
            .unwrap();
        assert_eq!(
            engine.execute(CallContext::new(OWNER, 4), &set),
            Err(EngineError::NotOwnerCreator(node))
        );
        assert_eq!(
            engine.execute(CallContext::new(STEWARD, 4), &set),
            Err(EngineError::NotOwnerCreator(node))
        );
    }

    #[test]
    fn test_deposit_and_withdraw() {
        use nodegraph_core::Call;

        let mut engine = Engine::default();
        assert_eq!(
            engine.execute(
                CallContext::new(OWNER, 1).with_value(5),
                &Call::DepositProtocolBalance
            ),
            Err(EngineError::StewardUnset)
        );
        engine
            .execute(CallContext::new(STEWARD, 1), &Call::mint("topic", "h"))
            .unwrap();
        engine
            .execute(
                CallContext::new(OWNER, 2).with_value(5),
                &Call::DepositProtocolBalance,
            )
            .unwrap();
        assert_eq!(engine.balance_of(&STEWARD), 5);

        let outcome = engine
            .execute(CallContext::new(STEWARD, 3), &Call::Withdraw)
            .unwrap();
        assert_eq!(outcome.withdrawal, Some((STEWARD, 5)));
        assert_eq!(engine.balance_of(&STEWARD), 0);

        let empty = engine
            .execute(CallContext::new(OWNER, 3), &Call::Withdraw)
            .unwrap();
        assert_eq!(empty.withdrawal, None);
        assert!(empty.records.is_empty());
    }

    #[test]
    fn test_connection_fee_fallback() {
        let mut economics = economics();
        economics.protocol.default_connection_fee = 7;
        assert_eq!(economics.connection_fee(NodeId(4)), 7);
        economics.set_connection_fee(NodeId(4), 0);
        assert_eq!(economics.connection_fee(NodeId(4)), 0);
    }
}
