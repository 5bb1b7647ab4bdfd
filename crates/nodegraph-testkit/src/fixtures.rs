//! Test fixtures and helpers.
//!
//! Common setup code for engine and kernel tests.

use nodegraph_core::{
    Address, Amount, Call, CallContext, EdgeInput, Height, Keypair, NodeId, SignedCall,
};
use nodegraph_kernel::{Engine, EngineError, Outcome, ProtocolParams};

/// One caller with a deterministic signing key.
#[derive(Debug, Clone)]
pub struct Party {
    pub keypair: Keypair,
}

impl Party {
    /// Create a party whose key is derived from a one-byte seed.
    pub fn with_seed(seed: u8) -> Self {
        Self {
            keypair: Keypair::from_seed(&[seed; 32]),
        }
    }

    pub fn address(&self) -> Address {
        self.keypair.address()
    }

    /// A context for this party with no value attached.
    pub fn ctx(&self, height: Height) -> CallContext {
        CallContext::new(self.address(), height)
    }

    pub fn sign(&self, call: Call, value: Amount, nonce: u64) -> SignedCall {
        // Signing only fails when CBOR encoding fails, which never
        // happens for a well-formed call.
        SignedCall::sign(&self.keypair, call, value, nonce)
            .expect("call encodes")
    }
}

/// Create `count` distinct parties.
pub fn parties(count: usize) -> Vec<Party> {
    (0..count).map(|i| Party::with_seed(i as u8 + 1)).collect()
}

/// An engine plus the parties that drive it, with a height that
/// advances on every call.
pub struct TestFixture {
    pub engine: Engine,
    pub parties: Vec<Party>,
    pub height: Height,
}

impl TestFixture {
    /// Three parties, zero-fee protocol.
    pub fn new() -> Self {
        Self::with_params(3, ProtocolParams::default())
    }

    pub fn with_params(count: usize, params: ProtocolParams) -> Self {
        Self {
            engine: Engine::new(params),
            parties: parties(count),
            height: 0,
        }
    }

    pub fn address(&self, party: usize) -> Address {
        self.parties[party].address()
    }

    /// Execute `call` as `party` with no value.
    pub fn call(&mut self, party: usize, call: Call) -> Result<Outcome, EngineError> {
        self.call_with_value(party, call, 0)
    }

    pub fn call_with_value(
        &mut self,
        party: usize,
        call: Call,
        value: Amount,
    ) -> Result<Outcome, EngineError> {
        self.height += 1;
        let ctx = self.parties[party].ctx(self.height).with_value(value);
        self.engine.execute(ctx, &call)
    }

    /// Mint a node with no edges and return its id.
    pub fn mint(&mut self, party: usize, label: &str) -> NodeId {
        let outcome = self
            .call(party, Call::mint(label, format!("hash-{}", self.height)))
            .expect("mint succeeds");
        outcome.node.expect("mint returns a node")
    }

    /// Mint `count` nodes as party 0, each citing up to `fanout` of the
    /// nodes minted before it.
    pub fn populate(&mut self, count: usize, fanout: usize) -> Vec<NodeId> {
        let mut nodes: Vec<NodeId> = Vec::with_capacity(count);
        for i in 0..count {
            let outgoing = nodes
                .iter()
                .rev()
                .take(fanout)
                .map(|node| EdgeInput::new(*node, "cites"))
                .collect();
            let call = Call::Mint {
                label: if i % 2 == 0 { "topic" } else { "document" }.to_string(),
                hash: format!("hash-{i}"),
                incoming: Vec::new(),
                outgoing,
            };
            let outcome = self.call(0, call).expect("populate mint succeeds");
            nodes.push(outcome.node.expect("mint returns a node"));
        }
        nodes
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
