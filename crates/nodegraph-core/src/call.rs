//! Calls: the mutating operations a host submits to the kernel.
//!
//! Strings arrive unvalidated so the kernel can report `InvalidString` and
//! `ReservedString` exactly like any other failure. Attached value travels
//! beside the call in [`CallContext`], never inside it.

use serde::{Deserialize, Serialize};

use crate::canonical::to_cbor;
use crate::crypto::{Ed25519PublicKey, Ed25519Signature, Keypair};
use crate::edge::EdgeInput;
use crate::error::Result;
use crate::types::{Address, Amount, Height, NodeId, Role, Royalty};

/// Domain separator for signed calls.
pub const CALL_SIGN_DOMAIN: &[u8] = b"nodegraph-call-v0:";

/// A mutating operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Call {
    Mint {
        label: String,
        hash: String,
        incoming: Vec<EdgeInput>,
        outgoing: Vec<EdgeInput>,
    },
    Merge {
        node: NodeId,
        hash: String,
        incoming: Vec<EdgeInput>,
        outgoing: Vec<EdgeInput>,
    },
    Revise {
        node: NodeId,
        hash: String,
    },
    Burn {
        node: NodeId,
    },
    Transfer {
        node: NodeId,
        to: Address,
    },
    GrantRole {
        node: NodeId,
        role: Role,
        account: Address,
    },
    RevokeRole {
        node: NodeId,
        role: Role,
        account: Address,
    },
    RenounceRole {
        node: NodeId,
        role: Role,
    },
    DelegatePermissions {
        source: NodeId,
        target: NodeId,
    },
    RenounceDelegatePermissions {
        source: NodeId,
        target: NodeId,
    },
    SetConnectionFee {
        node: NodeId,
        amount: Amount,
    },
    SetPermissionsBypass {
        node: NodeId,
        enabled: bool,
    },
    SetProtocolMintFee {
        amount: Amount,
    },
    SetDefaultConnectionFee {
        amount: Amount,
    },
    SetDefaultRoyalty {
        royalty: Option<Royalty>,
    },
    SetTokenRoyalty {
        node: NodeId,
        royalty: Option<Royalty>,
    },
    DepositProtocolBalance,
    Withdraw,
}

impl Call {
    /// Short operation name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Call::Mint { .. } => "mint",
            Call::Merge { .. } => "merge",
            Call::Revise { .. } => "revise",
            Call::Burn { .. } => "burn",
            Call::Transfer { .. } => "transfer",
            Call::GrantRole { .. } => "grant_role",
            Call::RevokeRole { .. } => "revoke_role",
            Call::RenounceRole { .. } => "renounce_role",
            Call::DelegatePermissions { .. } => "delegate_permissions",
            Call::RenounceDelegatePermissions { .. } => "renounce_delegate_permissions",
            Call::SetConnectionFee { .. } => "set_connection_fee",
            Call::SetPermissionsBypass { .. } => "set_permissions_bypass",
            Call::SetProtocolMintFee { .. } => "set_protocol_mint_fee",
            Call::SetDefaultConnectionFee { .. } => "set_default_connection_fee",
            Call::SetDefaultRoyalty { .. } => "set_default_royalty",
            Call::SetTokenRoyalty { .. } => "set_token_royalty",
            Call::DepositProtocolBalance => "deposit_protocol_balance",
            Call::Withdraw => "withdraw",
        }
    }

    /// Mint with no edges.
    pub fn mint(label: impl Into<String>, hash: impl Into<String>) -> Self {
        Call::Mint {
            label: label.into(),
            hash: hash.into(),
            incoming: Vec::new(),
            outgoing: Vec::new(),
        }
    }

    /// Merge with explicit edge snapshots.
    pub fn merge(
        node: NodeId,
        hash: impl Into<String>,
        incoming: Vec<EdgeInput>,
        outgoing: Vec<EdgeInput>,
    ) -> Self {
        Call::Merge {
            node,
            hash: hash.into(),
            incoming,
            outgoing,
        }
    }
}

/// Who is calling, with how much value, at which height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    pub caller: Address,
    pub value: Amount,
    pub height: Height,
}

impl CallContext {
    pub fn new(caller: Address, height: Height) -> Self {
        Self {
            caller,
            value: 0,
            height,
        }
    }

    /// Attach value to the call.
    pub fn with_value(mut self, value: Amount) -> Self {
        self.value = value;
        self
    }
}

/// A call authenticated by its single caller.
///
/// The signature covers the call, the attached value, and the caller's
/// nonce. The host checks the nonce; this type only checks the signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCall {
    pub call: Call,
    pub value: Amount,
    pub nonce: u64,
    pub signer: Ed25519PublicKey,
    pub signature: Ed25519Signature,
}

/// The bytes a caller signs.
pub fn signing_message(call: &Call, value: Amount, nonce: u64) -> Result<Vec<u8>> {
    let mut message = CALL_SIGN_DOMAIN.to_vec();
    message.extend_from_slice(&to_cbor(&(call, value, nonce))?);
    Ok(message)
}

impl SignedCall {
    pub fn sign(keypair: &Keypair, call: Call, value: Amount, nonce: u64) -> Result<Self> {
        let message = signing_message(&call, value, nonce)?;
        Ok(Self {
            signature: keypair.sign(&message),
            signer: keypair.public_key(),
            call,
            value,
            nonce,
        })
    }

    /// Check the signature and return the caller's address.
    pub fn verify(&self) -> Result<Address> {
        let message = signing_message(&self.call, self.value, self.nonce)?;
        self.signer.verify(&message, &self.signature)?;
        Ok(self.signer.address())
    }

    /// The context this call executes under at `height`.
    pub fn context(&self, height: Height) -> CallContext {
        CallContext::new(self.signer.address(), height).with_value(self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn test_signed_call_verifies() {
        let keypair = Keypair::from_seed(&[3; 32]);
        let signed = SignedCall::sign(&keypair, Call::mint("topic", "Qm1"), 5, 0).unwrap();

        assert_eq!(signed.verify().unwrap(), keypair.address());
        let ctx = signed.context(12);
        assert_eq!(ctx.caller, keypair.address());
        assert_eq!(ctx.value, 5);
        assert_eq!(ctx.height, 12);
    }

    #[test]
    fn test_tampered_call_fails() {
        let keypair = Keypair::from_seed(&[3; 32]);
        let mut signed = SignedCall::sign(&keypair, Call::mint("topic", "Qm1"), 0, 0).unwrap();
        signed.value = 1_000;
        assert_eq!(signed.verify(), Err(CoreError::InvalidSignature));

        let mut signed = SignedCall::sign(&keypair, Call::Withdraw, 0, 0).unwrap();
        signed.nonce = 1;
        assert_eq!(signed.verify(), Err(CoreError::InvalidSignature));
    }

    #[test]
    fn test_foreign_signer_fails() {
        let keypair = Keypair::from_seed(&[3; 32]);
        let other = Keypair::from_seed(&[4; 32]);
        let mut signed = SignedCall::sign(&keypair, Call::Withdraw, 0, 0).unwrap();
        signed.signer = other.public_key();
        assert!(signed.verify().is_err());
    }

    #[test]
    fn test_call_json_shape() {
        let call = Call::Revise {
            node: NodeId(2),
            hash: "456".into(),
        };
        let json = serde_json::to_value(&call).unwrap();
        assert_eq!(json["op"], "revise");
        assert_eq!(json["node"], 2);
    }
}
