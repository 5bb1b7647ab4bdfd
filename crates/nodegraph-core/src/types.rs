//! Strong type definitions for the Nodegraph Kernel.
//!
//! All identifiers are newtypes to prevent misuse at compile time. The
//! string newtypes can only be built through their validating constructors.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::Ed25519PublicKey;
use crate::error::{CoreError, Result};
use crate::validation::{self, SystemEdge};

/// Token amounts: fees, balances, sale prices.
pub type Amount = u64;

/// Host-supplied position in the external total order.
pub type Height = u64;

/// Sequential node identifier, assigned at mint and never reused.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    /// The first node ever minted. Its minter becomes the protocol steward.
    pub const GENESIS: Self = Self(0);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// The id that follows this one.
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A 20-byte account identifier.
///
/// Owners, role holders, royalty receivers and balance holders are all
/// addresses. [`Address::NULL`] is the sentinel owner of burnt nodes.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero sentinel address.
    pub const NULL: Self = Self([0u8; 20]);

    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Derive the address controlled by an ed25519 public key.
    pub fn from_public_key(public_key: &Ed25519PublicKey) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"nodegraph-address-v0:");
        hasher.update(public_key.as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest.as_bytes()[..20]);
        Self(bytes)
    }

    pub fn is_null(&self) -> bool {
        *self == Self::NULL
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex, with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> std::result::Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        let arr: [u8; 20] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{})", &self.to_hex()[..12])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

/// Immutable node label (e.g. `topic`, `subgraph`, `document`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Label(String);

impl Label {
    /// Validate and wrap a label.
    ///
    /// Fails with `InvalidString` when empty and `ReservedString` when it
    /// starts with the reserved prefix.
    pub fn new(label: impl Into<String>) -> Result<Self> {
        let label = label.into();
        validation::validate_label(&label)?;
        Ok(Self(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Label {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Label> for String {
    fn from(label: Label) -> Self {
        label.0
    }
}

/// Content-addressed hash of a revision's off-chain content.
///
/// The kernel never interprets the hash; it only requires it to be
/// non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    pub fn new(hash: impl Into<String>) -> Result<Self> {
        let hash = hash.into();
        validation::validate_content_hash(&hash)?;
        Ok(Self(hash))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

/// Name of a directed edge.
///
/// User edge names are validated by [`EdgeName::new`]. System edge names
/// (which carry the reserved prefix) only come from [`EdgeName::system`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EdgeName(String);

impl EdgeName {
    /// Validate a user-supplied edge name.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validation::validate_edge_name(&name)?;
        Ok(Self(name))
    }

    /// The name of a system edge.
    pub fn system(edge: SystemEdge) -> Self {
        Self(edge.name().to_string())
    }

    /// The system edge this name denotes, if any.
    pub fn as_system(&self) -> Option<SystemEdge> {
        SystemEdge::from_name(&self.0)
    }

    pub fn is_system(&self) -> bool {
        self.as_system().is_some()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EdgeName {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self> {
        match SystemEdge::from_name(&value) {
            Some(edge) => Ok(Self::system(edge)),
            None => Self::new(value),
        }
    }
}

impl From<EdgeName> for String {
    fn from(name: EdgeName) -> Self {
        name.0
    }
}

/// A per-node capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Editor,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Admin, Role::Editor];

    /// Whether holding `self` is enough where `required` is demanded.
    ///
    /// ADMIN satisfies every role; EDITOR only satisfies EDITOR.
    pub fn satisfies(self, required: Role) -> bool {
        match (self, required) {
            (Role::Admin, _) => true,
            (Role::Editor, Role::Editor) => true,
            (Role::Editor, Role::Admin) => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("ADMIN"),
            Role::Editor => f.write_str("EDITOR"),
        }
    }
}

/// Royalty fractions are expressed in basis points of this denominator.
pub const ROYALTY_DENOMINATOR: u16 = 10_000;

/// A royalty receiver and fraction of the sale price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Royalty {
    pub receiver: Address,
    pub basis_points: u16,
}

impl Royalty {
    pub const fn new(receiver: Address, basis_points: u16) -> Self {
        Self {
            receiver,
            basis_points,
        }
    }

    /// Whether the fraction is at most 100%.
    pub fn is_valid(&self) -> bool {
        self.basis_points <= ROYALTY_DENOMINATOR
    }

    /// The royalty owed on a sale, rounded down.
    pub fn amount_for(&self, sale_price: Amount) -> Amount {
        let bps = Amount::from(self.basis_points);
        let denominator = Amount::from(ROYALTY_DENOMINATOR);
        // Split to keep the multiplication from overflowing on huge prices.
        (sale_price / denominator) * bps + (sale_price % denominator) * bps / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    #[test]
    fn test_address_hex_roundtrip() {
        let address = Address::from_bytes([0xab; 20]);
        let recovered = Address::from_hex(&address.to_string()).unwrap();
        assert_eq!(address, recovered);
        assert!(Address::from_hex("0x1234").is_err());
    }

    #[test]
    fn test_address_derivation_is_stable() {
        let keypair = Keypair::from_seed(&[7u8; 32]);
        let a1 = Address::from_public_key(&keypair.public_key());
        let a2 = Address::from_public_key(&keypair.public_key());
        assert_eq!(a1, a2);
        assert!(!a1.is_null());

        let other = Keypair::from_seed(&[8u8; 32]);
        assert_ne!(a1, Address::from_public_key(&other.public_key()));
    }

    #[test]
    fn test_label_validation() {
        assert!(Label::new("topic").is_ok());
        assert_eq!(Label::new(""), Err(CoreError::InvalidString("label")));
        assert!(matches!(
            Label::new("_hidden"),
            Err(CoreError::ReservedString(_))
        ));
    }

    #[test]
    fn test_edge_name_system_roundtrip() {
        let delegation = EdgeName::system(SystemEdge::Delegation);
        assert!(delegation.is_system());
        assert!(EdgeName::new(delegation.as_str()).is_err());

        let json = serde_json::to_string(&delegation).unwrap();
        let back: EdgeName = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_system(), Some(SystemEdge::Delegation));
    }

    #[test]
    fn test_label_deserialize_rejects_reserved() {
        let result: std::result::Result<Label, _> = serde_json::from_str("\"_x\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_role_satisfies() {
        assert!(Role::Admin.satisfies(Role::Editor));
        assert!(Role::Admin.satisfies(Role::Admin));
        assert!(Role::Editor.satisfies(Role::Editor));
        assert!(!Role::Editor.satisfies(Role::Admin));
    }

    #[test]
    fn test_royalty_amount() {
        let royalty = Royalty::new(Address::from_bytes([1; 20]), 250);
        assert_eq!(royalty.amount_for(10_000), 250);
        assert_eq!(royalty.amount_for(399), 9);
        assert_eq!(royalty.amount_for(0), 0);

        let full = Royalty::new(Address::NULL, ROYALTY_DENOMINATOR);
        assert_eq!(full.amount_for(Amount::MAX), Amount::MAX);
        assert!(!Royalty::new(Address::NULL, 10_001).is_valid());
    }
}
