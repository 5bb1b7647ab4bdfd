//! Configuration for the engine and the kernel host.

use nodegraph_core::{Amount, Royalty};
use serde::{Deserialize, Serialize};

/// Protocol-wide parameters a fresh engine starts with.
///
/// The steward may change each of them later; these are only the values
/// in force before the first setter call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolParams {
    pub protocol_mint_fee: Amount,
    pub default_connection_fee: Amount,
    pub default_royalty: Option<Royalty>,
}

/// Configuration for the Kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Parameters for the engine built on open.
    pub protocol: ProtocolParams,
    /// Compare replayed records against the stored ones on open.
    pub verify_replay: bool,
    /// Check signatures on `submit_signed`.
    pub verify_signatures: bool,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            protocol: ProtocolParams::default(),
            verify_replay: true,
            verify_signatures: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: KernelConfig =
            serde_json::from_str(r#"{"protocol":{"protocol_mint_fee":5}}"#).unwrap();
        assert_eq!(config.protocol.protocol_mint_fee, 5);
        assert_eq!(config.protocol.default_connection_fee, 0);
        assert!(config.verify_replay);
        assert!(config.verify_signatures);
    }
}
