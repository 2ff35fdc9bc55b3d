//! Per-chain constants: chain id, bech32 prefix, derivation path, fee denom
//! and the collaborator endpoints.

use serde::{Deserialize, Serialize};

use crate::address::validate_prefix;
use crate::error::CosmosError;

/// SLIP-44 coin type shared by most Cosmos SDK chains.
pub const COSMOS_COIN_TYPE: u32 = 118;

/// First account, first external address under `coin_type`.
pub fn bip44_path(coin_type: u32) -> String {
    format!("m/44'/{coin_type}'/0'/0/0")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    pub chain_id: String,
    pub address_prefix: String,
    #[serde(default = "default_coin_type")]
    pub coin_type: u32,
    /// Overrides the BIP-44 path built from `coin_type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivation_path: Option<String>,
    pub fee_denom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_url: Option<String>,
}

fn default_coin_type() -> u32 {
    COSMOS_COIN_TYPE
}

impl ChainConfig {
    pub fn cosmos_hub() -> Self {
        Self {
            name: "Cosmos Hub".into(),
            chain_id: "cosmoshub-4".into(),
            address_prefix: "cosmos".into(),
            coin_type: COSMOS_COIN_TYPE,
            derivation_path: None,
            fee_denom: "uatom".into(),
            rpc_url: Some("https://cosmos-rpc.polkachu.com".into()),
            rest_url: Some("https://cosmos-api.polkachu.com".into()),
        }
    }

    pub fn sei() -> Self {
        Self {
            name: "Sei".into(),
            chain_id: "pacific-1".into(),
            address_prefix: "sei".into(),
            coin_type: COSMOS_COIN_TYPE,
            derivation_path: None,
            fee_denom: "usei".into(),
            rpc_url: Some("https://sei-rpc.polkachu.com".into()),
            rest_url: Some("https://sei-api.polkachu.com".into()),
        }
    }

    /// Local single-node test chain.
    pub fn test() -> Self {
        Self {
            name: "Test".into(),
            chain_id: "test-1".into(),
            address_prefix: "cosmos".into(),
            coin_type: COSMOS_COIN_TYPE,
            derivation_path: None,
            fee_denom: "utoken".into(),
            rpc_url: None,
            rest_url: None,
        }
    }

    /// The path keys are derived along.
    pub fn derivation_path(&self) -> String {
        self.derivation_path
            .clone()
            .unwrap_or_else(|| bip44_path(self.coin_type))
    }

    /// Parses and validates a JSON chain description.
    pub fn from_json(json: &str) -> Result<Self, CosmosError> {
        let config: ChainConfig = serde_json::from_str(json)
            .map_err(|e| CosmosError::InvalidConfig(format!("malformed chain json: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), CosmosError> {
        if self.chain_id.trim().is_empty() {
            return Err(CosmosError::InvalidConfig("chain id is empty".into()));
        }
        if self.fee_denom.trim().is_empty() {
            return Err(CosmosError::InvalidConfig("fee denom is empty".into()));
        }
        validate_prefix(&self.address_prefix).map_err(|e| {
            CosmosError::InvalidConfig(format!("address prefix '{}': {e}", self.address_prefix))
        })
    }
}
