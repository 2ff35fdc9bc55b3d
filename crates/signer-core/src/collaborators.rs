//! Interfaces to the network side: account state lookup and transaction
//! broadcast.
//!
//! The core performs no I/O. Hosts implement these traits over whatever
//! transport they use; the JSON helpers here cover the Cosmos REST account
//! endpoint and Tendermint's `broadcast_tx_sync`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{BroadcastFailureClass, SignerError};

/// Codespace and code the SDK uses for a wrong account sequence.
pub const SDK_CODESPACE: &str = "sdk";
pub const CODE_WRONG_SEQUENCE: u32 = 32;

/// On-chain state needed to sign for an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountState {
    pub account_number: u64,
    pub sequence: u64,
    /// Compressed public key, once the account has signed anything.
    pub pub_key: Option<Vec<u8>>,
}

pub trait AccountProvider: Send + Sync {
    /// Fails with `AccountNotFound` if the address has never received funds.
    fn get_account(&self, address: &str) -> Result<AccountState, SignerError>;
}

pub trait Broadcaster: Send + Sync {
    /// Submits base64 `TxRaw` bytes. Transport errors are `Network`; a
    /// non-zero delivery code is returned in the response, not as an error.
    fn broadcast(&self, tx_base64: &str) -> Result<BroadcastResponse, SignerError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventAttribute {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Vec<EventAttribute>,
}

/// What the chain said about a submitted transaction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResponse {
    #[serde(default, alias = "txhash")]
    pub hash: String,
    #[serde(default, deserialize_with = "u32_from_any")]
    pub code: u32,
    #[serde(default)]
    pub codespace: String,
    #[serde(default, alias = "log")]
    pub raw_log: String,
    #[serde(default, deserialize_with = "u64_from_any")]
    pub height: u64,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default, deserialize_with = "u64_from_any")]
    pub gas_wanted: u64,
    #[serde(default, deserialize_with = "u64_from_any")]
    pub gas_used: u64,
}

impl BroadcastResponse {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// Classifies a non-zero code. `None` on success.
    pub fn failure_class(&self) -> Option<BroadcastFailureClass> {
        if self.is_success() {
            return None;
        }
        let wrong_sequence = (self.code == CODE_WRONG_SEQUENCE && self.codespace == SDK_CODESPACE)
            || self.raw_log.contains("account sequence mismatch");
        Some(if wrong_sequence {
            BroadcastFailureClass::SequenceMismatch
        } else {
            BroadcastFailureClass::Delivery
        })
    }

    /// `Ok(self)` when accepted, otherwise the matching `BroadcastFailure`.
    pub fn into_result(self) -> Result<Self, SignerError> {
        match self.failure_class() {
            None => Ok(self),
            Some(class) => Err(SignerError::BroadcastFailure {
                class,
                code: self.code,
                codespace: self.codespace,
                hash: self.hash,
                height: self.height,
                raw_log: self.raw_log,
            }),
        }
    }

    /// Parses a JSON-RPC reply to `broadcast_tx_sync`.
    pub fn from_json_rpc(body: &str) -> Result<Self, SignerError> {
        let reply: Value = serde_json::from_str(body)
            .map_err(|e| SignerError::Network(format!("malformed json-rpc reply: {e}")))?;
        if let Some(error) = reply.get("error").filter(|e| !e.is_null()) {
            return Err(SignerError::Network(format!("json-rpc error: {error}")));
        }
        let result = reply
            .get("result")
            .cloned()
            .ok_or_else(|| SignerError::Network("json-rpc reply has no result".into()))?;
        serde_json::from_value(result)
            .map_err(|e| SignerError::Network(format!("unexpected broadcast result: {e}")))
    }
}

/// JSON-RPC request body for `broadcast_tx_sync`.
pub fn broadcast_tx_sync_request(tx_base64: &str, id: u64) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "broadcast_tx_sync",
        "params": { "tx": tx_base64 },
    })
}

#[derive(Deserialize)]
struct RestAccountReply {
    account: Option<Value>,
}

#[derive(Deserialize)]
struct BaseAccount {
    #[serde(deserialize_with = "u64_from_any")]
    account_number: u64,
    #[serde(deserialize_with = "u64_from_any")]
    sequence: u64,
    #[serde(default)]
    pub_key: Option<RestPubKey>,
}

#[derive(Deserialize)]
struct RestPubKey {
    #[serde(default)]
    key: Option<String>,
}

/// Locates the `BaseAccount` fields: top level for plain accounts,
/// `base_account` for module and eth-style accounts,
/// `base_vesting_account.base_account` for vesting accounts.
fn base_account(account: &Value) -> Option<&Value> {
    if account.get("account_number").is_some() {
        return Some(account);
    }
    account
        .get("base_account")
        .or_else(|| account.pointer("/base_vesting_account/base_account"))
        .filter(|base| base.is_object())
}

impl AccountState {
    /// Parses `GET /cosmos/auth/v1beta1/accounts/{address}`.
    pub fn from_rest_json(address: &str, body: &str) -> Result<Self, SignerError> {
        let reply: RestAccountReply = serde_json::from_str(body)
            .map_err(|e| SignerError::Network(format!("malformed account reply: {e}")))?;
        let account = reply
            .account
            .ok_or_else(|| SignerError::AccountNotFound(address.to_string()))?;
        let account_type = account
            .get("@type")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        let base = base_account(&account).ok_or_else(|| {
            SignerError::InvalidFormat(format!(
                "account {address} of type {account_type} has no base account"
            ))
        })?;
        let base = BaseAccount::deserialize(base).map_err(|e| {
            SignerError::InvalidFormat(format!("account {address} of type {account_type}: {e}"))
        })?;

        let pub_key = base
            .pub_key
            .and_then(|pk| pk.key)
            .map(|key| {
                STANDARD
                    .decode(key)
                    .map_err(|e| SignerError::InvalidFormat(format!("account pub_key is not base64: {e}")))
            })
            .transpose()?;
        Ok(AccountState {
            account_number: base.account_number,
            sequence: base.sequence,
            pub_key,
        })
    }
}

/// REST and RPC endpoints encode 64-bit integers as strings; older nodes
/// and test fixtures use numbers. Accept both.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(u64),
    String(String),
}

fn u64_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) if s.is_empty() => Ok(0),
        NumberOrString::String(s) => s.parse().map_err(de::Error::custom),
    }
}

fn u32_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = u64_from_any(deserializer)?;
    u32::try_from(value).map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_broadcast_tx_sync_success() {
        let body = r#"{"jsonrpc":"2.0","id":1,"result":{"code":0,"data":"","log":"[]","codespace":"","hash":"9A468EFE"}}"#;
        let response = BroadcastResponse::from_json_rpc(body).unwrap();
        assert!(response.is_success());
        assert_eq!(response.hash, "9A468EFE");
        assert_eq!(response.raw_log, "[]");
        assert!(response.into_result().is_ok());
    }

    #[test]
    fn numeric_fields_accept_strings() {
        let json = r#"{"txhash":"AB","code":"5","codespace":"sdk","raw_log":"insufficient funds","height":"1200","gas_wanted":"200000","gas_used":80000}"#;
        let response: BroadcastResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.hash, "AB");
        assert_eq!(response.code, 5);
        assert_eq!(response.height, 1200);
        assert_eq!(response.gas_wanted, 200_000);
        assert_eq!(response.gas_used, 80_000);
    }

    #[test]
    fn events_are_parsed() {
        let json = r#"{"code":0,"events":[{"type":"transfer","attributes":[{"key":"amount","value":"1000utoken"}]}]}"#;
        let response: BroadcastResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.events[0].kind, "transfer");
        assert_eq!(response.events[0].attributes[0].value, "1000utoken");
    }

    #[test]
    fn wrong_sequence_code_is_sequence_mismatch() {
        let response = BroadcastResponse {
            code: 32,
            codespace: "sdk".into(),
            raw_log: "incorrect account sequence".into(),
            ..Default::default()
        };
        assert_eq!(
            response.failure_class(),
            Some(BroadcastFailureClass::SequenceMismatch)
        );
        let err = response.into_result().unwrap_err();
        assert!(err.is_sequence_mismatch());
    }

    #[test]
    fn sequence_mismatch_log_is_recognised() {
        let response = BroadcastResponse {
            code: 4,
            codespace: "undefined".into(),
            raw_log: "account sequence mismatch, expected 6, got 5: incorrect account sequence".into(),
            ..Default::default()
        };
        assert_eq!(
            response.failure_class(),
            Some(BroadcastFailureClass::SequenceMismatch)
        );
    }

    #[test]
    fn code_32_in_other_codespace_is_delivery() {
        let response = BroadcastResponse {
            code: 32,
            codespace: "wasm".into(),
            ..Default::default()
        };
        assert_eq!(response.failure_class(), Some(BroadcastFailureClass::Delivery));
    }

    #[test]
    fn delivery_failure_carries_diagnostics() {
        let response = BroadcastResponse {
            hash: "FF00".into(),
            code: 5,
            codespace: "sdk".into(),
            raw_log: "insufficient funds".into(),
            height: 42,
            ..Default::default()
        };
        match response.into_result() {
            Err(SignerError::BroadcastFailure {
                class,
                code,
                hash,
                height,
                raw_log,
                ..
            }) => {
                assert_eq!(class, BroadcastFailureClass::Delivery);
                assert_eq!(code, 5);
                assert_eq!(hash, "FF00");
                assert_eq!(height, 42);
                assert_eq!(raw_log, "insufficient funds");
            }
            other => panic!("expected BroadcastFailure, got {other:?}"),
        }
    }

    #[test]
    fn json_rpc_error_is_network() {
        let body = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32603,"message":"Internal error","data":"tx already exists in cache"}}"#;
        assert!(matches!(
            BroadcastResponse::from_json_rpc(body),
            Err(SignerError::Network(_))
        ));
        assert!(BroadcastResponse::from_json_rpc("<html>").is_err());
    }

    #[test]
    fn request_body_shape() {
        let body = broadcast_tx_sync_request("CpEB", 7);
        assert_eq!(body["method"], "broadcast_tx_sync");
        assert_eq!(body["params"]["tx"], "CpEB");
        assert_eq!(body["id"], 7);
    }

    #[test]
    fn rest_account_is_parsed() {
        let body = r#"{"account":{"@type":"/cosmos.auth.v1beta1.BaseAccount","address":"cosmos1x","pub_key":{"@type":"/cosmos.crypto.secp256k1.PubKey","key":"Ak9OKtmcNNYLm6YoPJQxqEGK+GcyEpYfl6d7Y3f80Fti"},"account_number":"12","sequence":"5"}}"#;
        let state = AccountState::from_rest_json("cosmos1x", body).unwrap();
        assert_eq!(state.account_number, 12);
        assert_eq!(state.sequence, 5);
        assert_eq!(
            hex::encode(state.pub_key.unwrap()),
            "024f4e2ad99c34d60b9ba6283c9431a8418af8673212961f97a77b6377fcd05b62"
        );
    }

    #[test]
    fn rest_account_without_pubkey() {
        let body = r#"{"account":{"account_number":"3","sequence":"0","pub_key":null}}"#;
        let state = AccountState::from_rest_json("cosmos1x", body).unwrap();
        assert_eq!(state.sequence, 0);
        assert!(state.pub_key.is_none());
    }

    #[test]
    fn vesting_account_reads_nested_base_account() {
        let body = r#"{"account":{"@type":"/cosmos.vesting.v1beta1.ContinuousVestingAccount","base_vesting_account":{"base_account":{"address":"cosmos1x","pub_key":null,"account_number":"4821","sequence":"17"},"original_vesting":[],"end_time":"1700000000"},"start_time":"1600000000"}}"#;
        let state = AccountState::from_rest_json("cosmos1x", body).unwrap();
        assert_eq!(state.account_number, 4821);
        assert_eq!(state.sequence, 17);
        assert!(state.pub_key.is_none());
    }

    #[test]
    fn module_account_reads_base_account() {
        let body = r#"{"account":{"@type":"/cosmos.auth.v1beta1.ModuleAccount","base_account":{"address":"cosmos1x","account_number":"7","sequence":"0"},"name":"distribution","permissions":[]}}"#;
        let state = AccountState::from_rest_json("cosmos1x", body).unwrap();
        assert_eq!(state.account_number, 7);
        assert_eq!(state.sequence, 0);
    }

    #[test]
    fn account_without_numbers_is_rejected() {
        let body = r#"{"account":{"@type":"/example.CustomAccount","address":"cosmos1x"}}"#;
        match AccountState::from_rest_json("cosmos1x", body) {
            Err(SignerError::InvalidFormat(msg)) => assert!(msg.contains("/example.CustomAccount")),
            other => panic!("expected InvalidFormat, got {other:?}"),
        }

        let body = r#"{"account":{"@type":"/cosmos.auth.v1beta1.BaseAccount","account_number":"3"}}"#;
        match AccountState::from_rest_json("cosmos1x", body) {
            Err(SignerError::InvalidFormat(msg)) => assert!(msg.contains("sequence")),
            other => panic!("expected InvalidFormat, got {other:?}"),
        }
    }

    #[test]
    fn missing_account_is_not_found() {
        let body = r#"{"code":5,"message":"rpc error: code = NotFound desc = account cosmos1x not found","details":[]}"#;
        match AccountState::from_rest_json("cosmos1x", body) {
            Err(SignerError::AccountNotFound(address)) => assert_eq!(address, "cosmos1x"),
            other => panic!("expected AccountNotFound, got {other:?}"),
        }
    }
}
