//! Transaction documents (`cosmos.tx.v1beta1`).
//!
//! `TxBody` and `AuthInfo` are encoded once; the resulting bytes are carried
//! by reference into both the `SignDoc` that gets hashed and the `TxRaw` that
//! gets broadcast, so the signed bytes and the transmitted bytes can never
//! drift apart.

use serde::{Deserialize, Serialize};

use crate::error::CosmosError;
use crate::math::{check_int53, parse_int53};
use crate::messages::{encode_coins, Coin};
use crate::protobuf::{
    encode_bytes, encode_length_delimited, encode_string, encode_uint32, encode_uint64, Any,
    FieldReader,
};
use crate::pubkey::PublicKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxBody {
    pub messages: Vec<Any>,
    pub memo: String,
    pub timeout_height: u64,
}

impl TxBody {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for message in &self.messages {
            encode_length_delimited(&mut buf, 1, &message.encode());
        }
        encode_string(&mut buf, 2, &self.memo);
        encode_uint64(&mut buf, 3, self.timeout_height);
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CosmosError> {
        let mut body = TxBody {
            messages: Vec::new(),
            memo: String::new(),
            timeout_height: 0,
        };
        let mut reader = FieldReader::new(bytes);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                1 => body.messages.push(Any::decode(value.as_bytes("messages")?)?),
                2 => body.memo = value.as_string("memo")?,
                3 => body.timeout_height = value.as_u64("timeout_height")?,
                _ => {}
            }
        }
        Ok(body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub amount: Vec<Coin>,
    pub gas_limit: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub granter: Option<String>,
}

impl Fee {
    pub fn new(amount: Vec<Coin>, gas_limit: u64) -> Self {
        Self {
            amount,
            gas_limit,
            payer: None,
            granter: None,
        }
    }

    /// Builds a fee from a decimal gas string, as wallets and REST clients
    /// usually carry it.
    pub fn from_gas_str(amount: Vec<Coin>, gas: &str) -> Result<Self, CosmosError> {
        Ok(Self::new(amount, parse_int53("gas limit", gas)?))
    }

    pub fn with_granter(mut self, granter: impl Into<String>) -> Self {
        self.granter = Some(granter.into());
        self
    }

    pub fn with_payer(mut self, payer: impl Into<String>) -> Self {
        self.payer = Some(payer.into());
        self
    }

    pub fn encode(&self) -> Result<Vec<u8>, CosmosError> {
        let gas_limit = check_int53("gas limit", self.gas_limit)?;
        let mut buf = Vec::new();
        encode_coins(&mut buf, 1, &self.amount)?;
        encode_uint64(&mut buf, 2, gas_limit);
        encode_string(&mut buf, 3, self.payer.as_deref().unwrap_or_default());
        encode_string(&mut buf, 4, self.granter.as_deref().unwrap_or_default());
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CosmosError> {
        let mut fee = Fee::new(Vec::new(), 0);
        let mut reader = FieldReader::new(bytes);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                1 => fee.amount.push(Coin::decode(value.as_bytes("fee.amount")?)?),
                2 => fee.gas_limit = value.as_u64("gas_limit")?,
                3 => fee.payer = Some(value.as_string("payer")?),
                4 => fee.granter = Some(value.as_string("granter")?),
                _ => {}
            }
        }
        Ok(fee)
    }
}

/// How a signer's signature covers the transaction.
///
/// Only `Direct` (sign the exact body and auth-info bytes) is supported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignMode {
    #[default]
    Direct,
}

impl SignMode {
    /// Wire value of `cosmos.tx.signing.v1beta1.SignMode`.
    pub fn as_u32(self) -> u32 {
        match self {
            SignMode::Direct => 1,
        }
    }

    pub fn from_u32(value: u32) -> Result<Self, CosmosError> {
        match value {
            1 => Ok(SignMode::Direct),
            other => Err(CosmosError::EncodingError(format!(
                "unsupported sign mode {other}"
            ))),
        }
    }

    /// `ModeInfo { single: { mode } }`.
    fn encode_mode_info(self) -> Vec<u8> {
        let mut single = Vec::new();
        encode_uint32(&mut single, 1, self.as_u32());
        let mut buf = Vec::new();
        encode_length_delimited(&mut buf, 1, &single);
        buf
    }

    fn decode_mode_info(bytes: &[u8]) -> Result<Self, CosmosError> {
        let mut mode = 0;
        let mut reader = FieldReader::new(bytes);
        while let Some((field, value)) = reader.next_field()? {
            if field == 1 {
                let mut single = FieldReader::new(value.as_bytes("mode_info.single")?);
                while let Some((inner, v)) = single.next_field()? {
                    if inner == 1 {
                        mode = v.as_u32("mode")?;
                    }
                }
            } else {
                return Err(CosmosError::EncodingError(
                    "only single-signer mode info is supported".into(),
                ));
            }
        }
        SignMode::from_u32(mode)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerInfo {
    pub public_key: Option<PublicKey>,
    pub sign_mode: SignMode,
    pub sequence: u64,
}

impl SignerInfo {
    pub fn encode(&self) -> Result<Vec<u8>, CosmosError> {
        let sequence = check_int53("sequence", self.sequence)?;
        let mut buf = Vec::new();
        if let Some(key) = &self.public_key {
            encode_length_delimited(&mut buf, 1, &key.to_any()?.encode());
        }
        encode_length_delimited(&mut buf, 2, &self.sign_mode.encode_mode_info());
        encode_uint64(&mut buf, 3, sequence);
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CosmosError> {
        let mut public_key = None;
        let mut sign_mode = None;
        let mut sequence = 0;
        let mut reader = FieldReader::new(bytes);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                1 => {
                    let any = Any::decode(value.as_bytes("public_key")?)?;
                    public_key = Some(PublicKey::from_any(&any)?);
                }
                2 => sign_mode = Some(SignMode::decode_mode_info(value.as_bytes("mode_info")?)?),
                3 => sequence = value.as_u64("sequence")?,
                _ => {}
            }
        }
        let sign_mode =
            sign_mode.ok_or_else(|| CosmosError::EncodingError("signer info has no mode info".into()))?;
        Ok(SignerInfo {
            public_key,
            sign_mode,
            sequence,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthInfo {
    pub signer_infos: Vec<SignerInfo>,
    pub fee: Fee,
}

impl AuthInfo {
    pub fn encode(&self) -> Result<Vec<u8>, CosmosError> {
        let mut buf = Vec::new();
        for info in &self.signer_infos {
            encode_length_delimited(&mut buf, 1, &info.encode()?);
        }
        encode_length_delimited(&mut buf, 2, &self.fee.encode()?);
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CosmosError> {
        let mut signer_infos = Vec::new();
        let mut fee = Fee::new(Vec::new(), 0);
        let mut reader = FieldReader::new(bytes);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                1 => signer_infos.push(SignerInfo::decode(value.as_bytes("signer_infos")?)?),
                2 => fee = Fee::decode(value.as_bytes("fee")?)?,
                _ => {}
            }
        }
        Ok(AuthInfo { signer_infos, fee })
    }
}

/// The document whose SHA-256 is signed in direct mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignDoc {
    pub body_bytes: Vec<u8>,
    pub auth_info_bytes: Vec<u8>,
    pub chain_id: String,
    pub account_number: u64,
}

impl SignDoc {
    pub fn encode(&self) -> Result<Vec<u8>, CosmosError> {
        let account_number = check_int53("account number", self.account_number)?;
        let mut buf = Vec::with_capacity(
            self.body_bytes.len() + self.auth_info_bytes.len() + self.chain_id.len() + 16,
        );
        encode_bytes(&mut buf, 1, &self.body_bytes);
        encode_bytes(&mut buf, 2, &self.auth_info_bytes);
        encode_string(&mut buf, 3, &self.chain_id);
        encode_uint64(&mut buf, 4, account_number);
        Ok(buf)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CosmosError> {
        let mut doc = SignDoc {
            body_bytes: Vec::new(),
            auth_info_bytes: Vec::new(),
            chain_id: String::new(),
            account_number: 0,
        };
        let mut reader = FieldReader::new(bytes);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                1 => doc.body_bytes = value.as_bytes("body_bytes")?.to_vec(),
                2 => doc.auth_info_bytes = value.as_bytes("auth_info_bytes")?.to_vec(),
                3 => doc.chain_id = value.as_string("chain_id")?,
                4 => doc.account_number = value.as_u64("account_number")?,
                _ => {}
            }
        }
        Ok(doc)
    }
}

/// The broadcastable transaction: body, auth info and one signature per
/// signer, in signer order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxRaw {
    pub body_bytes: Vec<u8>,
    pub auth_info_bytes: Vec<u8>,
    pub signatures: Vec<Vec<u8>>,
}

impl TxRaw {
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_bytes(&mut buf, 1, &self.body_bytes);
        encode_bytes(&mut buf, 2, &self.auth_info_bytes);
        for signature in &self.signatures {
            encode_length_delimited(&mut buf, 3, signature);
        }
        buf
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CosmosError> {
        let mut tx = TxRaw {
            body_bytes: Vec::new(),
            auth_info_bytes: Vec::new(),
            signatures: Vec::new(),
        };
        let mut reader = FieldReader::new(bytes);
        while let Some((field, value)) = reader.next_field()? {
            match field {
                1 => tx.body_bytes = value.as_bytes("body_bytes")?.to_vec(),
                2 => tx.auth_info_bytes = value.as_bytes("auth_info_bytes")?.to_vec(),
                3 => tx.signatures.push(value.as_bytes("signatures")?.to_vec()),
                _ => {}
            }
        }
        Ok(tx)
    }
}
