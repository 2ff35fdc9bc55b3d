//! Public keys as they appear inside `SignerInfo.public_key`, and the amino
//! `StdSignature` view of a secp256k1 signature.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::CosmosError;
use crate::protobuf::{encode_bytes, encode_length_delimited, encode_uint32, Any, FieldReader};

pub const SECP256K1_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";
pub const ED25519_TYPE_URL: &str = "/cosmos.crypto.ed25519.PubKey";
pub const LEGACY_AMINO_MULTISIG_TYPE_URL: &str = "/cosmos.crypto.multisig.LegacyAminoPubKey";

/// Amino type tag of a secp256k1 key in JSON views.
pub const AMINO_SECP256K1_TYPE: &str = "tendermint/PubKeySecp256k1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    Secp256k1([u8; 33]),
    Ed25519([u8; 32]),
    LegacyAminoMultisig {
        threshold: u32,
        public_keys: Vec<PublicKey>,
    },
}

impl PublicKey {
    /// Wraps a compressed secp256k1 key, checking its length and parity tag.
    pub fn secp256k1(compressed: &[u8]) -> Result<Self, CosmosError> {
        let key: [u8; 33] = compressed.try_into().map_err(|_| {
            CosmosError::InvalidFormat(format!(
                "secp256k1 pubkey must be 33 bytes, got {}",
                compressed.len()
            ))
        })?;
        if key[0] != 0x02 && key[0] != 0x03 {
            return Err(CosmosError::InvalidFormat(format!(
                "secp256k1 pubkey must start with 0x02 or 0x03, got 0x{:02x}",
                key[0]
            )));
        }
        Ok(PublicKey::Secp256k1(key))
    }

    pub fn ed25519(key: &[u8]) -> Result<Self, CosmosError> {
        let key: [u8; 32] = key.try_into().map_err(|_| {
            CosmosError::InvalidFormat(format!("ed25519 pubkey must be 32 bytes, got {}", key.len()))
        })?;
        Ok(PublicKey::Ed25519(key))
    }

    /// Threshold key over single keys. `threshold` must be in `1..=keys.len()`.
    pub fn multisig(threshold: u32, public_keys: Vec<PublicKey>) -> Result<Self, CosmosError> {
        let key = PublicKey::LegacyAminoMultisig {
            threshold,
            public_keys,
        };
        key.validate()?;
        Ok(key)
    }

    pub fn type_url(&self) -> &'static str {
        match self {
            PublicKey::Secp256k1(_) => SECP256K1_TYPE_URL,
            PublicKey::Ed25519(_) => ED25519_TYPE_URL,
            PublicKey::LegacyAminoMultisig { .. } => LEGACY_AMINO_MULTISIG_TYPE_URL,
        }
    }

    fn validate(&self) -> Result<(), CosmosError> {
        if let PublicKey::LegacyAminoMultisig {
            threshold,
            public_keys,
        } = self
        {
            if *threshold == 0 || *threshold as usize > public_keys.len() {
                return Err(CosmosError::EncodingError(format!(
                    "multisig threshold {threshold} out of range for {} keys",
                    public_keys.len()
                )));
            }
            if public_keys
                .iter()
                .any(|k| matches!(k, PublicKey::LegacyAminoMultisig { .. }))
            {
                return Err(CosmosError::EncodingError(
                    "multisig keys must be single keys".into(),
                ));
            }
        }
        Ok(())
    }

    /// Encodes the key message (without the `Any` wrapper).
    pub fn encode(&self) -> Result<Vec<u8>, CosmosError> {
        self.validate()?;
        let mut buf = Vec::new();
        match self {
            PublicKey::Secp256k1(key) => encode_bytes(&mut buf, 1, key),
            PublicKey::Ed25519(key) => encode_bytes(&mut buf, 1, key),
            PublicKey::LegacyAminoMultisig {
                threshold,
                public_keys,
            } => {
                encode_uint32(&mut buf, 1, *threshold);
                for key in public_keys {
                    encode_length_delimited(&mut buf, 2, &key.to_any()?.encode());
                }
            }
        }
        Ok(buf)
    }

    pub fn to_any(&self) -> Result<Any, CosmosError> {
        Ok(Any::new(self.type_url(), self.encode()?))
    }

    pub fn from_any(any: &Any) -> Result<Self, CosmosError> {
        match any.type_url.as_str() {
            SECP256K1_TYPE_URL => PublicKey::secp256k1(&single_key_bytes(&any.value)?),
            ED25519_TYPE_URL => PublicKey::ed25519(&single_key_bytes(&any.value)?),
            LEGACY_AMINO_MULTISIG_TYPE_URL => {
                let mut threshold = 0;
                let mut public_keys = Vec::new();
                let mut reader = FieldReader::new(&any.value);
                while let Some((field, value)) = reader.next_field()? {
                    match field {
                        1 => threshold = value.as_u32("threshold")?,
                        2 => {
                            let nested = Any::decode(value.as_bytes("public_keys")?)?;
                            public_keys.push(PublicKey::from_any(&nested)?);
                        }
                        _ => {}
                    }
                }
                PublicKey::multisig(threshold, public_keys)
            }
            other => Err(CosmosError::UnregisteredType(other.to_string())),
        }
    }
}

fn single_key_bytes(value: &[u8]) -> Result<Vec<u8>, CosmosError> {
    let mut key = Vec::new();
    let mut reader = FieldReader::new(value);
    while let Some((field, value)) = reader.next_field()? {
        if field == 1 {
            key = value.as_bytes("key")?.to_vec();
        }
    }
    Ok(key)
}

/// Amino JSON public key: `{ "type": ..., "value": base64 }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AminoPubKey {
    #[serde(rename = "type")]
    pub key_type: String,
    pub value: String,
}

/// Amino JSON signature: the public key plus base64 `r || s`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StdSignature {
    pub pub_key: AminoPubKey,
    pub signature: String,
}

impl StdSignature {
    /// Builds the view for a 33-byte compressed key and a 64-byte `r || s`.
    pub fn secp256k1(compressed_pubkey: &[u8], signature: &[u8]) -> Result<Self, CosmosError> {
        PublicKey::secp256k1(compressed_pubkey)?;
        if signature.len() != 64 {
            return Err(CosmosError::InvalidFormat(format!(
                "signature must be 64 bytes (r || s), got {}",
                signature.len()
            )));
        }
        Ok(Self {
            pub_key: AminoPubKey {
                key_type: AMINO_SECP256K1_TYPE.to_string(),
                value: STANDARD.encode(compressed_pubkey),
            },
            signature: STANDARD.encode(signature),
        })
    }

    pub fn signature_bytes(&self) -> Result<Vec<u8>, CosmosError> {
        STANDARD
            .decode(&self.signature)
            .map_err(|e| CosmosError::InvalidFormat(format!("signature is not base64: {e}")))
    }
}
