use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chain_cosmos::pubkey::StdSignature;
use chain_cosmos::tx::TxRaw;
use crypto_utils::hash::sha256;
use crypto_utils::zeroizing::ZeroizingString;
use serde::{Deserialize, Serialize};

use crate::error::SignerError;
use crate::secp256k1::SecretKey;

/// Elliptic curve an HD key is derived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurveType {
    Secp256k1,
    Ed25519,
}

impl CurveType {
    /// HMAC key that seeds the master key (SLIP-10).
    pub fn seed_label(&self) -> &'static [u8] {
        match self {
            CurveType::Secp256k1 => b"Bitcoin seed",
            CurveType::Ed25519 => b"ed25519 seed",
        }
    }
}

/// Secret material a signing call starts from.
///
/// Consumed by the call that uses it; every variant wipes itself on drop.
pub enum KeySource {
    /// BIP-39 phrase plus optional passphrase.
    Mnemonic {
        phrase: ZeroizingString,
        passphrase: ZeroizingString,
    },
    /// A raw secp256k1 private key. The chain's derivation path is not used.
    PrivateKey(SecretKey),
}

impl KeySource {
    pub fn mnemonic(phrase: impl Into<ZeroizingString>, passphrase: impl Into<ZeroizingString>) -> Self {
        KeySource::Mnemonic {
            phrase: phrase.into(),
            passphrase: passphrase.into(),
        }
    }

    /// Parses a 32-byte private key from hex, with or without `0x`.
    pub fn private_key_hex(hex_key: &str) -> Result<Self, SignerError> {
        Ok(KeySource::PrivateKey(SecretKey::from_hex(hex_key)?))
    }

    /// Takes a raw private key, wiping the caller's copy.
    pub fn private_key(bytes: &mut [u8; 32]) -> Self {
        KeySource::PrivateKey(SecretKey::from_array(bytes))
    }
}

impl fmt::Debug for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Mnemonic { .. } => f.write_str("KeySource::Mnemonic([REDACTED])"),
            KeySource::PrivateKey(_) => f.write_str("KeySource::PrivateKey([REDACTED])"),
        }
    }
}

/// Public view of a derived account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedAccount {
    pub address: String,
    pub public_key: [u8; 33],
    /// `None` when the key was supplied directly rather than derived.
    pub derivation_path: Option<String>,
}

impl DerivedAccount {
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key)
    }
}

/// An assembled, signed transaction ready for transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTx {
    tx_raw: TxRaw,
    bytes: Vec<u8>,
    signer_public_key: [u8; 33],
}

impl SignedTx {
    pub(crate) fn new(tx_raw: TxRaw, signer_public_key: [u8; 33]) -> Self {
        let bytes = tx_raw.encode();
        Self {
            tx_raw,
            bytes,
            signer_public_key,
        }
    }

    pub fn tx_raw(&self) -> &TxRaw {
        &self.tx_raw
    }

    /// Encoded `TxRaw`.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Transport form accepted by `broadcast_tx_sync`.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Transaction hash as reported by the chain: upper-case hex SHA-256 of
    /// the encoded bytes.
    pub fn hash(&self) -> String {
        hex::encode_upper(sha256(&self.bytes))
    }

    /// The single `r || s` signature.
    pub fn signature(&self) -> &[u8] {
        self.tx_raw
            .signatures
            .first()
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn std_signature(&self) -> Result<StdSignature, SignerError> {
        Ok(StdSignature::secp256k1(&self.signer_public_key, self.signature())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_labels() {
        assert_eq!(CurveType::Secp256k1.seed_label(), b"Bitcoin seed");
        assert_eq!(CurveType::Ed25519.seed_label(), b"ed25519 seed");
    }

    #[test]
    fn key_source_debug_is_redacted() {
        let source = KeySource::mnemonic("abandon abandon about", "");
        assert!(!format!("{source:?}").contains("abandon"));

        let source = KeySource::private_key_hex(
            "0x84174d395ab1653f41904454a2885f61196cb624c6cc1dafccfc93bdeb99f05b",
        )
        .unwrap();
        let debug = format!("{source:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("84174d"));
    }

    #[test]
    fn private_key_hex_rejects_wrong_length() {
        assert!(matches!(
            KeySource::private_key_hex("abcd"),
            Err(SignerError::InvalidKey(_))
        ));
        assert!(KeySource::private_key_hex("zz").is_err());
    }

    #[test]
    fn private_key_wipes_source() {
        let mut raw = [9u8; 32];
        let _source = KeySource::private_key(&mut raw);
        assert_eq!(raw, [0u8; 32]);
    }

    #[test]
    fn signed_tx_views() {
        let tx = TxRaw {
            body_bytes: vec![1],
            auth_info_bytes: vec![2],
            signatures: vec![vec![3u8; 64]],
        };
        let mut pubkey = [0x02u8; 33];
        pubkey[1] = 0x79;
        let signed = SignedTx::new(tx.clone(), pubkey);

        assert_eq!(signed.bytes(), tx.encode().as_slice());
        assert_eq!(signed.to_hex(), hex::encode(tx.encode()));
        assert_eq!(STANDARD.decode(signed.to_base64()).unwrap(), tx.encode());
        assert_eq!(signed.hash(), hex::encode_upper(sha256(&tx.encode())));
        assert_eq!(signed.hash().len(), 64);
        assert_eq!(signed.signature(), &[3u8; 64][..]);

        let std_sig = signed.std_signature().unwrap();
        assert_eq!(std_sig.signature_bytes().unwrap(), vec![3u8; 64]);
    }
}
