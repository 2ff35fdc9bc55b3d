//! SLIP-10 hierarchical derivation, parametrized by curve.
//!
//! For secp256k1 this is exactly BIP-32 private derivation. Ed25519 supports
//! hardened children only. An intermediate key that falls outside the curve
//! order (probability below 2^-127) is an `InvalidKey` error for that path;
//! the next index is never tried in its place.

use std::fmt;
use std::str::FromStr;

use chain_cosmos::pubkey::PublicKey;
use crypto_utils::hash::hmac_sha512;
use crypto_utils::zeroizing::SecretBytes;
use k256::elliptic_curve::PrimeField;
use k256::{FieldBytes, Scalar};
use zeroize::Zeroize;

use crate::error::SignerError;
use crate::secp256k1::{public_key_compressed, SecretKey};
use crate::types::CurveType;

/// Shortest seed accepted (128 bits).
pub const MIN_SEED_LEN: usize = 16;

const HARDENED_BIT: u32 = 0x8000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildIndex {
    Normal(u32),
    Hardened(u32),
}

impl ChildIndex {
    /// The 32-bit index as it enters the HMAC, hardened bit included.
    pub fn raw(&self) -> u32 {
        match self {
            ChildIndex::Normal(i) => *i,
            ChildIndex::Hardened(i) => *i | HARDENED_BIT,
        }
    }

    pub fn is_hardened(&self) -> bool {
        matches!(self, ChildIndex::Hardened(_))
    }
}

impl fmt::Display for ChildIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildIndex::Normal(i) => write!(f, "{i}"),
            ChildIndex::Hardened(i) => write!(f, "{i}'"),
        }
    }
}

/// A parsed path such as `m/44'/118'/0'/0/0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivationPath(Vec<ChildIndex>);

impl DerivationPath {
    pub fn indices(&self) -> &[ChildIndex] {
        &self.0
    }
}

impl FromStr for DerivationPath {
    type Err = SignerError;

    /// Parse "m/44'/118'/0'/0/0". `'`, `h` and `H` all mark a hardened index.
    fn from_str(path: &str) -> Result<Self, Self::Err> {
        let rest = match path {
            "m" => return Ok(DerivationPath(Vec::new())),
            _ => path
                .strip_prefix("m/")
                .ok_or_else(|| SignerError::InvalidKey(format!("path must start with m/: {path}")))?,
        };

        rest.split('/')
            .map(|component| {
                let (digits, hardened) = match component
                    .strip_suffix('\'')
                    .or_else(|| component.strip_suffix('h'))
                    .or_else(|| component.strip_suffix('H'))
                {
                    Some(digits) => (digits, true),
                    None => (component, false),
                };
                if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(SignerError::InvalidKey(format!(
                        "invalid path component '{component}' in {path}"
                    )));
                }
                let index = digits.parse::<u32>().ok().filter(|i| *i < HARDENED_BIT).ok_or_else(|| {
                    SignerError::InvalidKey(format!("path index {digits} must be below 2^31"))
                })?;
                Ok(if hardened {
                    ChildIndex::Hardened(index)
                } else {
                    ChildIndex::Normal(index)
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(DerivationPath)
    }
}

impl fmt::Display for DerivationPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("m")?;
        for index in &self.0 {
            write!(f, "/{index}")?;
        }
        Ok(())
    }
}

/// Private key plus chain code. Both halves are wiped on drop.
#[derive(Debug)]
pub struct ExtendedPrivateKey {
    curve: CurveType,
    key: SecretKey,
    chain_code: SecretBytes<32>,
}

impl ExtendedPrivateKey {
    pub fn curve(&self) -> CurveType {
        self.curve
    }

    pub fn private_key(&self) -> &SecretKey {
        &self.key
    }

    pub fn chain_code(&self) -> &[u8; 32] {
        self.chain_code.expose()
    }

    pub fn into_private_key(self) -> SecretKey {
        self.key
    }

    /// The key as it would sit in a `SignerInfo`.
    pub fn public_key(&self) -> Result<PublicKey, SignerError> {
        match self.curve {
            CurveType::Secp256k1 => Ok(PublicKey::Secp256k1(public_key_compressed(&self.key)?)),
            CurveType::Ed25519 => {
                let signing_key = ed25519_dalek::SigningKey::from_bytes(self.key.expose());
                Ok(PublicKey::Ed25519(signing_key.verifying_key().to_bytes()))
            }
        }
    }

    /// Splits an HMAC-SHA512 output into a key and chain code.
    fn from_hmac(curve: CurveType, output: &[u8; 64]) -> Result<Self, SignerError> {
        Ok(Self {
            curve,
            key: SecretKey::from_slice(&output[..32])?,
            chain_code: SecretBytes::from_slice(&output[32..])?,
        })
    }
}

/// Master key: `HMAC-SHA512(curve label, seed)`.
pub fn master_key(curve: CurveType, seed: &[u8]) -> Result<ExtendedPrivateKey, SignerError> {
    if seed.len() < MIN_SEED_LEN {
        return Err(SignerError::InvalidKey(format!(
            "seed must be at least {MIN_SEED_LEN} bytes, got {}",
            seed.len()
        )));
    }
    let output = hmac_sha512(curve.seed_label(), &[seed])?;
    if curve == CurveType::Secp256k1 {
        let mut il = [0u8; 32];
        il.copy_from_slice(&output[..32]);
        let valid = parse_nonzero_scalar(&il).is_some();
        il.zeroize();
        if !valid {
            return Err(SignerError::InvalidKey(
                "master key is zero or not below the curve order".into(),
            ));
        }
    }
    ExtendedPrivateKey::from_hmac(curve, &output)
}

/// One derivation step.
pub fn derive_child(parent: &ExtendedPrivateKey, index: ChildIndex) -> Result<ExtendedPrivateKey, SignerError> {
    let index_bytes = index.raw().to_be_bytes();
    match parent.curve {
        CurveType::Ed25519 => {
            if !index.is_hardened() {
                return Err(SignerError::InvalidKey(format!(
                    "ed25519 supports hardened derivation only, got {index}"
                )));
            }
            let output = hmac_sha512(
                parent.chain_code(),
                &[&[0x00u8][..], &parent.key.expose()[..], &index_bytes[..]],
            )?;
            ExtendedPrivateKey::from_hmac(CurveType::Ed25519, &output)
        }
        CurveType::Secp256k1 => {
            let output = if index.is_hardened() {
                hmac_sha512(
                    parent.chain_code(),
                    &[&[0x00u8][..], &parent.key.expose()[..], &index_bytes[..]],
                )?
            } else {
                let parent_public = public_key_compressed(&parent.key)?;
                hmac_sha512(parent.chain_code(), &[&parent_public[..], &index_bytes[..]])?
            };

            let mut il = [0u8; 32];
            il.copy_from_slice(&output[..32]);
            let tweak = parse_scalar(&il);
            il.zeroize();
            let mut tweak = tweak.ok_or_else(|| {
                SignerError::InvalidKey(format!("tweak for index {index} is not below the curve order"))
            })?;
            let Some(mut parent_scalar) = parse_nonzero_scalar(parent.key.expose()) else {
                tweak.zeroize();
                return Err(SignerError::InvalidKey("parent key is out of range".into()));
            };

            let mut child = parent_scalar + tweak;
            parent_scalar.zeroize();
            tweak.zeroize();
            if bool::from(child.is_zero()) {
                return Err(SignerError::InvalidKey(format!(
                    "child key for index {index} is zero"
                )));
            }

            let mut child_repr = child.to_bytes();
            child.zeroize();
            let mut child_bytes = [0u8; 32];
            child_bytes.copy_from_slice(&child_repr);
            child_repr.as_mut_slice().zeroize();
            let mut chain_code = [0u8; 32];
            chain_code.copy_from_slice(&output[32..]);
            Ok(ExtendedPrivateKey {
                curve: CurveType::Secp256k1,
                key: SecretKey::from_array(&mut child_bytes),
                chain_code: SecretBytes::from_array(&mut chain_code),
            })
        }
    }
}

/// Derives the key at `path` from `seed`.
pub fn derive_path(
    curve: CurveType,
    seed: &[u8],
    path: &DerivationPath,
) -> Result<ExtendedPrivateKey, SignerError> {
    let mut key = master_key(curve, seed)?;
    for index in path.indices() {
        key = derive_child(&key, *index)?;
    }
    Ok(key)
}

/// A scalar in `[0, n)`.
fn parse_scalar(bytes: &[u8; 32]) -> Option<Scalar> {
    let repr: FieldBytes = (*bytes).into();
    Option::from(Scalar::from_repr(repr))
}

/// A scalar in `[1, n)`.
fn parse_nonzero_scalar(bytes: &[u8; 32]) -> Option<Scalar> {
    parse_scalar(bytes).filter(|s| !bool::from(s.is_zero()))
}
