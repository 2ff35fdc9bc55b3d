//! secp256k1 key operations: public key derivation, SEC1 compression and
//! deterministic (RFC 6979) low-S ECDSA over a 32-byte digest.
//!
//! Signatures are the fixed 64-byte `r || s` form, never DER.

use crypto_utils::zeroizing::SecretBytes;
use k256::ecdsa::signature::hazmat::{PrehashSigner, PrehashVerifier};
use k256::ecdsa::{Signature as EcdsaSignature, SigningKey, VerifyingKey};

use crate::error::SignerError;

/// A 32-byte secp256k1 private scalar, wiped on drop.
pub type SecretKey = SecretBytes<32>;

/// `n / 2`, the largest canonical `s`.
const HALF_ORDER: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b, 0x20, 0xa0,
];

/// ECDSA signature as two 32-byte big-endian integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub r: [u8; 32],
    pub s: [u8; 32],
}

impl Signature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignerError> {
        if bytes.len() != 64 {
            return Err(SignerError::InvalidFormat(format!(
                "signature must be 64 bytes (r || s), got {}",
                bytes.len()
            )));
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);
        Ok(Self { r, s })
    }

    pub fn to_bytes(&self) -> [u8; 64] {
        let mut out = [0u8; 64];
        out[..32].copy_from_slice(&self.r);
        out[32..].copy_from_slice(&self.s);
        out
    }

    /// `s <= n / 2`.
    pub fn is_low_s(&self) -> bool {
        self.s <= HALF_ORDER
    }
}

fn signing_key(secret: &SecretKey) -> Result<SigningKey, SignerError> {
    SigningKey::from_slice(secret.expose()).map_err(|_| {
        SignerError::InvalidKey("private key is zero or not below the curve order".into())
    })
}

/// `0x04 || X || Y` for the key's public point.
pub fn public_key_uncompressed(secret: &SecretKey) -> Result<[u8; 65], SignerError> {
    let key = signing_key(secret)?;
    let point = key.verifying_key().to_encoded_point(false);
    let mut out = [0u8; 65];
    out.copy_from_slice(point.as_bytes());
    Ok(out)
}

/// Compressed public key of `secret`.
pub fn public_key_compressed(secret: &SecretKey) -> Result<[u8; 33], SignerError> {
    compress_public_key(&public_key_uncompressed(secret)?)
}

/// Compresses a 65-byte SEC1 point to 33 bytes: `0x02 | parity(Y)`, then X.
pub fn compress_public_key(uncompressed: &[u8]) -> Result<[u8; 33], SignerError> {
    if uncompressed.len() != 65 {
        return Err(SignerError::InvalidFormat(format!(
            "uncompressed public key must be 65 bytes, got {}",
            uncompressed.len()
        )));
    }
    if uncompressed[0] != 0x04 {
        return Err(SignerError::InvalidFormat(format!(
            "uncompressed public key must start with 0x04, got 0x{:02x}",
            uncompressed[0]
        )));
    }
    k256::PublicKey::from_sec1_bytes(uncompressed)
        .map_err(|_| SignerError::InvalidFormat("public key is not a point on secp256k1".into()))?;

    let mut out = [0u8; 33];
    out[0] = 0x02 | (uncompressed[64] & 1);
    out[1..].copy_from_slice(&uncompressed[1..33]);
    Ok(out)
}

/// Signs a 32-byte digest. The nonce comes from RFC 6979, so the same
/// `(secret, digest)` always gives the same signature; `s` is normalized to
/// the lower half of the order.
pub fn sign_digest(secret: &SecretKey, digest: &[u8; 32]) -> Result<Signature, SignerError> {
    let key = signing_key(secret)?;
    let sig: EcdsaSignature = key
        .sign_prehash(digest)
        .map_err(|e| SignerError::InvalidKey(format!("ecdsa signing failed: {e}")))?;
    let sig = sig.normalize_s().unwrap_or(sig);
    Signature::from_bytes(&sig.to_bytes())
}

/// Verifies a low-S signature over `digest` against a SEC1 public key.
pub fn verify_digest(public_key: &[u8], digest: &[u8; 32], signature: &Signature) -> Result<(), SignerError> {
    if !signature.is_low_s() {
        return Err(SignerError::InvalidFormat("signature s is not in low-S form".into()));
    }
    let key = VerifyingKey::from_sec1_bytes(public_key)
        .map_err(|_| SignerError::InvalidFormat("public key is not a point on secp256k1".into()))?;
    let sig = EcdsaSignature::from_slice(&signature.to_bytes())
        .map_err(|e| SignerError::InvalidFormat(format!("malformed signature: {e}")))?;
    key.verify_prehash(digest, &sig)
        .map_err(|_| SignerError::InvalidFormat("signature does not verify".into()))
}
