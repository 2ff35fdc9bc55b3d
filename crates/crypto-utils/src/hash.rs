use hmac::{Hmac, Mac};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512};
use zeroize::Zeroizing;

use crate::error::CryptoError;

type HmacSha512 = Hmac<Sha512>;

/// SHA-256 digest of `data`.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// RIPEMD-160 digest of `data`.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(data).into()
}

/// Hash160: `RIPEMD-160(SHA-256(data))`.
///
/// This is the account-address digest for secp256k1 keys.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}

/// HMAC-SHA512 keyed by `key` over the concatenation of `parts`.
///
/// The output typically holds key material (master keys, child tweaks), so
/// it is returned in a buffer that is wiped when dropped.
pub fn hmac_sha512(key: &[u8], parts: &[&[u8]]) -> Result<Zeroizing<[u8; 64]>, CryptoError> {
    let mut mac = HmacSha512::new_from_slice(key)
        .map_err(|e| CryptoError::InvalidInput(format!("hmac key rejected: {e}")))?;
    for part in parts {
        mac.update(part);
    }
    let mut out = Zeroizing::new([0u8; 64]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_abc() {
        assert_eq!(
            hex::encode(sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn ripemd160_abc() {
        assert_eq!(
            hex::encode(ripemd160(b"abc")),
            "8eb208f7e05d987a9b044a8e98c6b087f15a0bfc"
        );
    }

    #[test]
    fn hash160_of_generator_point() {
        // Compressed secp256k1 generator G.
        let g = hex::decode("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798")
            .unwrap();
        assert_eq!(
            hex::encode(hash160(&g)),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    #[test]
    fn hmac_sha512_rfc4231_case_2() {
        let out = hmac_sha512(b"Jefe", &[&b"what do ya want "[..], &b"for nothing?"[..]]).unwrap();
        assert_eq!(
            hex::encode(&out[..]),
            "164b7a7bfcf819e2e395fbe73b56e0a387bd64222e831fd610270cd7ea250554\
             9758bf75c05a994a6d034f65f8f0e6fdcaeab1a34d4a6b4b636e070a38bce737"
        );
    }

    #[test]
    fn hmac_parts_equal_single_buffer() {
        let split = hmac_sha512(b"key", &[&b"ab"[..], &b""[..], &b"cd"[..]]).unwrap();
        let whole = hmac_sha512(b"key", &[&b"abcd"[..]]).unwrap();
        assert_eq!(&split[..], &whole[..]);
    }

    #[test]
    fn hashes_are_pure() {
        assert_eq!(hash160(b"same input"), hash160(b"same input"));
        assert_ne!(sha256(b"a"), sha256(b"b"));
    }
}
