//! Cosmos account addresses.
//!
//! An account address is `RIPEMD-160(SHA-256(compressed_pubkey))`, 20 bytes,
//! shown to users as a bech32 string under a chain-specific prefix
//! (`cosmos1...`, `sei1...`). Decoding is strict bech32: a bad checksum, mixed
//! case, a bech32m checksum or a payload other than 20 bytes is rejected.

use bech32::primitives::decode::CheckedHrpstring;
use bech32::{Bech32, Hrp};
use crypto_utils::hash::hash160;

use crate::error::CosmosError;

/// Width of a raw account address.
pub const ADDRESS_LENGTH: usize = 20;

/// Raw 20-byte account address from a 33-byte compressed secp256k1 key.
///
/// Fails with `InvalidFormat` for anything but 33 bytes beginning with 0x02
/// or 0x03; input is never truncated or padded.
pub fn pubkey_to_raw_address(compressed_pubkey: &[u8]) -> Result<[u8; ADDRESS_LENGTH], CosmosError> {
    if compressed_pubkey.len() != 33 {
        return Err(CosmosError::InvalidFormat(format!(
            "compressed secp256k1 pubkey must be 33 bytes, got {}",
            compressed_pubkey.len()
        )));
    }
    if compressed_pubkey[0] != 0x02 && compressed_pubkey[0] != 0x03 {
        return Err(CosmosError::InvalidFormat(format!(
            "compressed secp256k1 pubkey must start with 0x02 or 0x03, got 0x{:02x}",
            compressed_pubkey[0]
        )));
    }
    Ok(hash160(compressed_pubkey))
}

/// Bech32-encodes a raw address under `prefix`.
pub fn encode_human_address(prefix: &str, raw_address: &[u8; ADDRESS_LENGTH]) -> Result<String, CosmosError> {
    let hrp = parse_prefix(prefix)?;
    bech32::encode::<Bech32>(hrp, raw_address)
        .map_err(|e| CosmosError::InvalidAddress(format!("bech32 encoding failed: {e}")))
}

/// Decodes a bech32 address into `(prefix, raw_address)`.
///
/// The returned prefix is lower-case.
pub fn decode_human_address(address: &str) -> Result<(String, [u8; ADDRESS_LENGTH]), CosmosError> {
    let checked = CheckedHrpstring::new::<Bech32>(address)
        .map_err(|e| CosmosError::InvalidAddress(format!("{address}: {e}")))?;

    let prefix = checked.hrp().to_string().to_ascii_lowercase();
    let data: Vec<u8> = checked.byte_iter().collect();
    let raw: [u8; ADDRESS_LENGTH] = data.try_into().map_err(|v: Vec<u8>| {
        CosmosError::InvalidAddress(format!(
            "expected {ADDRESS_LENGTH} address bytes, got {}",
            v.len()
        ))
    })?;

    Ok((prefix, raw))
}

/// Decodes `address` and checks that it carries `expected_prefix`.
pub fn decode_human_address_with_prefix(
    address: &str,
    expected_prefix: &str,
) -> Result<[u8; ADDRESS_LENGTH], CosmosError> {
    let (prefix, raw) = decode_human_address(address)?;
    if prefix != expected_prefix {
        return Err(CosmosError::InvalidAddress(format!(
            "expected prefix '{expected_prefix}', got '{prefix}'"
        )));
    }
    Ok(raw)
}

/// Compressed pubkey straight to a bech32 address.
pub fn pubkey_to_address(compressed_pubkey: &[u8], prefix: &str) -> Result<String, CosmosError> {
    let raw = pubkey_to_raw_address(compressed_pubkey)?;
    encode_human_address(prefix, &raw)
}

/// Re-encodes an address under another chain's prefix.
pub fn convert_prefix(address: &str, new_prefix: &str) -> Result<String, CosmosError> {
    let (_, raw) = decode_human_address(address)?;
    encode_human_address(new_prefix, &raw)
}

/// Validates that `prefix` is a usable bech32 human-readable part.
pub fn validate_prefix(prefix: &str) -> Result<(), CosmosError> {
    parse_prefix(prefix).map(|_| ())
}

fn parse_prefix(prefix: &str) -> Result<Hrp, CosmosError> {
    if prefix.is_empty() || prefix.bytes().any(|b| b.is_ascii_uppercase()) {
        return Err(CosmosError::InvalidAddress(format!(
            "address prefix must be non-empty lower-case, got '{prefix}'"
        )));
    }
    Hrp::parse(prefix)
        .map_err(|e| CosmosError::InvalidAddress(format!("invalid address prefix '{prefix}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Compressed generator point G; its Hash160 is a well-known vector.
    const G_COMPRESSED: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const G_HASH160: &str = "751e76e8199196d454941c45d1b3a323f1433bd6";

    const BECH32_CHARSET: &str = "qpzry9x8gf2tvdw0s3jn54khce6mua7l";

    fn g_pubkey() -> Vec<u8> {
        hex::decode(G_COMPRESSED).unwrap()
    }

    #[test]
    fn raw_address_of_generator() {
        let raw = pubkey_to_raw_address(&g_pubkey()).unwrap();
        assert_eq!(hex::encode(raw), G_HASH160);
    }

    #[test]
    fn raw_address_is_pure() {
        let a = pubkey_to_raw_address(&g_pubkey()).unwrap();
        let b = pubkey_to_raw_address(&g_pubkey()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn raw_address_rejects_32_bytes() {
        let short = &g_pubkey()[..32];
        assert!(matches!(
            pubkey_to_raw_address(short),
            Err(CosmosError::InvalidFormat(_))
        ));
    }

    #[test]
    fn raw_address_rejects_uncompressed_and_bad_tag() {
        assert!(pubkey_to_raw_address(&[0x04; 65]).is_err());
        let mut bad_tag = g_pubkey();
        bad_tag[0] = 0x04;
        assert!(matches!(
            pubkey_to_raw_address(&bad_tag),
            Err(CosmosError::InvalidFormat(_))
        ));
    }

    #[test]
    fn encode_then_decode_recovers_raw_bytes() {
        for raw in [[0u8; 20], [0xFFu8; 20], {
            let mut r = [0u8; 20];
            for (i, b) in r.iter_mut().enumerate() {
                *b = (i as u8).wrapping_mul(37);
            }
            r
        }] {
            for prefix in ["cosmos", "sei", "osmo"] {
                let encoded = encode_human_address(prefix, &raw).unwrap();
                assert!(encoded.starts_with(&format!("{prefix}1")));
                let (decoded_prefix, decoded) = decode_human_address(&encoded).unwrap();
                assert_eq!(decoded_prefix, prefix);
                assert_eq!(decoded, raw);
            }
        }
    }

    #[test]
    fn any_single_character_corruption_is_rejected() {
        let raw = pubkey_to_raw_address(&g_pubkey()).unwrap();
        let encoded = encode_human_address("cosmos", &raw).unwrap();

        for (i, c) in encoded.char_indices() {
            let replacement = if c == 'q' { 'p' } else { 'q' };
            let mut corrupted = encoded.clone();
            corrupted.replace_range(i..i + 1, &replacement.to_string());
            assert!(
                decode_human_address(&corrupted).is_err(),
                "corruption at {i} was accepted: {corrupted}"
            );
        }
    }

    #[test]
    fn corruption_with_every_charset_symbol_is_rejected() {
        let raw = [0x5Au8; 20];
        let encoded = encode_human_address("sei", &raw).unwrap();
        let data_start = encoded.rfind('1').unwrap() + 1;

        for i in data_start..encoded.len() {
            let original = encoded.as_bytes()[i] as char;
            for symbol in BECH32_CHARSET.chars().filter(|s| *s != original) {
                let mut corrupted = encoded.clone();
                corrupted.replace_range(i..i + 1, &symbol.to_string());
                assert!(decode_human_address(&corrupted).is_err());
            }
        }
    }

    #[test]
    fn decode_with_expected_prefix() {
        let raw = [7u8; 20];
        let encoded = encode_human_address("cosmos", &raw).unwrap();
        assert_eq!(decode_human_address_with_prefix(&encoded, "cosmos").unwrap(), raw);
        assert!(decode_human_address_with_prefix(&encoded, "sei").is_err());
    }

    #[test]
    fn decode_accepts_all_upper_case() {
        let raw = [9u8; 20];
        let encoded = encode_human_address("cosmos", &raw).unwrap();
        let (prefix, decoded) = decode_human_address(&encoded.to_uppercase()).unwrap();
        assert_eq!(prefix, "cosmos");
        assert_eq!(decoded, raw);
    }

    #[test]
    fn decode_rejects_wrong_payload_length() {
        let hrp = Hrp::parse("cosmos").unwrap();
        let thirty_two = bech32::encode::<Bech32>(hrp, &[1u8; 32]).unwrap();
        assert!(matches!(
            decode_human_address(&thirty_two),
            Err(CosmosError::InvalidAddress(_))
        ));
    }

    #[test]
    fn decode_rejects_bech32m_checksum() {
        let hrp = Hrp::parse("cosmos").unwrap();
        let bech32m = bech32::encode::<bech32::Bech32m>(hrp, &[3u8; 20]).unwrap();
        assert!(decode_human_address(&bech32m).is_err());
    }

    #[test]
    fn convert_between_prefixes() {
        let cosmos = pubkey_to_address(&g_pubkey(), "cosmos").unwrap();
        let sei = convert_prefix(&cosmos, "sei").unwrap();
        assert!(sei.starts_with("sei1"));
        assert_eq!(convert_prefix(&sei, "cosmos").unwrap(), cosmos);
    }

    #[test]
    fn prefix_validation() {
        assert!(validate_prefix("cosmos").is_ok());
        assert!(validate_prefix("").is_err());
        assert!(validate_prefix("Cosmos").is_err());
    }
}
