use bip39::{Language, Mnemonic};
use crypto_utils::zeroizing::ZeroizingBytes;

use crate::error::SignerError;

/// Derive the 64-byte BIP-39 seed from a phrase and optional passphrase.
/// The seed is wiped when the returned buffer drops.
pub fn mnemonic_to_seed(phrase: &str, passphrase: &str) -> Result<ZeroizingBytes, SignerError> {
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
        .map_err(|e| SignerError::InvalidMnemonic(e.to_string()))?;

    let mut seed = mnemonic.to_seed(passphrase);
    let out = ZeroizingBytes::from(&seed[..]);
    zeroize::Zeroize::zeroize(&mut seed);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_mnemonic_to_seed_deterministic() {
        let seed1 = mnemonic_to_seed(TEST_MNEMONIC, "").unwrap();
        let seed2 = mnemonic_to_seed(TEST_MNEMONIC, "").unwrap();
        assert_eq!(&*seed1, &*seed2);
        assert_eq!(seed1.len(), 64);
    }

    #[test]
    fn test_passphrase_changes_seed() {
        let seed_no_pass = mnemonic_to_seed(TEST_MNEMONIC, "").unwrap();
        let seed_with_pass = mnemonic_to_seed(TEST_MNEMONIC, "mypassphrase").unwrap();
        assert_ne!(&*seed_no_pass, &*seed_with_pass);
    }

    #[test]
    fn test_bip39_test_vector() {
        let seed = mnemonic_to_seed(TEST_MNEMONIC, "").unwrap();
        assert_eq!(
            hex::encode(&*seed),
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc1\
             9a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
        );
    }

    #[test]
    fn test_invalid_mnemonic_error() {
        assert!(matches!(
            mnemonic_to_seed("not a real phrase", ""),
            Err(SignerError::InvalidMnemonic(_))
        ));
        // Valid words, bad checksum.
        assert!(matches!(
            mnemonic_to_seed(
                "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon",
                ""
            ),
            Err(SignerError::InvalidMnemonic(_))
        ));
    }
}
