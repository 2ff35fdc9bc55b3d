use thiserror::Error;

/// Errors raised by the hashing and secret-buffer helpers.
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
