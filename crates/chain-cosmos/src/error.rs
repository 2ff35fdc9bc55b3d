use thiserror::Error;

/// Cosmos chain encoding and address errors.
#[derive(Debug, Error)]
pub enum CosmosError {
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("unregistered type url: {0}")]
    UnregisteredType(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("invalid chain config: {0}")]
    InvalidConfig(String),
}
