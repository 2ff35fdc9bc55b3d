use std::fmt;

use chain_cosmos::error::CosmosError;
use crypto_utils::error::CryptoError;
use thiserror::Error;

/// Why a broadcast was refused by the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastFailureClass {
    /// The account sequence used for signing is stale. Refetch account
    /// state and sign again.
    SequenceMismatch,
    /// Any other non-zero delivery code.
    Delivery,
}

impl fmt::Display for BroadcastFailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BroadcastFailureClass::SequenceMismatch => f.write_str("sequence mismatch"),
            BroadcastFailureClass::Delivery => f.write_str("delivery failure"),
        }
    }
}

/// Pipeline stage a signing error was raised in. Hashing and assembly
/// cannot fail, so they have no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningStage {
    KeyDerived,
    DocumentBuilt,
    Signed,
    Broadcast,
}

impl fmt::Display for SigningStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SigningStage::KeyDerived => "key derivation",
            SigningStage::DocumentBuilt => "document build",
            SigningStage::Signed => "signing",
            SigningStage::Broadcast => "broadcast",
        };
        f.write_str(name)
    }
}

/// Public facts about a signing attempt, attached to every pipeline error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningContext {
    pub chain_id: String,
    pub address: Option<String>,
    pub account_number: Option<u64>,
    pub sequence: Option<u64>,
}

impl fmt::Display for SigningContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain {}", self.chain_id)?;
        if let Some(address) = &self.address {
            write!(f, ", address {address}")?;
        }
        if let Some(account_number) = self.account_number {
            write!(f, ", account {account_number}")?;
        }
        if let Some(sequence) = self.sequence {
            write!(f, ", sequence {sequence}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("unregistered type url: {0}")]
    UnregisteredType(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("account {0} does not exist on chain")]
    AccountNotFound(String),

    #[error("broadcast failed ({class}): code {code} codespace '{codespace}' tx {hash} height {height}: {raw_log}")]
    BroadcastFailure {
        class: BroadcastFailureClass,
        code: u32,
        codespace: String,
        hash: String,
        height: u64,
        raw_log: String,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("{stage} failed ({context}): {source}")]
    Signing {
        stage: SigningStage,
        context: Box<SigningContext>,
        #[source]
        source: Box<SignerError>,
    },
}

impl SignerError {
    /// Wraps `self` with the stage and public context of a signing attempt.
    pub fn in_stage(self, stage: SigningStage, context: &SigningContext) -> Self {
        SignerError::Signing {
            stage,
            context: Box::new(context.clone()),
            source: Box::new(self),
        }
    }

    /// The underlying error with any signing context removed.
    pub fn root(&self) -> &SignerError {
        match self {
            SignerError::Signing { source, .. } => source.root(),
            other => other,
        }
    }

    /// True when the chain rejected the transaction for a stale sequence.
    pub fn is_sequence_mismatch(&self) -> bool {
        matches!(
            self.root(),
            SignerError::BroadcastFailure {
                class: BroadcastFailureClass::SequenceMismatch,
                ..
            }
        )
    }
}

impl From<CosmosError> for SignerError {
    fn from(e: CosmosError) -> Self {
        match e {
            CosmosError::InvalidFormat(m) => SignerError::InvalidFormat(m),
            CosmosError::InvalidAddress(m) => SignerError::InvalidFormat(format!("address: {m}")),
            CosmosError::UnregisteredType(m) => SignerError::UnregisteredType(m),
            CosmosError::EncodingError(m) => SignerError::EncodingError(m),
            CosmosError::InvalidConfig(m) => SignerError::InvalidConfig(m),
        }
    }
}

impl From<CryptoError> for SignerError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidKeyLength { .. } | CryptoError::InvalidHex(_) => {
                SignerError::InvalidKey(e.to_string())
            }
            CryptoError::InvalidInput(m) => SignerError::InvalidFormat(m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> SigningContext {
        SigningContext {
            chain_id: "test-1".into(),
            address: Some("cosmos1abc".into()),
            account_number: Some(12),
            sequence: Some(5),
        }
    }

    #[test]
    fn display_invalid_key() {
        let err = SignerError::InvalidKey("scalar is zero".into());
        assert_eq!(err.to_string(), "invalid key: scalar is zero");
    }

    #[test]
    fn display_invalid_format() {
        let err = SignerError::InvalidFormat("expected 65 bytes".into());
        assert_eq!(err.to_string(), "invalid format: expected 65 bytes");
    }

    #[test]
    fn display_invalid_mnemonic() {
        let err = SignerError::InvalidMnemonic("bad checksum".into());
        assert_eq!(err.to_string(), "invalid mnemonic: bad checksum");
    }

    #[test]
    fn display_account_not_found() {
        let err = SignerError::AccountNotFound("cosmos1abc".into());
        assert_eq!(err.to_string(), "account cosmos1abc does not exist on chain");
    }

    #[test]
    fn display_broadcast_failure() {
        let err = SignerError::BroadcastFailure {
            class: BroadcastFailureClass::SequenceMismatch,
            code: 32,
            codespace: "sdk".into(),
            hash: "ABCD".into(),
            height: 0,
            raw_log: "account sequence mismatch".into(),
        };
        assert_eq!(
            err.to_string(),
            "broadcast failed (sequence mismatch): code 32 codespace 'sdk' tx ABCD height 0: account sequence mismatch"
        );
        assert!(err.is_sequence_mismatch());
    }

    #[test]
    fn display_network() {
        let err = SignerError::Network("connection refused".into());
        assert_eq!(err.to_string(), "network error: connection refused");
    }

    #[test]
    fn signing_context_in_message() {
        let err = SignerError::EncodingError("gas limit too large".into())
            .in_stage(SigningStage::DocumentBuilt, &context());
        assert_eq!(
            err.to_string(),
            "document build failed (chain test-1, address cosmos1abc, account 12, sequence 5): encoding error: gas limit too large"
        );
        assert!(matches!(err.root(), SignerError::EncodingError(_)));
    }

    #[test]
    fn context_without_address() {
        let ctx = SigningContext {
            chain_id: "test-1".into(),
            ..Default::default()
        };
        let err = SignerError::InvalidKey("bad path".into()).in_stage(SigningStage::KeyDerived, &ctx);
        assert_eq!(
            err.to_string(),
            "key derivation failed (chain test-1): invalid key: bad path"
        );
    }

    #[test]
    fn cosmos_errors_map_one_to_one() {
        let err: SignerError = CosmosError::UnregisteredType("/x.Y".into()).into();
        assert!(matches!(err, SignerError::UnregisteredType(ref u) if u == "/x.Y"));

        let err: SignerError = CosmosError::EncodingError("overflow".into()).into();
        assert!(matches!(err, SignerError::EncodingError(_)));

        let err: SignerError = CosmosError::InvalidFormat("33 bytes".into()).into();
        assert!(matches!(err, SignerError::InvalidFormat(_)));
    }

    #[test]
    fn crypto_errors_map_to_invalid_key() {
        let err: SignerError = CryptoError::InvalidKeyLength {
            expected: 32,
            actual: 31,
        }
        .into();
        assert!(matches!(err, SignerError::InvalidKey(_)));
    }

    #[test]
    fn debug_format_works() {
        let err = SignerError::Network("timeout".into());
        assert!(format!("{err:?}").contains("Network"));
    }
}
