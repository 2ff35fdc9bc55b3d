//! Deterministic transaction signing for Cosmos SDK chains.
//!
//! A [`KeySource`] goes in, a broadcast-ready [`SignedTx`] comes out. Account
//! lookup and transport sit behind the [`AccountProvider`] and
//! [`Broadcaster`] traits so the pipeline itself stays offline.

pub mod collaborators;
pub mod error;
pub mod hd_derivation;
pub mod logging;
pub mod mnemonic;
pub mod orchestrator;
pub mod secp256k1;
pub mod types;

pub use chain_cosmos::chains::ChainConfig;
pub use chain_cosmos::messages::{Coin, Message};
pub use chain_cosmos::registry::Registry;
pub use chain_cosmos::tx::{Fee, SignMode};
pub use collaborators::{AccountProvider, AccountState, BroadcastResponse, Broadcaster};
pub use error::{BroadcastFailureClass, SignerError, SigningContext, SigningStage};
pub use orchestrator::{BroadcastReceipt, SignRequest, Signer, SignerData};
pub use types::{CurveType, DerivedAccount, KeySource, SignedTx};

// ─── One-shot helpers ────────────────────────────────────────────────

/// Derive the address for a mnemonic on `chain`, using the bank registry.
pub fn derive_address(
    chain: &ChainConfig,
    phrase: &str,
    passphrase: &str,
) -> Result<DerivedAccount, SignerError> {
    let registry = Registry::with_bank_types();
    Signer::new(&registry, chain)?.derive_account(&KeySource::mnemonic(phrase, passphrase))
}

/// Sign offline with the bank registry.
pub fn sign_transaction(
    chain: &ChainConfig,
    key: KeySource,
    request: &SignRequest,
    signer_data: &SignerData,
) -> Result<SignedTx, SignerError> {
    let registry = Registry::with_bank_types();
    Signer::new(&registry, chain)?.sign(key, request, signer_data)
}
