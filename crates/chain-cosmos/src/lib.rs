//! Cosmos SDK chain support for the signer.
//!
//! This crate is key-free: it never sees a private key. It provides:
//! - Bech32 account addresses from compressed secp256k1 public keys
//! - Protobuf wire encoding for the `cosmos.tx.v1beta1` documents
//! - Public key `Any` wrappers, including legacy amino multisig thresholds
//! - Bank message variants and the immutable message registry
//! - Chain presets and JSON-loadable chain configuration

pub mod address;
pub mod chains;
pub mod error;
pub mod math;
pub mod messages;
pub mod protobuf;
pub mod pubkey;
pub mod registry;
pub mod tx;
