//! # crypto-utils
//!
//! Hashing primitives and zero-on-drop containers for the secret material
//! that flows through the signing pipeline.

pub mod error;
pub mod hash;
pub mod zeroizing;

pub use error::CryptoError;
