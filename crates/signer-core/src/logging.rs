use tracing_subscriber::EnvFilter;

use crate::error::SignerError;

/// Directive used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,signer_core=debug";

/// Installs a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_directive`.
///
/// Returns `Ok(false)` if a global subscriber was already installed, so
/// embedding applications and tests can call it freely.
pub fn init(default_directive: &str) -> Result<bool, SignerError> {
    let fallback = EnvFilter::try_new(default_directive).map_err(|e| {
        SignerError::InvalidConfig(format!("log filter '{default_directive}': {e}"))
    })?;
    let filter = EnvFilter::try_from_default_env().unwrap_or(fallback);

    Ok(tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok())
}
