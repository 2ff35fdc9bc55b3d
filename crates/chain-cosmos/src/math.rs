//! Integer guards for values that cross the JSON transport.
//!
//! Account numbers, sequences and gas limits are carried as JSON numbers by
//! the REST and RPC endpoints, so anything above 2^53 - 1 would have been
//! rounded before it reached us. Such values are rejected instead of signed.

use crate::error::CosmosError;

/// Largest integer a JSON (IEEE-754 double) number represents exactly.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Returns `value` if it fits in 53 bits, else an `EncodingError` naming `field`.
pub fn check_int53(field: &str, value: u64) -> Result<u64, CosmosError> {
    if value > MAX_SAFE_INTEGER {
        return Err(CosmosError::EncodingError(format!(
            "{field} {value} exceeds the 53-bit safe integer range"
        )));
    }
    Ok(value)
}

/// Parses a decimal string as a non-negative 53-bit integer.
pub fn parse_int53(field: &str, input: &str) -> Result<u64, CosmosError> {
    if !is_decimal_digits(input) {
        return Err(CosmosError::EncodingError(format!(
            "{field} is not a non-negative integer: {input:?}"
        )));
    }
    let value = input.parse::<u64>().map_err(|_| {
        CosmosError::EncodingError(format!(
            "{field} {input} exceeds the 53-bit safe integer range"
        ))
    })?;
    check_int53(field, value)
}

/// Validates an arbitrary-precision unsigned decimal, as used for coin amounts.
pub fn check_uint_string(field: &str, input: &str) -> Result<(), CosmosError> {
    if !is_decimal_digits(input) {
        return Err(CosmosError::EncodingError(format!(
            "{field} is not an unsigned decimal integer: {input:?}"
        )));
    }
    Ok(())
}

fn is_decimal_digits(input: &str) -> bool {
    !input.is_empty() && input.bytes().all(|b| b.is_ascii_digit())
}
