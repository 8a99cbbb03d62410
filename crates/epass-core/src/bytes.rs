//! # Byte Primitives
//!
//! Constant-time comparison and signed-byte normalization.
//!
//! Source records frequently store bytes as Java-style signed values
//! (`-128..=127`), sometimes mixed with unsigned ones. Everything past
//! ingestion works on `u8`.

use subtle::ConstantTimeEq;

use crate::error::PassportError;

/// Compare two byte sequences for equality.
///
/// Lengths are compared first (length is not secret); the byte contents are
/// compared with [`subtle::ConstantTimeEq`] so the comparison does not
/// short-circuit on the first differing byte.
pub fn bytes_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    bool::from(a.ct_eq(b))
}

/// Map a signed 8-bit value to its unsigned equivalent modulo 256.
///
/// `-1 → 255`, `0 → 0`, `127 → 127`, `-128 → 128`.
pub fn normalize_byte(value: i8) -> u8 {
    i16::from(value).rem_euclid(256) as u8
}

/// Normalize a byte value that may be signed or unsigned.
///
/// Accepts `-128..=255`. Anything else cannot be a byte in either
/// representation and is rejected.
pub fn normalize_byte_value(value: i64) -> Result<u8, PassportError> {
    match value {
        -128..=-1 => Ok(normalize_byte(value as i8)),
        0..=255 => Ok(value as u8),
        _ => Err(PassportError::malformed(format!(
            "byte value {value} outside -128..=255"
        ))),
    }
}

/// Normalize a sequence of signed-or-unsigned byte values.
pub fn normalize_bytes(values: &[i64]) -> Result<Vec<u8>, PassportError> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            normalize_byte_value(*v).map_err(|e| match e {
                PassportError::MalformedInput(msg) => {
                    PassportError::malformed(format!("index {i}: {msg}"))
                }
                other => other,
            })
        })
        .collect()
}

/// Render each byte as its decimal string, the textual field-element form
/// circuit inputs use.
pub fn to_decimal_strings(bytes: &[u8]) -> Vec<String> {
    bytes.iter().map(|b| b.to_string()).collect()
}
