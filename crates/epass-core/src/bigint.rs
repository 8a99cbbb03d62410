//! # Integer / Byte Conversion
//!
//! Conversions between byte sequences, unsigned big integers, and their
//! hexadecimal and decimal text forms.
//!
//! ## Invariant
//!
//! [`bytes_to_integer`] and [`integer_to_bytes`] round-trip exactly for any
//! byte length: `integer_to_bytes(bytes_to_integer(b), b.len())` returns `b`
//! (leading zero bytes are restored by padding).

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

use crate::error::PassportError;

/// Byte order for integer encodings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ByteOrder {
    /// Most significant byte first. The order used by every ICAO structure.
    #[default]
    BigEndian,
    /// Least significant byte first.
    LittleEndian,
}

/// Interpret a byte sequence as a base-256 positional number.
pub fn bytes_to_integer(bytes: &[u8], order: ByteOrder) -> BigUint {
    match order {
        ByteOrder::BigEndian => BigUint::from_bytes_be(bytes),
        ByteOrder::LittleEndian => BigUint::from_bytes_le(bytes),
    }
}

/// Encode an integer as exactly `len` bytes, zero-padded.
///
/// # Errors
///
/// [`PassportError::ValueTooLarge`] if the value needs more than `len` bytes.
pub fn integer_to_bytes(
    value: &BigUint,
    len: usize,
    order: ByteOrder,
) -> Result<Vec<u8>, PassportError> {
    if value.is_zero() {
        return Ok(vec![0u8; len]);
    }
    let be = value.to_bytes_be();
    if be.len() > len {
        return Err(PassportError::ValueTooLarge {
            bits: value.bits(),
            capacity: (len as u64) * 8,
        });
    }
    let mut out = vec![0u8; len - be.len()];
    out.extend_from_slice(&be);
    if order == ByteOrder::LittleEndian {
        out.reverse();
    }
    Ok(out)
}

/// Parse hexadecimal text into an integer.
///
/// Case-insensitive, optional `0x`/`0X` prefix, surrounding whitespace
/// ignored.
///
/// # Errors
///
/// [`PassportError::MalformedInput`] on an empty digit string or any
/// non-hex character.
pub fn hex_to_integer(text: &str) -> Result<BigUint, PassportError> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(PassportError::malformed("empty hex string"));
    }
    if let Some((pos, c)) = digits.char_indices().find(|(_, c)| !c.is_ascii_hexdigit()) {
        return Err(PassportError::malformed(format!(
            "non-hex character {c:?} at position {pos}"
        )));
    }
    BigUint::parse_bytes(digits.as_bytes(), 16)
        .ok_or_else(|| PassportError::malformed("unparseable hex string"))
}

/// Parse decimal text into an integer.
///
/// # Errors
///
/// [`PassportError::MalformedInput`] on an empty string or non-digit
/// characters (signs are rejected; the domain is non-negative).
pub fn decimal_to_integer(text: &str) -> Result<BigUint, PassportError> {
    let digits = text.trim();
    if digits.is_empty() {
        return Err(PassportError::malformed("empty decimal string"));
    }
    if let Some((pos, c)) = digits.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        return Err(PassportError::malformed(format!(
            "non-decimal character {c:?} at position {pos}"
        )));
    }
    BigUint::parse_bytes(digits.as_bytes(), 10)
        .ok_or_else(|| PassportError::malformed("unparseable decimal string"))
}

/// Parse integer text whose radix is given by its prefix: `0x`/`0X` is
/// hexadecimal, anything else decimal.
pub fn parse_integer(text: &str) -> Result<BigUint, PassportError> {
    let trimmed = text.trim();
    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        hex_to_integer(trimmed)
    } else {
        decimal_to_integer(trimmed)
    }
}

/// Render an integer as lowercase hex without prefix.
pub fn integer_to_hex(value: &BigUint) -> String {
    value.to_str_radix(16)
}

/// Render an integer as decimal text.
pub fn integer_to_decimal(value: &BigUint) -> String {
    value.to_str_radix(10)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Bytes → integer → bytes (padded to the original length) is exact,
        /// including leading zero bytes.
        #[test]
        fn bytes_round_trip(bytes in prop::collection::vec(any::<u8>(), 0..300)) {
            let v = bytes_to_integer(&bytes, ByteOrder::BigEndian);
            let back = integer_to_bytes(&v, bytes.len(), ByteOrder::BigEndian).unwrap();
            prop_assert_eq!(bytes_to_integer(&back, ByteOrder::BigEndian), v);
            prop_assert_eq!(back, bytes);
        }

        /// Little-endian round trip.
        #[test]
        fn bytes_round_trip_le(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
            let v = bytes_to_integer(&bytes, ByteOrder::LittleEndian);
            let back = integer_to_bytes(&v, bytes.len(), ByteOrder::LittleEndian).unwrap();
            prop_assert_eq!(back, bytes);
        }

        /// Hex text of an integer parses back to the same integer.
        #[test]
        fn hex_round_trip(bytes in prop::collection::vec(any::<u8>(), 1..64)) {
            let v = bytes_to_integer(&bytes, ByteOrder::BigEndian);
            prop_assert_eq!(hex_to_integer(&integer_to_hex(&v)).unwrap(), v.clone());
            prop_assert_eq!(decimal_to_integer(&integer_to_decimal(&v)).unwrap(), v);
        }
    }
}
