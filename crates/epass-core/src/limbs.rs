//! # Limb Decomposition
//!
//! Splits big integers into fixed-width limbs sized to a circuit's native
//! arithmetic width, and joins them back.
//!
//! Limbs are little-limb-first:
//! `value = Σ limb[i] * 2^(width * i)`.
//!
//! ## Invariant
//!
//! A split never truncates. If `value >= 2^(count * width)` the split fails
//! with [`PassportError::ValueTooLarge`]; a proof built over a silently
//! truncated modulus would fail in ways that are very hard to trace back.

use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};

use crate::bigint::decimal_to_integer;
use crate::error::PassportError;

/// Widest limb accepted. Circuit fields are at most a few hundred bits wide.
pub const MAX_LIMB_WIDTH: u32 = 256;

/// Limb shape of a circuit input: `count` limbs of `width` bits each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LimbSpec {
    /// Number of limbs.
    pub count: usize,
    /// Bits per limb.
    pub width: u32,
}

impl LimbSpec {
    /// Create a limb shape. Call [`LimbSpec::validate`] before use on
    /// untrusted configuration.
    pub const fn new(count: usize, width: u32) -> Self {
        Self { count, width }
    }

    /// Reject shapes that cannot hold any value.
    pub fn validate(&self) -> Result<(), PassportError> {
        if self.count == 0 {
            return Err(PassportError::config("limb count must be at least 1"));
        }
        if self.width == 0 || self.width > MAX_LIMB_WIDTH {
            return Err(PassportError::config(format!(
                "limb width {} outside 1..={MAX_LIMB_WIDTH}",
                self.width
            )));
        }
        Ok(())
    }

    /// Total number of bits representable.
    pub fn capacity_bits(&self) -> u64 {
        self.count as u64 * u64::from(self.width)
    }

    /// Smallest limb count of `width` bits that holds `bits` bits.
    pub fn required_count(bits: u64, width: u32) -> usize {
        if width == 0 {
            return 0;
        }
        bits.div_ceil(u64::from(width)) as usize
    }

    /// Whether `value` fits without loss.
    pub fn fits(&self, value: &BigUint) -> bool {
        value.bits() <= self.capacity_bits()
    }

    /// Split `value` with this shape.
    pub fn split(&self, value: &BigUint) -> Result<Vec<BigUint>, PassportError> {
        split_to_limbs(value, self.count, self.width)
    }
}

impl std::fmt::Display for LimbSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}-bit", self.count, self.width)
    }
}

fn limb_mask(width: u32) -> BigUint {
    (BigUint::one() << width) - BigUint::one()
}

/// Split `value` into exactly `count` limbs of `width` bits.
///
/// Extracts the low `width` bits and shifts right, `count` times.
///
/// # Errors
///
/// - [`PassportError::ConfigurationMismatch`] for a zero count or a width
///   outside `1..=MAX_LIMB_WIDTH`.
/// - [`PassportError::ValueTooLarge`] if anything remains after `count`
///   extractions.
pub fn split_to_limbs(
    value: &BigUint,
    count: usize,
    width: u32,
) -> Result<Vec<BigUint>, PassportError> {
    let spec = LimbSpec::new(count, width);
    spec.validate()?;

    let mask = limb_mask(width);
    let mut rest = value.clone();
    let mut limbs = Vec::with_capacity(count);
    for _ in 0..count {
        limbs.push(&rest & &mask);
        rest >>= width;
    }
    if !rest.is_zero() {
        return Err(PassportError::ValueTooLarge {
            bits: value.bits(),
            capacity: spec.capacity_bits(),
        });
    }
    Ok(limbs)
}

/// Join little-limb-first limbs of `width` bits back into an integer.
///
/// # Errors
///
/// [`PassportError::MalformedInput`] if a limb is not below `2^width`,
/// [`PassportError::ConfigurationMismatch`] for an invalid width.
pub fn join_limbs(limbs: &[BigUint], width: u32) -> Result<BigUint, PassportError> {
    if width == 0 || width > MAX_LIMB_WIDTH {
        return Err(PassportError::config(format!(
            "limb width {width} outside 1..={MAX_LIMB_WIDTH}"
        )));
    }
    let mut acc = BigUint::zero();
    for (i, limb) in limbs.iter().enumerate().rev() {
        if limb.bits() > u64::from(width) {
            return Err(PassportError::malformed(format!(
                "limb {i} has {} bits, exceeds width {width}",
                limb.bits()
            )));
        }
        acc <<= width;
        acc |= limb;
    }
    Ok(acc)
}

/// Render limbs as decimal strings.
pub fn limbs_to_decimal(limbs: &[BigUint]) -> Vec<String> {
    limbs.iter().map(|l| l.to_str_radix(10)).collect()
}

/// Parse decimal-string limbs.
pub fn limbs_from_decimal(limbs: &[String]) -> Result<Vec<BigUint>, PassportError> {
    limbs.iter().map(|l| decimal_to_integer(l)).collect()
}
