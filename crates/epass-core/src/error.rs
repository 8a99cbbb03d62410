//! # Error Types — Pipeline Failure Taxonomy
//!
//! Every failure the canonicalization pipeline can report. All variants
//! abort processing of the record they were raised for; none are retried
//! internally.
//!
//! ## Design
//!
//! - Length errors carry expected and actual values.
//! - Placement errors carry the offset, length and both digests in hex so
//!   a template misidentification can be diagnosed from the message alone.
//! - Capacity errors carry the bit counts on both sides.

use thiserror::Error;

/// Top-level error type for the ePassport circuit-input stack.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PassportError {
    /// Unparseable hex or decimal text, out-of-range byte values, characters
    /// outside the MRZ alphabet, or structurally invalid records.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// The canonical MRZ byte length does not match the document type.
    #[error("invalid MRZ length: expected {expected}, got {actual}")]
    InvalidMrzLength {
        /// Human-readable expected length (e.g. `"88 (TD3)"`).
        expected: String,
        /// Observed character count.
        actual: usize,
    },

    /// The reconstructed digest is not present at the configured offset of
    /// the signed content.
    #[error(
        "digest placement mismatch at offset {offset} (length {length}): expected {expected}, found {}",
        .found.as_deref().unwrap_or("<out of bounds>")
    )]
    DigestPlacementMismatch {
        /// Configured byte offset inside the signed content.
        offset: usize,
        /// Configured digest length in bytes.
        length: usize,
        /// Hex of the reconstructed digest.
        expected: String,
        /// Hex of the bytes actually found, `None` if the signed content is
        /// shorter than `offset + length`.
        found: Option<String>,
    },

    /// An integer exceeds the capacity of the requested encoding.
    #[error("value of {bits} bits exceeds capacity of {capacity} bits")]
    ValueTooLarge {
        /// Bit length of the value.
        bits: u64,
        /// Available capacity in bits.
        capacity: u64,
    },

    /// A configured shape (limb capacity, fixed input length, template) cannot
    /// represent the supplied data.
    #[error("configuration mismatch: {0}")]
    ConfigurationMismatch(String),
}

impl PassportError {
    /// Shorthand for [`PassportError::MalformedInput`].
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedInput(msg.into())
    }

    /// Shorthand for [`PassportError::ConfigurationMismatch`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigurationMismatch(msg.into())
    }
}
