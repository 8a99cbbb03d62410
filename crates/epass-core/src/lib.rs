//! # epass-core — Foundational Types for the ePassport Circuit-Input Stack
//!
//! This crate is the leaf of the workspace. It owns every primitive the
//! canonicalization pipeline is built from and depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One error taxonomy.** [`PassportError`] carries the five failure
//!    modes of the pipeline. No condition is downgraded to a default value.
//!
//! 2. **`CanonicalMrz` newtype.** The only way to obtain MRZ bytes is
//!    [`CanonicalMrz::parse()`] or [`canonicalize_mrz()`], which enforce the
//!    ICAO character set and the document-type line geometry.
//!
//! 3. **Limbs never truncate.** [`split_to_limbs()`] rejects any value that
//!    does not fit `count * width` bits with [`PassportError::ValueTooLarge`].
//!
//! 4. **Algorithm-tagged digests.** [`MessageDigest`] carries the
//!    [`HashAlgorithm`] that produced it; nothing assumes SHA-256.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `epass-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Every operation is pure and synchronous; all public types are `Send + Sync`.

pub mod bigint;
pub mod bytes;
pub mod der;
pub mod digest;
pub mod error;
pub mod limbs;
pub mod mrz;
pub mod mrz_info;

// Re-export primary types for ergonomic imports.
pub use bigint::{
    bytes_to_integer, decimal_to_integer, hex_to_integer, integer_to_bytes, integer_to_decimal,
    integer_to_hex, parse_integer, ByteOrder,
};
pub use bytes::{bytes_equal, normalize_byte, normalize_byte_value, normalize_bytes, to_decimal_strings};
pub use digest::{hash, HashAlgorithm, MessageDigest};
pub use error::PassportError;
pub use limbs::{join_limbs, limbs_from_decimal, limbs_to_decimal, split_to_limbs, LimbSpec};
pub use mrz::{canonicalize_mrz, check_digit, CanonicalMrz, MrzField, MrzFormat};
pub use mrz_info::MrzInfo;

/// Re-exported so downstream crates name the same big-integer type.
pub use num_bigint::BigUint;
