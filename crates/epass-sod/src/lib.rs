//! # epass-sod — Security Object Reconstruction
//!
//! Rebuilds the exact bytes an ePassport issuer hashed and signed, and checks
//! that the reconstruction is embedded where the template says it is.
//!
//! ## Pipeline
//!
//! 1. Hash the MRZ preimage (the DG1 encoding by default).
//! 2. Frame the ordered `(group, digest)` list as an `LDSSecurityObject`
//!    prefix, inserting the MRZ digest as the DG1 entry.
//! 3. Hash the framed structure.
//! 4. Compare that digest, in constant time, to the signed content at the
//!    template's offset. A mismatch is [`PassportError::DigestPlacementMismatch`].
//!
//! ## Configuration, Not Constants
//!
//! Framing, offsets and digest lengths live in [`SecurityObjectTemplate`],
//! looked up in a [`TemplateRegistry`] by hash algorithm and template
//! version. Built-in templates follow ICAO Doc 9303 Parts 10 and 11.
//!
//! ## Crate Policy
//!
//! - Depends only on `epass-core` internally.
//! - Pure functions; the only side effect is `tracing` output.
//!
//! [`PassportError::DigestPlacementMismatch`]: epass_core::PassportError::DigestPlacementMismatch

pub mod assembler;
pub mod data_group;
pub mod signed_attrs;
pub mod template;

pub use assembler::{verify_digest_placement, SecurityObject, SecurityObjectAssembler};
pub use data_group::{DataGroupHash, DataGroupHashes, MAX_DATA_GROUP};
pub use signed_attrs::{locate_message_digest, DigestLocation, SignedAttributes};
pub use template::{MrzPreimage, SecurityObjectTemplate, TemplateRegistry, TemplateVersion};
