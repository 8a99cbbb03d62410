//! # epass-circuit — Circuit-Input Packaging
//!
//! Turns a passport record into the input object of an ePassport
//! verification circuit, and defines the seam to the proving collaborator.
//!
//! ## Flow
//!
//! ```text
//! PassportRecord ──▶ CanonicalMrz ──▶ SecurityObjectAssembler ──▶ placement check
//!                                                                   │
//!        CircuitInputs ◀── CircuitInputPackager ◀───────────────────┘
//!              │
//!              ▼
//!     ProofRequest<K> ──▶ ProvingBackend
//! ```
//!
//! ## Crate Policy
//!
//! - All outputs are decimal strings; circuits read field elements as text.
//! - Limb capacity shortfalls are configuration errors, never truncation.
//! - The `mock` feature (on by default) provides [`MockProvingBackend`],
//!   which checks the circuit's relations without producing a real proof.

pub mod config;
pub mod inputs;
#[cfg(feature = "mock")]
pub mod mock;
pub mod packager;
pub mod pipeline;
pub mod prover;
pub mod record;
pub mod reveal;

pub use config::{CircuitConfig, ConfigError, PipelineConfig, REFERENCE_LIMBS};
pub use inputs::CircuitInputs;
#[cfg(feature = "mock")]
pub use mock::{MockProvingBackend, MockVerificationKey};
pub use packager::{ensure_capacity, CircuitInputPackager};
pub use pipeline::Pipeline;
pub use prover::{Proof, ProofError, ProofRequest, ProvingBackend, VerifyError};
pub use record::{PassportRecord, PublicKey};
pub use reveal::{
    decode_revealed, render_revealed, RevealBitmap, RevealPolicy, RevealRange,
    REFERENCE_REVEAL_LENGTH,
};
