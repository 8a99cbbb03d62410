//! # Proving Backend Seam
//!
//! The interface to whatever turns [`CircuitInputs`] into a proof: a
//! Groth16 prover, a remote proving service, or the mock backend used in
//! tests. This crate never generates proofs itself.
//!
//! ## Security Invariant
//!
//! The verification key is opaque. [`ProofRequest`] carries it to the
//! backend unmodified and exposes it only by reference.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use epass_core::PassportError;

use crate::inputs::CircuitInputs;

/// Error during proof generation.
#[derive(Error, Debug)]
pub enum ProofError {
    /// The inputs could not be decoded.
    #[error("invalid circuit inputs: {0}")]
    Input(#[from] PassportError),
    /// The inputs decode but violate a circuit constraint.
    #[error("constraint not satisfied: {0}")]
    Unsatisfied(String),
    /// The verification key does not belong to this backend's circuit.
    #[error("key mismatch: {0}")]
    KeyMismatch(String),
    /// Internal backend failure.
    #[error("prover error: {0}")]
    Backend(String),
}

/// Error during proof verification.
#[derive(Error, Debug)]
pub enum VerifyError {
    /// The proof is structurally invalid.
    #[error("invalid proof: {0}")]
    InvalidProof(String),
    /// The verification key is incompatible.
    #[error("key mismatch: {0}")]
    KeyMismatch(String),
}

/// One proof request: immutable inputs plus an opaque verification key.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequest<K> {
    id: Uuid,
    inputs: CircuitInputs,
    verification_key: K,
}

impl<K> ProofRequest<K> {
    /// Wrap `inputs` and `verification_key` under a fresh request id.
    pub fn new(inputs: CircuitInputs, verification_key: K) -> Self {
        Self {
            id: Uuid::new_v4(),
            inputs,
            verification_key,
        }
    }

    /// Request id, for correlating logs with backend jobs.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// The circuit inputs.
    pub fn inputs(&self) -> &CircuitInputs {
        &self.inputs
    }

    /// The verification key, exactly as supplied.
    pub fn verification_key(&self) -> &K {
        &self.verification_key
    }

    /// Consume the request.
    pub fn into_parts(self) -> (Uuid, CircuitInputs, K) {
        (self.id, self.inputs, self.verification_key)
    }
}

/// A proof and the public signals it commits to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// Id of the request that produced this proof.
    pub request_id: Uuid,
    /// Backend-specific proof bytes.
    #[serde(with = "hex")]
    pub bytes: Vec<u8>,
    /// Public signals, decimal strings. The first `revealBitmap.len()` are
    /// the masked MRZ characters.
    pub public_signals: Vec<String>,
}

/// Abstract interface to a proving collaborator.
///
/// Implementations must be interchangeable: callers hold a
/// `ProvingBackend` and never name the concrete backend.
pub trait ProvingBackend: Send + Sync {
    /// Verification key type, opaque to this crate.
    type VerificationKey: Clone + Send + Sync;

    /// Generate a proof for `request`.
    fn prove(&self, request: &ProofRequest<Self::VerificationKey>) -> Result<Proof, ProofError>;

    /// Verify `proof` against `public_signals`.
    fn verify(
        &self,
        vk: &Self::VerificationKey,
        proof: &Proof,
        public_signals: &[String],
    ) -> Result<bool, VerifyError>;
}
