//! # Mock Proving Backend
//!
//! A transparent stand-in for the passport circuit. It re-checks, outside
//! any proof system, the relations the real circuit constrains:
//!
//! 1. The digest of `mrz` is the MRZ group's entry inside `dataHashes`.
//! 2. The digest of `dataHashes` sits at the template offset of
//!    `signedContentBytes`.
//! 3. Every signature and modulus limb is below `2^width`.
//! 4. `signature == int(hash(signedContentBytes)) mod modulus`, a toy
//!    signature relation the synthetic fixtures satisfy. Real RSA
//!    verification belongs to the real circuit.
//!
//! Inputs that would make the real circuit unsatisfiable make `prove` fail
//! here too, so negative fixtures behave the same against either backend.
//!
//! ## Security Warning
//!
//! **NOT A PROOF.** The "proof" is a SHA-256 digest anyone can recompute
//! from the verification key and public signals.

use serde::{Deserialize, Serialize};

use epass_core::der::{DerReader, TAG_INTEGER, TAG_OCTET_STRING, TAG_SEQUENCE};
use epass_core::{
    bytes_equal, bytes_to_integer, hash, BigUint, ByteOrder, HashAlgorithm, LimbSpec,
    PassportError,
};
use epass_sod::SecurityObjectTemplate;

use crate::prover::{Proof, ProofError, ProofRequest, ProvingBackend, VerifyError};

/// Verification key of the mock circuit: a name for the circuit shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MockVerificationKey {
    /// e.g. `epass-sha256-icao-9303-lds-v0-32x64-bit-88`.
    pub circuit_id: String,
}

/// Transparent backend checking the circuit relations directly.
#[derive(Debug, Clone)]
pub struct MockProvingBackend {
    template: SecurityObjectTemplate,
    limbs: LimbSpec,
    reveal_length: usize,
}

impl MockProvingBackend {
    /// Backend for a template and circuit shape.
    pub fn new(template: SecurityObjectTemplate, limbs: LimbSpec, reveal_length: usize) -> Self {
        Self {
            template,
            limbs,
            reveal_length,
        }
    }

    /// The key this backend's proofs verify under.
    pub fn verification_key(&self) -> MockVerificationKey {
        MockVerificationKey {
            circuit_id: format!(
                "epass-{}-{}-{}-{}",
                self.template.algorithm, self.template.version, self.limbs, self.reveal_length
            ),
        }
    }

    fn algorithm(&self) -> HashAlgorithm {
        self.template.algorithm
    }

    /// Digest recorded for the MRZ group in a framed `LDSSecurityObject`.
    fn framed_mrz_digest<'a>(&self, data_hashes: &'a [u8]) -> Result<&'a [u8], PassportError> {
        let mut outer = DerReader::new(data_hashes);
        let object = outer.expect(TAG_SEQUENCE)?;
        let mut fields = object.children();
        fields.expect(TAG_INTEGER)?;
        fields.expect(TAG_SEQUENCE)?;
        let mut entries = fields.expect(TAG_SEQUENCE)?.children();
        while !entries.is_empty() {
            let mut entry = entries.expect(TAG_SEQUENCE)?.children();
            let group = entry.expect(TAG_INTEGER)?;
            let digest = entry.expect(TAG_OCTET_STRING)?;
            if group.value == [self.template.mrz_group] {
                return Ok(digest.value);
            }
        }
        Err(PassportError::malformed(format!(
            "dataHashes has no DG{} entry",
            self.template.mrz_group
        )))
    }

    fn public_signals(
        &self,
        mrz: &[u8],
        request: &ProofRequest<MockVerificationKey>,
    ) -> Result<Vec<String>, ProofError> {
        let bitmap = &request.inputs().reveal_bitmap;
        if bitmap.len() != self.reveal_length {
            return Err(ProofError::Unsatisfied(format!(
                "reveal bitmap has {} flags, circuit has {}",
                bitmap.len(),
                self.reveal_length
            )));
        }
        // The MRZ characters are the tail of the preimage.
        let skip = mrz.len().checked_sub(bitmap.len()).ok_or_else(|| {
            ProofError::Unsatisfied(format!(
                "mrz has {} bytes, fewer than {} reveal flags",
                mrz.len(),
                bitmap.len()
            ))
        })?;
        let mut signals: Vec<String> = mrz[skip..]
            .iter()
            .enumerate()
            .map(|(i, c)| {
                if bitmap.is_revealed(i) {
                    c.to_string()
                } else {
                    "0".to_string()
                }
            })
            .collect();
        signals.extend(request.inputs().pubkey_modulus.iter().cloned());
        Ok(signals)
    }

    fn proof_bytes(&self, vk: &MockVerificationKey, public_signals: &[String]) -> Vec<u8> {
        let mut preimage = vk.circuit_id.as_bytes().to_vec();
        for s in public_signals {
            preimage.push(0);
            preimage.extend_from_slice(s.as_bytes());
        }
        hash(&preimage, HashAlgorithm::Sha256).bytes
    }
}

impl ProvingBackend for MockProvingBackend {
    type VerificationKey = MockVerificationKey;

    fn prove(&self, request: &ProofRequest<MockVerificationKey>) -> Result<Proof, ProofError> {
        let vk = request.verification_key();
        if vk != &self.verification_key() {
            return Err(ProofError::KeyMismatch(format!(
                "request key {} does not match circuit {}",
                vk.circuit_id,
                self.verification_key().circuit_id
            )));
        }

        let inputs = request.inputs();
        let algorithm = self.algorithm();
        let mrz = inputs.mrz_bytes()?;
        let data_hashes = inputs.data_hashes_bytes()?;
        let signed = inputs.signed_content()?;
        let signature = inputs.signature_value(self.limbs)?;
        let modulus = inputs.modulus_value(self.limbs)?;

        let mrz_digest = hash(&mrz, algorithm);
        let framed = self.framed_mrz_digest(&data_hashes)?;
        if !bytes_equal(framed, mrz_digest.as_bytes()) {
            return Err(ProofError::Unsatisfied(
                "MRZ digest is not the DG1 entry of dataHashes".into(),
            ));
        }

        let data_digest = hash(&data_hashes, algorithm);
        let offset = self.template.digest_offset;
        let placed = offset
            .checked_add(self.template.digest_length)
            .and_then(|end| signed.get(offset..end));
        if !placed.is_some_and(|p| bytes_equal(p, data_digest.as_bytes())) {
            return Err(ProofError::Unsatisfied(format!(
                "dataHashes digest not found at offset {offset} of signedContentBytes"
            )));
        }

        if modulus.bits() == 0 {
            return Err(ProofError::Unsatisfied("modulus is zero".into()));
        }
        let message = bytes_to_integer(hash(&signed, algorithm).as_bytes(), ByteOrder::BigEndian);
        if signature >= modulus || signature != message % &modulus {
            return Err(ProofError::Unsatisfied(
                "signature does not verify under modulus".into(),
            ));
        }

        let public_signals = self.public_signals(&mrz, request)?;
        tracing::debug!(
            request_id = %request.id(),
            signals = public_signals.len(),
            "mock proof generated"
        );
        Ok(Proof {
            request_id: request.id(),
            bytes: self.proof_bytes(vk, &public_signals),
            public_signals,
        })
    }

    fn verify(
        &self,
        vk: &MockVerificationKey,
        proof: &Proof,
        public_signals: &[String],
    ) -> Result<bool, VerifyError> {
        if vk != &self.verification_key() {
            return Err(VerifyError::KeyMismatch(format!(
                "key {} does not match circuit {}",
                vk.circuit_id,
                self.verification_key().circuit_id
            )));
        }
        if proof.bytes.len() != HashAlgorithm::Sha256.output_len() {
            return Err(VerifyError::InvalidProof(format!(
                "mock proofs are 32 bytes, got {}",
                proof.bytes.len()
            )));
        }
        Ok(proof.public_signals == public_signals
            && bytes_equal(&proof.bytes, &self.proof_bytes(vk, public_signals)))
    }
}
