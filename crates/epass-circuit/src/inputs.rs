//! # Circuit Input Bundle
//!
//! The object handed to the proving backend. Every value is a decimal
//! string because circuit inputs are field elements and the witness
//! generator reads them as text.

use serde::{Deserialize, Serialize};

use epass_core::{join_limbs, limbs_from_decimal, BigUint, LimbSpec, PassportError};

use crate::reveal::RevealBitmap;

/// Inputs for one proof. Built once by the packager and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitInputs {
    /// Bytes of the hashed MRZ preimage.
    pub mrz: Vec<String>,
    /// One `"0"`/`"1"` flag per MRZ character.
    pub reveal_bitmap: RevealBitmap,
    /// Bytes of the framed data-group-hash structure.
    pub data_hashes: Vec<String>,
    /// Bytes of the signed content.
    pub signed_content_bytes: Vec<String>,
    /// Signature limbs, least significant first.
    pub signature: Vec<String>,
    /// Modulus limbs, least significant first.
    pub pubkey_modulus: Vec<String>,
}

fn decode_bytes(name: &str, values: &[String]) -> Result<Vec<u8>, PassportError> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.parse::<u8>()
                .map_err(|_| PassportError::malformed(format!("{name}[{i}] is not a byte: {v:?}")))
        })
        .collect()
}

impl CircuitInputs {
    /// Pretty JSON, the form written to disk for the witness generator.
    pub fn to_json_pretty(&self) -> Result<String, PassportError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PassportError::malformed(format!("circuit inputs: {e}")))
    }

    /// Parse a bundle from JSON.
    pub fn from_json(json: &str) -> Result<Self, PassportError> {
        serde_json::from_str(json)
            .map_err(|e| PassportError::malformed(format!("circuit inputs: {e}")))
    }

    /// Decoded `mrz` bytes.
    pub fn mrz_bytes(&self) -> Result<Vec<u8>, PassportError> {
        decode_bytes("mrz", &self.mrz)
    }

    /// Decoded `dataHashes` bytes.
    pub fn data_hashes_bytes(&self) -> Result<Vec<u8>, PassportError> {
        decode_bytes("dataHashes", &self.data_hashes)
    }

    /// Decoded `signedContentBytes`.
    pub fn signed_content(&self) -> Result<Vec<u8>, PassportError> {
        decode_bytes("signedContentBytes", &self.signed_content_bytes)
    }

    /// Signature rebuilt from its limbs.
    ///
    /// # Errors
    ///
    /// [`PassportError::ConfigurationMismatch`] if the limb count differs
    /// from `limbs.count`; [`PassportError::MalformedInput`] for a limb that
    /// is not decimal or does not fit `limbs.width` bits.
    pub fn signature_value(&self, limbs: LimbSpec) -> Result<BigUint, PassportError> {
        join_checked("signature", &self.signature, limbs)
    }

    /// Modulus rebuilt from its limbs. Same errors as [`Self::signature_value`].
    pub fn modulus_value(&self, limbs: LimbSpec) -> Result<BigUint, PassportError> {
        join_checked("pubkeyModulus", &self.pubkey_modulus, limbs)
    }
}

fn join_checked(name: &str, limbs: &[String], spec: LimbSpec) -> Result<BigUint, PassportError> {
    if limbs.len() != spec.count {
        return Err(PassportError::config(format!(
            "{name} has {} limbs, circuit expects {}",
            limbs.len(),
            spec.count
        )));
    }
    join_limbs(&limbs_from_decimal(limbs)?, spec.width)
}
