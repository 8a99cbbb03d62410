//! # Security-Object Assembler
//!
//! Reproduces the byte sequence the issuer hashed into the `messageDigest`
//! signed attribute and checks that its digest is embedded at the template's
//! offset of the signed content.
//!
//! ## Security Invariant
//!
//! A placement mismatch is always an error. A proof built over mismatched
//! framing proves nothing, so there is no lenient mode.

use serde::Serialize;

use epass_core::{bytes_equal, hash, CanonicalMrz, MessageDigest, PassportError};

use crate::data_group::DataGroupHashes;
use crate::signed_attrs::locate_message_digest;
use crate::template::SecurityObjectTemplate;

/// Output of [`SecurityObjectAssembler::assemble`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityObject {
    /// Bytes hashed for the MRZ data group.
    #[serde(with = "hex")]
    pub mrz_preimage: Vec<u8>,
    /// Digest of [`Self::mrz_preimage`].
    pub mrz_digest: MessageDigest,
    /// The issuer's list with the MRZ digest recorded for the MRZ group.
    pub data_group_hashes: DataGroupHashes,
    /// The framed `LDSSecurityObject`.
    #[serde(with = "hex")]
    pub concatenated_hashes: Vec<u8>,
    /// Digest of [`Self::concatenated_hashes`].
    pub concatenated_digest: MessageDigest,
}

/// Builds [`SecurityObject`]s for one validated template.
#[derive(Debug, Clone)]
pub struct SecurityObjectAssembler {
    template: SecurityObjectTemplate,
}

impl SecurityObjectAssembler {
    /// Assembler for `template`.
    ///
    /// # Errors
    ///
    /// [`PassportError::ConfigurationMismatch`] if the template is inconsistent.
    pub fn new(template: SecurityObjectTemplate) -> Result<Self, PassportError> {
        template.validate()?;
        Ok(Self { template })
    }

    /// The template in use.
    pub fn template(&self) -> &SecurityObjectTemplate {
        &self.template
    }

    /// Hash the MRZ, insert it into the list and frame the result.
    ///
    /// # Errors
    ///
    /// [`PassportError::MalformedInput`] if any supplied digest has the
    /// wrong length for the template's algorithm.
    pub fn assemble(
        &self,
        mrz: &CanonicalMrz,
        hashes: &DataGroupHashes,
    ) -> Result<SecurityObject, PassportError> {
        let algorithm = self.template.algorithm;
        hashes.check_digest_lengths(algorithm)?;

        let mrz_preimage = self.template.mrz_preimage_bytes(mrz);
        let mrz_digest = hash(&mrz_preimage, algorithm);
        let data_group_hashes = hashes.with_digest(self.template.mrz_group, mrz_digest.as_bytes());
        let concatenated_hashes = self.template.frame(&data_group_hashes);
        let concatenated_digest = hash(&concatenated_hashes, algorithm);

        tracing::debug!(
            %algorithm,
            version = %self.template.version,
            groups = data_group_hashes.len(),
            framed_len = concatenated_hashes.len(),
            "assembled security object"
        );

        Ok(SecurityObject {
            mrz_preimage,
            mrz_digest,
            data_group_hashes,
            concatenated_hashes,
            concatenated_digest,
        })
    }

    /// [`Self::assemble`] followed by [`verify_digest_placement`].
    pub fn assemble_and_verify(
        &self,
        mrz: &CanonicalMrz,
        hashes: &DataGroupHashes,
        signed_content: &[u8],
    ) -> Result<SecurityObject, PassportError> {
        let object = self.assemble(mrz, hashes)?;
        verify_digest_placement(signed_content, &object.concatenated_digest, &self.template)?;
        Ok(object)
    }
}

/// Check that `digest` sits at the template's offset in `signed_content`.
///
/// # Errors
///
/// - [`PassportError::ConfigurationMismatch`] if the digest's algorithm or
///   length disagrees with the template.
/// - [`PassportError::DigestPlacementMismatch`] if the bytes at the offset
///   differ, or the signed content is too short to hold them.
pub fn verify_digest_placement(
    signed_content: &[u8],
    digest: &MessageDigest,
    template: &SecurityObjectTemplate,
) -> Result<(), PassportError> {
    if digest.algorithm != template.algorithm || digest.len() != template.digest_length {
        return Err(PassportError::config(format!(
            "{}-byte {} digest checked against {}/{} template expecting {} bytes",
            digest.len(),
            digest.algorithm,
            template.algorithm,
            template.version,
            template.digest_length
        )));
    }

    let offset = template.digest_offset;
    let length = template.digest_length;
    let found = offset
        .checked_add(length)
        .and_then(|end| signed_content.get(offset..end));

    if let Some(slice) = found {
        if bytes_equal(slice, digest.as_bytes()) {
            tracing::debug!(offset, length, "digest placement verified");
            return Ok(());
        }
    }

    match locate_message_digest(signed_content) {
        Ok(loc) => tracing::warn!(
            offset,
            length,
            located_offset = loc.offset,
            located_length = loc.length,
            "digest placement mismatch"
        ),
        Err(_) => tracing::warn!(offset, length, "digest placement mismatch"),
    }

    Err(PassportError::DigestPlacementMismatch {
        offset,
        length,
        expected: digest.to_hex(),
        found: found.map(hex::encode),
    })
}
