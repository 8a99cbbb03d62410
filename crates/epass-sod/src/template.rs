//! # Security-Object Templates
//!
//! Issuer-defined layout parameters for the signed security object, keyed by
//! hash algorithm and template version.
//!
//! ## Layout (ICAO 9303 Part 10, `LDSSecurityObject`)
//!
//! ```text
//! SEQUENCE {
//!   INTEGER version,
//!   AlgorithmIdentifier hashAlgorithm,
//!   SEQUENCE OF SEQUENCE { INTEGER dataGroupNumber, OCTET STRING dataGroupHashValue },
//!   [ldsVersionInfo SEQUENCE { PrintableString, PrintableString }]   -- v1 only
//! }
//! ```
//!
//! All lengths are DER-computed from the entries, so the common seven-group
//! SHA-256 object begins with the well-known
//! `30 82 01 25 02 01 00 30 0B 06 09 60 86 48 01 65 03 04 02 01 30 82 01 11`.
//!
//! ## Signed-Content Offsets
//!
//! The digest of the structure above is the `messageDigest` signed
//! attribute. With the standard attribute set (contentType, signingTime,
//! messageDigest) its value starts at byte 72 for SHA-224/256/384 and at
//! byte 73 for SHA-512, where the outer SET needs a two-byte length.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use epass_core::der::{encode_small_integer, encode_tlv, DerReader, TAG_OCTET_STRING, TAG_OID, TAG_SEQUENCE};
use epass_core::{CanonicalMrz, HashAlgorithm, PassportError};

use crate::data_group::{DataGroupHash, DataGroupHashes, MAX_DATA_GROUP};

/// `PrintableString`.
const TAG_PRINTABLE_STRING: u8 = 0x13;

/// Name of a template revision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateVersion(String);

impl TemplateVersion {
    /// ICAO 9303 LDS 1.7 security object (`version 0`, no version info).
    pub const ICAO_LDS_V0: &'static str = "icao-9303-lds-v0";

    /// Wrap a version name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The built-in ICAO LDS v0 version.
    pub fn icao_lds_v0() -> Self {
        Self(Self::ICAO_LDS_V0.to_string())
    }

    /// Returns the version name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TemplateVersion {
    fn default() -> Self {
        Self::icao_lds_v0()
    }
}

impl std::fmt::Display for TemplateVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the issuer hashed for the MRZ data group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MrzPreimage {
    /// The DG1 TLV: `61 L 5F1F L <mrz>`.
    #[default]
    Dg1,
    /// The bare canonical MRZ bytes.
    Raw,
}

/// LDS v1 version information appended to the security object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LdsVersionInfo {
    /// e.g. `"0108"`.
    pub lds_version: String,
    /// e.g. `"040000"`.
    pub unicode_version: String,
}

fn default_mrz_group() -> u8 {
    1
}

/// Layout parameters of one security-object template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityObjectTemplate {
    /// Hash algorithm of the data-group hashes and the signed digest.
    pub algorithm: HashAlgorithm,
    /// Template revision name.
    #[serde(default)]
    pub version: TemplateVersion,
    /// `LDSSecurityObject.version`.
    #[serde(default)]
    pub lds_version: u8,
    /// Full DER `AlgorithmIdentifier` written after the version.
    #[serde(with = "hex")]
    pub algorithm_identifier: Vec<u8>,
    /// LDS v1 trailer.
    #[serde(default)]
    pub lds_version_info: Option<LdsVersionInfo>,
    /// Preimage of the MRZ digest.
    #[serde(default)]
    pub mrz_preimage: MrzPreimage,
    /// Data-group number that holds the MRZ digest.
    #[serde(default = "default_mrz_group")]
    pub mrz_group: u8,
    /// Byte offset of the structure digest inside the signed content.
    pub digest_offset: usize,
    /// Length of the structure digest inside the signed content.
    pub digest_length: usize,
}

impl SecurityObjectTemplate {
    /// Built-in ICAO LDS v0 template for `algorithm`.
    ///
    /// The `AlgorithmIdentifier` omits the optional NULL parameters, as the
    /// majority of issuers do.
    pub fn icao_lds_v0(algorithm: HashAlgorithm) -> Self {
        let oid = encode_tlv(&[TAG_OID], algorithm.oid());
        let digest_offset = match algorithm {
            HashAlgorithm::Sha512 => 73,
            HashAlgorithm::Sha224 | HashAlgorithm::Sha256 | HashAlgorithm::Sha384 => 72,
        };
        Self {
            algorithm,
            version: TemplateVersion::icao_lds_v0(),
            lds_version: 0,
            algorithm_identifier: encode_tlv(&[TAG_SEQUENCE], &oid),
            lds_version_info: None,
            mrz_preimage: MrzPreimage::Dg1,
            mrz_group: 1,
            digest_offset,
            digest_length: algorithm.output_len(),
        }
    }

    /// Check internal consistency.
    ///
    /// # Errors
    ///
    /// [`PassportError::ConfigurationMismatch`] if the digest length does not
    /// match the algorithm, the `AlgorithmIdentifier` names a different
    /// algorithm, or the MRZ group is out of range.
    pub fn validate(&self) -> Result<(), PassportError> {
        if self.digest_length != self.algorithm.output_len() {
            return Err(PassportError::config(format!(
                "template {}/{}: digest length {} but {} digests are {} bytes",
                self.algorithm,
                self.version,
                self.digest_length,
                self.algorithm,
                self.algorithm.output_len()
            )));
        }
        if self.mrz_group == 0 || self.mrz_group > MAX_DATA_GROUP {
            return Err(PassportError::config(format!(
                "template {}/{}: MRZ group {} outside 1..={MAX_DATA_GROUP}",
                self.algorithm, self.version, self.mrz_group
            )));
        }
        let oid = identifier_oid(&self.algorithm_identifier).map_err(|e| {
            PassportError::config(format!(
                "template {}/{}: bad AlgorithmIdentifier: {e}",
                self.algorithm, self.version
            ))
        })?;
        if oid != self.algorithm.oid() {
            return Err(PassportError::config(format!(
                "template {}/{}: AlgorithmIdentifier OID {} does not name {}",
                self.algorithm,
                self.version,
                hex::encode(oid),
                self.algorithm
            )));
        }
        Ok(())
    }

    /// Bytes hashed to produce the MRZ data-group digest.
    pub fn mrz_preimage_bytes(&self, mrz: &CanonicalMrz) -> Vec<u8> {
        match self.mrz_preimage {
            MrzPreimage::Dg1 => mrz.dg1_encoding(),
            MrzPreimage::Raw => mrz.as_bytes().to_vec(),
        }
    }

    /// DER `DataGroupHash` for one entry.
    pub fn encode_entry(&self, entry: &DataGroupHash) -> Vec<u8> {
        let mut body = encode_small_integer(entry.group);
        body.extend(encode_tlv(&[TAG_OCTET_STRING], &entry.digest));
        encode_tlv(&[TAG_SEQUENCE], &body)
    }

    /// The complete `LDSSecurityObject` for `hashes`, in order.
    pub fn frame(&self, hashes: &DataGroupHashes) -> Vec<u8> {
        let entries: Vec<u8> = hashes.into_iter().flat_map(|e| self.encode_entry(e)).collect();

        let mut body = encode_small_integer(self.lds_version);
        body.extend_from_slice(&self.algorithm_identifier);
        body.extend(encode_tlv(&[TAG_SEQUENCE], &entries));
        if let Some(info) = &self.lds_version_info {
            let mut v = encode_tlv(&[TAG_PRINTABLE_STRING], info.lds_version.as_bytes());
            v.extend(encode_tlv(&[TAG_PRINTABLE_STRING], info.unicode_version.as_bytes()));
            body.extend(encode_tlv(&[TAG_SEQUENCE], &v));
        }
        encode_tlv(&[TAG_SEQUENCE], &body)
    }
}

/// OID content octets of a DER `AlgorithmIdentifier`.
fn identifier_oid(der: &[u8]) -> Result<&[u8], PassportError> {
    let mut reader = DerReader::new(der);
    let seq = reader.expect(TAG_SEQUENCE)?;
    if !reader.is_empty() {
        return Err(PassportError::malformed("trailing bytes after AlgorithmIdentifier"));
    }
    let mut inner = seq.children();
    Ok(inner.expect(TAG_OID)?.value)
}

/// Templates keyed by `(algorithm, version)`.
#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: BTreeMap<(HashAlgorithm, TemplateVersion), SecurityObjectTemplate>,
}

impl TemplateRegistry {
    /// A registry with no templates.
    pub fn empty() -> Self {
        Self {
            templates: BTreeMap::new(),
        }
    }

    /// A registry holding the ICAO LDS v0 template for every supported algorithm.
    pub fn with_builtins() -> Self {
        let mut templates = BTreeMap::new();
        for algorithm in HashAlgorithm::ALL {
            let t = SecurityObjectTemplate::icao_lds_v0(algorithm);
            templates.insert((t.algorithm, t.version.clone()), t);
        }
        Self { templates }
    }

    /// Add or replace a template after validating it.
    ///
    /// Returns the template previously registered under the same key.
    pub fn register(
        &mut self,
        template: SecurityObjectTemplate,
    ) -> Result<Option<SecurityObjectTemplate>, PassportError> {
        template.validate()?;
        let key = (template.algorithm, template.version.clone());
        Ok(self.templates.insert(key, template))
    }

    /// Look up a template.
    ///
    /// # Errors
    ///
    /// [`PassportError::ConfigurationMismatch`] if no template is registered
    /// for the pair.
    pub fn get(
        &self,
        algorithm: HashAlgorithm,
        version: &TemplateVersion,
    ) -> Result<&SecurityObjectTemplate, PassportError> {
        self.templates
            .get(&(algorithm, version.clone()))
            .ok_or_else(|| {
                PassportError::config(format!("no security-object template for {algorithm}/{version}"))
            })
    }

    /// All registered templates in key order.
    pub fn iter(&self) -> impl Iterator<Item = &SecurityObjectTemplate> {
        self.templates.values()
    }

    /// Number of registered templates.
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for TemplateRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
