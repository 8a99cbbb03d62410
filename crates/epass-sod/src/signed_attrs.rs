//! # CMS Signed Attributes
//!
//! The "signed content" of an ePassport is the DER encoding of the CMS
//! `SignedAttributes` SET from the document security object's `SignerInfo`.
//! The `messageDigest` attribute inside it carries the digest of the
//! `LDSSecurityObject`.
//!
//! [`locate_message_digest`] walks the SET to find where that digest really
//! is, which is how a misidentified template is told apart from corrupted
//! data. [`SignedAttributes`] builds the SET the way issuers lay it out
//! (contentType, signingTime, messageDigest).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use epass_core::der::{
    encode_tlv, DerReader, TAG_OCTET_STRING, TAG_OID, TAG_SEQUENCE, TAG_SET, TAG_UTC_TIME,
};
use epass_core::PassportError;

/// `id-contentType` (1.2.840.113549.1.9.3).
pub const OID_CONTENT_TYPE: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x03];
/// `id-messageDigest` (1.2.840.113549.1.9.4).
pub const OID_MESSAGE_DIGEST: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x04];
/// `id-signingTime` (1.2.840.113549.1.9.5).
pub const OID_SIGNING_TIME: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x09, 0x05];
/// `id-icao-mrtd-security-ldsSecurityObject` (2.23.136.1.1.1).
pub const OID_LDS_SECURITY_OBJECT: &[u8] = &[0x67, 0x81, 0x08, 0x01, 0x01, 0x01];

/// `[0] IMPLICIT` tag used when the attributes are embedded in a `SignerInfo`.
const TAG_IMPLICIT_ZERO: u8 = 0xa0;

/// Where the `messageDigest` value sits inside the signed content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestLocation {
    /// Byte offset of the digest value.
    pub offset: usize,
    /// Digest length in bytes.
    pub length: usize,
}

/// Find the `messageDigest` attribute value in DER signed attributes.
///
/// Accepts the attributes as signed (`SET`, tag `0x31`) or as embedded in a
/// `SignerInfo` (`[0] IMPLICIT`, tag `0xA0`).
///
/// # Errors
///
/// [`PassportError::MalformedInput`] if the bytes are not a well-formed
/// attribute SET or carry no `messageDigest` attribute.
pub fn locate_message_digest(signed_content: &[u8]) -> Result<DigestLocation, PassportError> {
    let mut reader = DerReader::new(signed_content);
    let set = reader.read()?;
    if set.tag != TAG_SET && set.tag != TAG_IMPLICIT_ZERO {
        return Err(PassportError::malformed(format!(
            "signed attributes must start with SET, found tag 0x{:02x}",
            set.tag
        )));
    }

    let mut attributes = set.children();
    while !attributes.is_empty() {
        let attribute = attributes.expect(TAG_SEQUENCE)?;
        let mut fields = attribute.children();
        let oid = fields.expect(TAG_OID)?;
        if oid.value != OID_MESSAGE_DIGEST {
            continue;
        }
        let mut values = fields.expect(TAG_SET)?.children();
        let digest = values.expect(TAG_OCTET_STRING)?;
        return Ok(DigestLocation {
            offset: digest.value_offset,
            length: digest.value.len(),
        });
    }
    Err(PassportError::malformed(
        "signed attributes carry no messageDigest attribute",
    ))
}

/// Builder for the DER signed-attributes SET.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedAttributes {
    content_type: Vec<u8>,
    signing_time: Option<DateTime<Utc>>,
    message_digest: Vec<u8>,
}

impl SignedAttributes {
    /// Attributes for an `LDSSecurityObject` with the given digest.
    pub fn new(message_digest: impl Into<Vec<u8>>) -> Self {
        Self {
            content_type: OID_LDS_SECURITY_OBJECT.to_vec(),
            signing_time: None,
            message_digest: message_digest.into(),
        }
    }

    /// Override the content-type OID (content octets).
    pub fn with_content_type(mut self, oid: &[u8]) -> Self {
        self.content_type = oid.to_vec();
        self
    }

    /// Include a `signingTime` attribute.
    pub fn with_signing_time(mut self, time: DateTime<Utc>) -> Self {
        self.signing_time = Some(time);
        self
    }

    /// DER encoding: the bytes the issuer signs.
    pub fn to_der(&self) -> Vec<u8> {
        let mut body = attribute(OID_CONTENT_TYPE, &encode_tlv(&[TAG_OID], &self.content_type));
        if let Some(time) = &self.signing_time {
            let utc = time.format("%y%m%d%H%M%SZ").to_string();
            body.extend(attribute(
                OID_SIGNING_TIME,
                &encode_tlv(&[TAG_UTC_TIME], utc.as_bytes()),
            ));
        }
        body.extend(attribute(
            OID_MESSAGE_DIGEST,
            &encode_tlv(&[TAG_OCTET_STRING], &self.message_digest),
        ));
        encode_tlv(&[TAG_SET], &body)
    }
}

/// `SEQUENCE { OID, SET { value } }`.
fn attribute(oid: &[u8], value: &[u8]) -> Vec<u8> {
    let mut body = encode_tlv(&[TAG_OID], oid);
    body.extend(encode_tlv(&[TAG_SET], value));
    encode_tlv(&[TAG_SEQUENCE], &body)
}
