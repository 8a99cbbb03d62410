//! # Passport Record Ingestion
//!
//! Typed view of the JSON record a document reader produces after an NFC
//! read. Loosely typed source fields are validated here, once; nothing
//! downstream sees signed bytes, untyped public keys, or duplicate
//! data-group numbers.
//!
//! ```json
//! {
//!   "mrz": "P<UTO...",
//!   "modulus": "0xc1d2...",
//!   "dataGroupHashes": [[1, [12, -3, ...]], [2, [...]]],
//!   "eContent": [49, 102, ...],
//!   "encryptedDigest": [-77, 5, ...]
//! }
//! ```
//!
//! Byte arrays may mix signed (`-128..=-1`) and unsigned (`0..=255`) values.
//! Fields a reader emits only for debugging are ignored.

use serde::{Deserialize, Serialize};

use epass_core::{
    bytes_to_integer, BigUint, ByteOrder, CanonicalMrz, HashAlgorithm, MrzInfo, PassportError,
};
use epass_sod::{DataGroupHashes, TemplateVersion};

/// Document signer public key, as reported by the reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PublicKey {
    /// RSA key.
    Rsa {
        /// Modulus `n`.
        #[serde(with = "integer_text")]
        modulus: BigUint,
        /// Public exponent `e`.
        #[serde(with = "integer_text")]
        exponent: BigUint,
    },
    /// EC key. Carried for completeness; the circuits here are RSA-only.
    Ecdsa {
        /// Curve name, e.g. `brainpoolP256r1`.
        curve: String,
        /// Affine x, hex.
        x: String,
        /// Affine y, hex.
        y: String,
    },
}

/// One passport read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassportRecord {
    /// MRZ as printed, lines concatenated or newline-separated.
    pub mrz: String,
    /// Reader-decoded MRZ fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mrz_info: Option<MrzInfo>,
    /// RSA modulus of the document signer, decimal or `0x` hex text.
    #[serde(with = "integer_text")]
    pub modulus: BigUint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<PublicKey>,
    /// PEM text, passed through untouched.
    #[serde(
        default,
        rename = "publicKeyPEM",
        skip_serializing_if = "Option::is_none"
    )]
    pub public_key_pem: Option<String>,
    /// Issuer-ordered `(group, digest)` pairs.
    #[serde(with = "data_group_pairs")]
    pub data_group_hashes: DataGroupHashes,
    /// DER signed attributes: the bytes the issuer signed.
    #[serde(with = "signed_bytes")]
    pub e_content: Vec<u8>,
    /// Signature over `e_content`, big-endian.
    #[serde(with = "signed_bytes")]
    pub encrypted_digest: Vec<u8>,
    /// Declared hash algorithm; the pipeline default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_algorithm: Option<HashAlgorithm>,
    /// Declared template version; the pipeline default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_version: Option<TemplateVersion>,
}

impl PassportRecord {
    /// Parse and validate a JSON record.
    ///
    /// # Errors
    ///
    /// [`PassportError::MalformedInput`] for JSON that does not match the
    /// record shape, out-of-range bytes, duplicate data groups, or a public
    /// key that contradicts `modulus`.
    pub fn from_json(json: &str) -> Result<Self, PassportError> {
        let record: Self = serde_json::from_str(json)
            .map_err(|e| PassportError::malformed(format!("passport record: {e}")))?;
        record.validate()?;
        Ok(record)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, PassportError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| PassportError::malformed(format!("passport record: {e}")))
    }

    /// Cross-field checks that serde cannot express.
    pub fn validate(&self) -> Result<(), PassportError> {
        if self.e_content.is_empty() {
            return Err(PassportError::malformed("eContent is empty"));
        }
        if self.encrypted_digest.is_empty() {
            return Err(PassportError::malformed("encryptedDigest is empty"));
        }
        if let Some(PublicKey::Rsa { modulus, .. }) = &self.public_key {
            if modulus != &self.modulus {
                return Err(PassportError::malformed(
                    "publicKey.modulus differs from modulus",
                ));
            }
        }
        if let Some(info) = &self.mrz_info {
            let mrz = self.canonical_mrz()?;
            let parsed = MrzInfo::parse(&mrz)?;
            if parsed.document_number != info.document_number {
                return Err(PassportError::malformed(
                    "mrzInfo.documentNumber differs from the MRZ",
                ));
            }
        }
        Ok(())
    }

    /// Canonical form of [`Self::mrz`].
    pub fn canonical_mrz(&self) -> Result<CanonicalMrz, PassportError> {
        CanonicalMrz::parse(&self.mrz)
    }

    /// Signature as an integer.
    pub fn signature(&self) -> BigUint {
        bytes_to_integer(&self.encrypted_digest, ByteOrder::BigEndian)
    }
}

/// Big integers as decimal or `0x` hex text; written back as decimal.
pub(crate) mod integer_text {
    use epass_core::{integer_to_decimal, parse_integer, BigUint};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&integer_to_decimal(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_integer(&text).map_err(serde::de::Error::custom)
    }
}

/// Byte arrays that may hold signed values.
pub(crate) mod signed_bytes {
    use epass_core::normalize_bytes;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        bytes.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let values = Vec::<i64>::deserialize(deserializer)?;
        normalize_bytes(&values).map_err(serde::de::Error::custom)
    }
}

/// `[[group, [bytes...]], ...]`.
pub(crate) mod data_group_pairs {
    use epass_core::normalize_bytes;
    use epass_sod::{DataGroupHash, DataGroupHashes};
    use serde::de::Error as _;
    use serde::ser::SerializeSeq;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        hashes: &DataGroupHashes,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(hashes.len()))?;
        for entry in hashes {
            seq.serialize_element(&(entry.group, &entry.digest))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DataGroupHashes, D::Error> {
        let pairs = Vec::<(i64, Vec<i64>)>::deserialize(deserializer)?;
        let entries = pairs
            .into_iter()
            .map(|(group, digest)| -> Result<DataGroupHash, D::Error> {
                let group = u8::try_from(group)
                    .map_err(|_| D::Error::custom(format!("data-group number {group} out of range")))?;
                let digest = normalize_bytes(&digest)
                    .map_err(|e| D::Error::custom(format!("DG{group} digest: {e}")))?;
                Ok(DataGroupHash::new(group, digest))
            })
            .collect::<Result<Vec<_>, _>>()?;
        DataGroupHashes::new(entries).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MRZ: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<\
                       L898902C36UTO7408122F1204159ZE184226B<<<<<10";

    fn record_json(extra: &str) -> String {
        format!(
            r#"{{
                "mrz": "{MRZ}",
                "modulus": "0x00c3",
                "dataGroupHashes": [[1, [1, -1]], [2, [127, -128]]],
                "eContent": [49, 102, -1],
                "encryptedDigest": [0, -56],
                "contentBytes": {{"ignored": true}},
                "eContentDecomposed": null
                {extra}
            }}"#
        )
    }

    #[test]
    fn parses_signed_bytes_and_hex_modulus() {
        let record = PassportRecord::from_json(&record_json("")).unwrap();
        assert_eq!(record.modulus, BigUint::from(0xc3u32));
        assert_eq!(record.e_content, vec![49, 102, 255]);
        assert_eq!(record.encrypted_digest, vec![0, 200]);
        assert_eq!(record.signature(), BigUint::from(200u32));
        assert_eq!(record.data_group_hashes.get(2), Some(&[127u8, 128][..]));
        assert!(record.hash_algorithm.is_none());
    }

    #[test]
    fn decimal_modulus_and_declared_algorithm() {
        let json = record_json(r#", "hashAlgorithm": "sha384""#).replace("0x00c3", "195");
        let record = PassportRecord::from_json(&json).unwrap();
        assert_eq!(record.modulus, BigUint::from(195u32));
        assert_eq!(record.hash_algorithm, Some(HashAlgorithm::Sha384));
    }

    #[test]
    fn out_of_range_byte_rejected() {
        let json = record_json("").replace("[49, 102, -1]", "[49, 256]");
        let err = PassportRecord::from_json(&json).unwrap_err();
        assert!(matches!(err, PassportError::MalformedInput(_)));
        assert!(err.to_string().contains("256"));
    }

    #[test]
    fn duplicate_group_rejected() {
        let json = record_json("").replace("[2, [127, -128]]", "[1, [127, -128]]");
        assert!(PassportRecord::from_json(&json).is_err());
    }

    #[test]
    fn bad_modulus_rejected() {
        let json = record_json("").replace("0x00c3", "0xzz");
        assert!(PassportRecord::from_json(&json).is_err());
    }

    #[test]
    fn typed_public_key() {
        let json = record_json(
            r#", "publicKey": {"type": "rsa", "modulus": "195", "exponent": "65537"},
                "publicKeyPEM": "-----BEGIN PUBLIC KEY-----""#,
        );
        let record = PassportRecord::from_json(&json).unwrap();
        assert!(matches!(record.public_key, Some(PublicKey::Rsa { .. })));
        assert_eq!(
            record.public_key_pem.as_deref(),
            Some("-----BEGIN PUBLIC KEY-----")
        );

        let mismatched = json.replace(r#""modulus": "195""#, r#""modulus": "196""#);
        assert!(PassportRecord::from_json(&mismatched).is_err());
    }

    #[test]
    fn mrz_info_cross_checked() {
        let mrz = CanonicalMrz::parse(MRZ).unwrap();
        let mut info = MrzInfo::parse(&mrz).unwrap();
        let ok = record_json(&format!(
            r#", "mrzInfo": {}"#,
            serde_json::to_string(&info).unwrap()
        ));
        assert!(PassportRecord::from_json(&ok).is_ok());

        info.document_number = "X0000000".into();
        let bad = record_json(&format!(
            r#", "mrzInfo": {}"#,
            serde_json::to_string(&info).unwrap()
        ));
        assert!(PassportRecord::from_json(&bad).is_err());
    }

    #[test]
    fn json_round_trip() {
        let record = PassportRecord::from_json(&record_json("")).unwrap();
        let json = record.to_json_pretty().unwrap();
        assert!(json.contains(r#""modulus": "195""#));
        let back = PassportRecord::from_json(&json).unwrap();
        assert_eq!(back, record);
    }
}
