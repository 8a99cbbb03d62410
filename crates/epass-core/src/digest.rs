//! # Digest Function Adapter
//!
//! Computes message digests with the hash algorithm the issuer declared.
//! The security-object template's offsets and lengths depend on the
//! algorithm, so nothing downstream assumes SHA-256.
//!
//! SHA-1 issuers are not supported; every algorithm here comes from the
//! `sha2` family.

use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use crate::error::PassportError;

/// Hash algorithm declared by the document issuer.
///
/// Serializes lowercase (`sha256`); deserializes anything [`FromStr`]
/// accepts, so `"SHA-256"` in a record is fine.
///
/// [`FromStr`]: std::str::FromStr
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-224 (28-byte digest).
    Sha224,
    /// SHA-256 (32-byte digest). The common case.
    Sha256,
    /// SHA-384 (48-byte digest).
    Sha384,
    /// SHA-512 (64-byte digest).
    Sha512,
}

impl HashAlgorithm {
    /// All supported algorithms.
    pub const ALL: [HashAlgorithm; 4] = [Self::Sha224, Self::Sha256, Self::Sha384, Self::Sha512];

    /// Returns the algorithm identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Digest length in bytes.
    pub fn output_len(&self) -> usize {
        match self {
            Self::Sha224 => 28,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// DER content octets of the algorithm's object identifier
    /// (`2.16.840.1.101.3.4.2.x`).
    pub fn oid(&self) -> &'static [u8] {
        match self {
            Self::Sha256 => &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x01],
            Self::Sha384 => &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x02],
            Self::Sha512 => &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x03],
            Self::Sha224 => &[0x60, 0x86, 0x48, 0x01, 0x65, 0x03, 0x04, 0x02, 0x04],
        }
    }

    /// Hash `data`, returning the raw digest bytes.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha224 => Sha224::digest(data).to_vec(),
            Self::Sha256 => Sha256::digest(data).to_vec(),
            Self::Sha384 => Sha384::digest(data).to_vec(),
            Self::Sha512 => Sha512::digest(data).to_vec(),
        }
    }
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HashAlgorithm {
    type Err = PassportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "sha224" => Ok(Self::Sha224),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            other => Err(PassportError::malformed(format!(
                "unsupported hash algorithm: {other:?}"
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for HashAlgorithm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// A digest together with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageDigest {
    /// The algorithm that produced this digest.
    pub algorithm: HashAlgorithm,
    /// Raw digest bytes; length is `algorithm.output_len()`.
    #[serde(with = "hex")]
    pub bytes: Vec<u8>,
}

impl MessageDigest {
    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Access the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Digest length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for an empty digest (never produced by [`hash`]).
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for MessageDigest {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl std::fmt::Display for MessageDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

/// Hash `bytes` with `algorithm`. Pure and deterministic.
pub fn hash(bytes: &[u8], algorithm: HashAlgorithm) -> MessageDigest {
    MessageDigest {
        algorithm,
        bytes: algorithm.digest(bytes),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_accepts_what_from_str_accepts() {
        for text in ["\"sha256\"", "\"SHA-256\"", "\"Sha256\""] {
            let alg: HashAlgorithm = serde_json::from_str(text).unwrap();
            assert_eq!(alg, HashAlgorithm::Sha256, "{text}");
        }
        assert_eq!(
            serde_json::to_string(&HashAlgorithm::Sha512).unwrap(),
            "\"sha512\""
        );
        assert!(serde_json::from_str::<HashAlgorithm>("\"sha1\"").is_err());
    }

    #[test]
    fn known_sha256_vector() {
        let d = hash(b"abc", HashAlgorithm::Sha256);
        assert_eq!(
            d.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn known_sha384_vector() {
        let d = hash(b"abc", HashAlgorithm::Sha384);
        assert!(d
            .to_hex()
            .starts_with("cb00753f45a35e8bb5a03d699ac65007272c32ab0eded1631a8b605a43ff5bed"));
    }

    #[test]
    fn output_lengths_match_digests() {
        for alg in HashAlgorithm::ALL {
            assert_eq!(hash(b"", alg).len(), alg.output_len(), "{alg}");
        }
    }

    #[test]
    fn deterministic_and_input_sensitive() {
        let a = hash(b"P<UTO", HashAlgorithm::Sha256);
        let b = hash(b"P<UTO", HashAlgorithm::Sha256);
        let c = hash(b"P<UTP", HashAlgorithm::Sha256);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn algorithm_parsing() {
        assert_eq!("SHA-256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("sha512".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha512);
        assert!("sha1".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn display_formats() {
        assert_eq!(HashAlgorithm::Sha224.to_string(), "sha224");
        let d = hash(b"", HashAlgorithm::Sha256);
        assert!(d.to_string().starts_with("sha256:e3b0c442"));
    }

    #[test]
    fn digest_serializes_as_hex() {
        let d = hash(b"abc", HashAlgorithm::Sha256);
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["algorithm"], "sha256");
        assert_eq!(json["bytes"].as_str().unwrap().len(), 64);
        let back: MessageDigest = serde_json::from_value(json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn oids_differ_only_in_last_arc() {
        let oids: Vec<&[u8]> = HashAlgorithm::ALL.iter().map(|a| a.oid()).collect();
        for oid in &oids {
            assert_eq!(oid.len(), 9);
            assert_eq!(&oid[..8], &oids[0][..8]);
        }
    }
}
