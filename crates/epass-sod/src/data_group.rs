//! # Data-Group Hashes
//!
//! The ordered `(group number, digest)` list an issuer records in the
//! security object. Order is significant; group numbers are unique and in
//! `1..=16`.

use serde::{Deserialize, Serialize};

use epass_core::{HashAlgorithm, PassportError};

/// Highest LDS data-group number.
pub const MAX_DATA_GROUP: u8 = 16;

/// One data-group hash entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataGroupHash {
    /// Data-group number, `1..=16`.
    pub group: u8,
    /// Digest of the data group.
    #[serde(with = "hex")]
    pub digest: Vec<u8>,
}

impl DataGroupHash {
    /// Construct an entry.
    pub fn new(group: u8, digest: impl Into<Vec<u8>>) -> Self {
        Self {
            group,
            digest: digest.into(),
        }
    }
}

/// Validated, ordered list of data-group hashes.
///
/// # Invariants
///
/// - Group numbers are unique and in `1..=MAX_DATA_GROUP`.
/// - The list is non-empty.
/// - Order is the issuer's signing order and is never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DataGroupHashes(Vec<DataGroupHash>);

impl DataGroupHashes {
    /// Validate and wrap an ordered list.
    pub fn new(entries: Vec<DataGroupHash>) -> Result<Self, PassportError> {
        if entries.is_empty() {
            return Err(PassportError::malformed("data-group hash list is empty"));
        }
        let mut seen = [false; MAX_DATA_GROUP as usize + 1];
        for entry in &entries {
            if entry.group == 0 || entry.group > MAX_DATA_GROUP {
                return Err(PassportError::malformed(format!(
                    "data-group number {} outside 1..={MAX_DATA_GROUP}",
                    entry.group
                )));
            }
            let slot = &mut seen[usize::from(entry.group)];
            if *slot {
                return Err(PassportError::malformed(format!(
                    "duplicate data-group number {}",
                    entry.group
                )));
            }
            *slot = true;
        }
        Ok(Self(entries))
    }

    /// Entries in signing order.
    pub fn entries(&self) -> &[DataGroupHash] {
        &self.0
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a validated list.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Digest recorded for `group`.
    pub fn get(&self, group: u8) -> Option<&[u8]> {
        self.0
            .iter()
            .find(|e| e.group == group)
            .map(|e| e.digest.as_slice())
    }

    /// Position of `group` in signing order.
    pub fn position(&self, group: u8) -> Option<usize> {
        self.0.iter().position(|e| e.group == group)
    }

    /// Copy with `digest` recorded for `group`.
    ///
    /// An existing entry keeps its position; a missing one is placed first,
    /// where DG1 sits in every issuer ordering.
    pub fn with_digest(&self, group: u8, digest: &[u8]) -> Self {
        let mut entries = self.0.clone();
        match entries.iter_mut().find(|e| e.group == group) {
            Some(entry) => entry.digest = digest.to_vec(),
            None => entries.insert(0, DataGroupHash::new(group, digest)),
        }
        Self(entries)
    }

    /// Require every digest to be `algorithm.output_len()` bytes.
    pub fn check_digest_lengths(&self, algorithm: HashAlgorithm) -> Result<(), PassportError> {
        let expected = algorithm.output_len();
        match self.0.iter().find(|e| e.digest.len() != expected) {
            Some(bad) => Err(PassportError::malformed(format!(
                "DG{} digest is {} bytes, {algorithm} digests are {expected}",
                bad.group,
                bad.digest.len()
            ))),
            None => Ok(()),
        }
    }
}

impl<'de> Deserialize<'de> for DataGroupHashes {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<DataGroupHash>::deserialize(deserializer)?;
        Self::new(entries).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a DataGroupHashes {
    type Item = &'a DataGroupHash;
    type IntoIter = std::slice::Iter<'a, DataGroupHash>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(group: u8) -> DataGroupHash {
        DataGroupHash::new(group, vec![group; 32])
    }

    #[test]
    fn valid_list() {
        let list = DataGroupHashes::new(vec![entry(1), entry(2), entry(14)]).unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(14), Some(&[14u8; 32][..]));
        assert_eq!(list.position(2), Some(1));
    }

    #[test]
    fn empty_rejected() {
        assert!(DataGroupHashes::new(vec![]).is_err());
    }

    #[test]
    fn duplicate_rejected() {
        let err = DataGroupHashes::new(vec![entry(1), entry(2), entry(1)]).unwrap_err();
        assert!(format!("{err}").contains("duplicate data-group number 1"));
    }

    #[test]
    fn out_of_range_rejected() {
        assert!(DataGroupHashes::new(vec![entry(0)]).is_err());
        assert!(DataGroupHashes::new(vec![entry(17)]).is_err());
    }

    #[test]
    fn with_digest_replaces_in_place() {
        let list = DataGroupHashes::new(vec![entry(2), entry(1), entry(3)]).unwrap();
        let updated = list.with_digest(1, &[0xaa; 32]);
        assert_eq!(updated.position(1), Some(1));
        assert_eq!(updated.get(1), Some(&[0xaa; 32][..]));
        // Original untouched.
        assert_eq!(list.get(1), Some(&[1u8; 32][..]));
    }

    #[test]
    fn with_digest_inserts_first_when_missing() {
        let list = DataGroupHashes::new(vec![entry(2), entry(11)]).unwrap();
        let updated = list.with_digest(1, &[0xaa; 32]);
        assert_eq!(updated.len(), 3);
        assert_eq!(updated.position(1), Some(0));
    }

    #[test]
    fn digest_length_check() {
        let list = DataGroupHashes::new(vec![entry(1), DataGroupHash::new(2, vec![0; 20])]).unwrap();
        assert!(list.check_digest_lengths(HashAlgorithm::Sha256).is_err());
        let ok = DataGroupHashes::new(vec![entry(1)]).unwrap();
        assert!(ok.check_digest_lengths(HashAlgorithm::Sha256).is_ok());
        assert!(ok.check_digest_lengths(HashAlgorithm::Sha384).is_err());
    }

    #[test]
    fn deserialization_validates() {
        let json = serde_json::json!([
            {"group": 1, "digest": "00"},
            {"group": 1, "digest": "01"}
        ]);
        assert!(serde_json::from_value::<DataGroupHashes>(json).is_err());
    }
}
