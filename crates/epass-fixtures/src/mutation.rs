//! Single-point corruptions of a valid record, for negative tests.

use epass_circuit::PassportRecord;
use epass_sod::DataGroupHashes;

use crate::error::FixtureError;

const MRZ_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ<";

/// One corruption of a [`PassportRecord`].
///
/// Changing the DG1 digest has no effect on the pipeline: the DG1 entry is
/// always recomputed from the MRZ. Mutate the MRZ instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Replace the MRZ character at this canonical position with another
    /// valid MRZ character.
    MrzCharacter(usize),
    /// Flip the low bit of one byte of one data-group digest.
    DataGroupHashByte {
        /// Data-group number.
        group: u8,
        /// Byte index within the digest.
        index: usize,
    },
    /// Flip the low bit of one signed-content byte.
    SignedContentByte(usize),
    /// Flip the low bit of one signature byte.
    SignatureByte(usize),
}

fn out_of_range(what: &str, index: usize, len: usize) -> FixtureError {
    FixtureError::Unsupported(format!("{what} index {index} outside 0..{len}"))
}

impl Mutation {
    /// Corrupted copy of `record`.
    pub fn apply(&self, record: &PassportRecord) -> Result<PassportRecord, FixtureError> {
        let mut out = record.clone();
        match *self {
            Mutation::MrzCharacter(index) => {
                let mrz = record.canonical_mrz()?;
                let mut bytes = mrz.as_bytes().to_vec();
                let c = bytes
                    .get_mut(index)
                    .ok_or_else(|| out_of_range("MRZ", index, mrz.len()))?;
                let pos = MRZ_ALPHABET.iter().position(|a| a == c).unwrap_or(0);
                *c = MRZ_ALPHABET[(pos + 1) % MRZ_ALPHABET.len()];
                out.mrz = String::from_utf8_lossy(&bytes).into_owned();
            }
            Mutation::DataGroupHashByte { group, index } => {
                let mut entries = record.data_group_hashes.entries().to_vec();
                let entry = entries
                    .iter_mut()
                    .find(|e| e.group == group)
                    .ok_or_else(|| FixtureError::Unsupported(format!("no DG{group} in record")))?;
                let len = entry.digest.len();
                *entry
                    .digest
                    .get_mut(index)
                    .ok_or_else(|| out_of_range("digest", index, len))? ^= 0x01;
                out.data_group_hashes = DataGroupHashes::new(entries)?;
            }
            Mutation::SignedContentByte(index) => {
                let len = out.e_content.len();
                *out
                    .e_content
                    .get_mut(index)
                    .ok_or_else(|| out_of_range("eContent", index, len))? ^= 0x01;
            }
            Mutation::SignatureByte(index) => {
                let len = out.encrypted_digest.len();
                *out
                    .encrypted_digest
                    .get_mut(index)
                    .ok_or_else(|| out_of_range("encryptedDigest", index, len))? ^= 0x01;
            }
        }
        Ok(out)
    }
}
