//! # MRZ Canonicalization
//!
//! Turns the Machine-Readable Zone as printed on a travel document into the
//! exact byte sequence the issuer hashed: the MRZ lines concatenated in
//! issuer order, one byte per character, no separators.
//!
//! ## Security Invariant
//!
//! [`CanonicalMrz`] has a private inner buffer. The only constructors
//! ([`CanonicalMrz::parse`], [`canonicalize_mrz`]) enforce the ICAO 9303
//! character set (`0-9`, `A-Z`, `<`) and the line geometry of the document
//! type. A short or long MRZ is never padded or truncated.
//!
//! ## Document Types
//!
//! | Format | Lines | Chars/line | Total |
//! |--------|-------|------------|-------|
//! | TD1    | 3     | 30         | 90    |
//! | TD2    | 2     | 36         | 72    |
//! | TD3    | 2     | 44         | 88    |

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::der::encode_tlv;
use crate::error::PassportError;

/// The MRZ filler character.
pub const MRZ_FILLER: u8 = b'<';

/// DG1 application tag (`[APPLICATION 1]`).
pub const DG1_TAG: u8 = 0x61;

/// MRZ data object tag inside DG1.
pub const MRZ_INFO_TAG: [u8; 2] = [0x5f, 0x1f];

/// ICAO 9303 document format, which fixes the MRZ line geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MrzFormat {
    /// ID-1 size cards: three lines of 30.
    Td1,
    /// ID-2 size documents: two lines of 36.
    Td2,
    /// Passport booklets: two lines of 44.
    Td3,
}

impl MrzFormat {
    /// Number of MRZ lines.
    pub fn line_count(&self) -> usize {
        match self {
            Self::Td1 => 3,
            Self::Td2 | Self::Td3 => 2,
        }
    }

    /// Characters per line.
    pub fn line_length(&self) -> usize {
        match self {
            Self::Td1 => 30,
            Self::Td2 => 36,
            Self::Td3 => 44,
        }
    }

    /// Canonical byte length.
    pub fn total_length(&self) -> usize {
        self.line_count() * self.line_length()
    }

    /// Detect the format from a canonical (separator-free) length.
    pub fn from_length(len: usize) -> Option<Self> {
        [Self::Td1, Self::Td2, Self::Td3]
            .into_iter()
            .find(|f| f.total_length() == len)
    }

    /// Numeric document type (1, 2 or 3).
    pub fn document_type(&self) -> u8 {
        match self {
            Self::Td1 => 1,
            Self::Td2 => 2,
            Self::Td3 => 3,
        }
    }

    /// Returns the format name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Td1 => "TD1",
            Self::Td2 => "TD2",
            Self::Td3 => "TD3",
        }
    }

    fn expected_description(&self) -> String {
        format!("{} ({})", self.total_length(), self.as_str())
    }
}

impl std::fmt::Display for MrzFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named MRZ fields, used for field extraction and field-based reveal policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MrzField {
    DocumentCode,
    IssuingState,
    Name,
    DocumentNumber,
    DocumentNumberCheckDigit,
    Nationality,
    DateOfBirth,
    DateOfBirthCheckDigit,
    Sex,
    DateOfExpiry,
    DateOfExpiryCheckDigit,
    OptionalData1,
    /// TD3 only: check digit over the personal number.
    OptionalData1CheckDigit,
    /// TD1 only: second optional data block.
    OptionalData2,
    CompositeCheckDigit,
}

impl MrzField {
    /// Position range of the field in the canonical MRZ, or `None` if the
    /// format has no such field.
    pub fn range(&self, format: MrzFormat) -> Option<Range<usize>> {
        use MrzField::*;
        let r = match (format, self) {
            (MrzFormat::Td3, DocumentCode) => 0..2,
            (MrzFormat::Td3, IssuingState) => 2..5,
            (MrzFormat::Td3, Name) => 5..44,
            (MrzFormat::Td3, DocumentNumber) => 44..53,
            (MrzFormat::Td3, DocumentNumberCheckDigit) => 53..54,
            (MrzFormat::Td3, Nationality) => 54..57,
            (MrzFormat::Td3, DateOfBirth) => 57..63,
            (MrzFormat::Td3, DateOfBirthCheckDigit) => 63..64,
            (MrzFormat::Td3, Sex) => 64..65,
            (MrzFormat::Td3, DateOfExpiry) => 65..71,
            (MrzFormat::Td3, DateOfExpiryCheckDigit) => 71..72,
            (MrzFormat::Td3, OptionalData1) => 72..86,
            (MrzFormat::Td3, OptionalData1CheckDigit) => 86..87,
            (MrzFormat::Td3, CompositeCheckDigit) => 87..88,

            (MrzFormat::Td2, DocumentCode) => 0..2,
            (MrzFormat::Td2, IssuingState) => 2..5,
            (MrzFormat::Td2, Name) => 5..36,
            (MrzFormat::Td2, DocumentNumber) => 36..45,
            (MrzFormat::Td2, DocumentNumberCheckDigit) => 45..46,
            (MrzFormat::Td2, Nationality) => 46..49,
            (MrzFormat::Td2, DateOfBirth) => 49..55,
            (MrzFormat::Td2, DateOfBirthCheckDigit) => 55..56,
            (MrzFormat::Td2, Sex) => 56..57,
            (MrzFormat::Td2, DateOfExpiry) => 57..63,
            (MrzFormat::Td2, DateOfExpiryCheckDigit) => 63..64,
            (MrzFormat::Td2, OptionalData1) => 64..71,
            (MrzFormat::Td2, CompositeCheckDigit) => 71..72,

            (MrzFormat::Td1, DocumentCode) => 0..2,
            (MrzFormat::Td1, IssuingState) => 2..5,
            (MrzFormat::Td1, DocumentNumber) => 5..14,
            (MrzFormat::Td1, DocumentNumberCheckDigit) => 14..15,
            (MrzFormat::Td1, OptionalData1) => 15..30,
            (MrzFormat::Td1, DateOfBirth) => 30..36,
            (MrzFormat::Td1, DateOfBirthCheckDigit) => 36..37,
            (MrzFormat::Td1, Sex) => 37..38,
            (MrzFormat::Td1, DateOfExpiry) => 38..44,
            (MrzFormat::Td1, DateOfExpiryCheckDigit) => 44..45,
            (MrzFormat::Td1, Nationality) => 45..48,
            (MrzFormat::Td1, OptionalData2) => 48..59,
            (MrzFormat::Td1, CompositeCheckDigit) => 59..60,
            (MrzFormat::Td1, Name) => 60..90,

            _ => return None,
        };
        Some(r)
    }

    /// The check-digit field guarding this field and the ranges it covers.
    fn checked_ranges(format: MrzFormat) -> Vec<(MrzField, Vec<Range<usize>>)> {
        use MrzField::*;
        let mut out = vec![
            (DocumentNumberCheckDigit, vec![DocumentNumber]),
            (DateOfBirthCheckDigit, vec![DateOfBirth]),
            (DateOfExpiryCheckDigit, vec![DateOfExpiry]),
        ];
        if format == MrzFormat::Td3 {
            out.push((OptionalData1CheckDigit, vec![OptionalData1]));
        }
        let mut resolved: Vec<(MrzField, Vec<Range<usize>>)> = out
            .into_iter()
            .map(|(cd, fields)| {
                let ranges = fields.iter().filter_map(|f| f.range(format)).collect();
                (cd, ranges)
            })
            .collect();

        // Composite check digit ranges, per ICAO 9303 Parts 4-6.
        let composite = match format {
            MrzFormat::Td3 => vec![44..54, 57..64, 65..87],
            MrzFormat::Td2 => vec![36..46, 49..56, 57..71],
            MrzFormat::Td1 => vec![5..30, 30..37, 38..45, 48..59],
        };
        resolved.push((CompositeCheckDigit, composite));
        resolved
    }
}

/// Value of an MRZ character for check-digit computation.
fn char_value(c: u8) -> Option<u32> {
    match c {
        b'0'..=b'9' => Some(u32::from(c - b'0')),
        b'A'..=b'Z' => Some(u32::from(c - b'A') + 10),
        MRZ_FILLER => Some(0),
        _ => None,
    }
}

/// ICAO 9303 check digit (weights 7, 3, 1 repeating, modulo 10).
///
/// # Errors
///
/// [`PassportError::MalformedInput`] if `data` contains a character outside
/// the MRZ alphabet.
pub fn check_digit(data: &[u8]) -> Result<u8, PassportError> {
    const WEIGHTS: [u32; 3] = [7, 3, 1];
    let mut sum = 0u32;
    for (i, c) in data.iter().enumerate() {
        let v = char_value(*c).ok_or_else(|| {
            PassportError::malformed(format!("character {:?} not in MRZ alphabet", *c as char))
        })?;
        sum += v * WEIGHTS[i % 3];
    }
    Ok(b'0' + (sum % 10) as u8)
}

fn is_mrz_char(c: char) -> bool {
    c.is_ascii_digit() || c.is_ascii_uppercase() || c == '<'
}

/// The canonical MRZ byte sequence: concatenated lines, one byte per
/// character, fixed length for its format.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalMrz {
    format: MrzFormat,
    bytes: Vec<u8>,
}

impl CanonicalMrz {
    /// Canonicalize an MRZ, detecting the format from its shape.
    ///
    /// Input may be a single concatenated string or the printed lines
    /// separated by line breaks (`\n` or `\r\n`; one trailing break is
    /// tolerated).
    pub fn parse(raw: &str) -> Result<Self, PassportError> {
        let lines = split_lines(raw);
        let format = if lines.len() > 1 {
            let line_len = lines[0].chars().count();
            [MrzFormat::Td1, MrzFormat::Td2, MrzFormat::Td3]
                .into_iter()
                .find(|f| f.line_count() == lines.len() && f.line_length() == line_len)
        } else {
            MrzFormat::from_length(raw.trim_end_matches(&['\r', '\n'][..]).chars().count())
        };
        match format {
            Some(format) => canonicalize_mrz(raw, format),
            None => Err(PassportError::InvalidMrzLength {
                expected: "90 (TD1), 72 (TD2) or 88 (TD3)".into(),
                actual: lines.iter().map(|l| l.chars().count()).sum(),
            }),
        }
    }

    /// Format of this MRZ.
    pub fn format(&self) -> MrzFormat {
        self.format
    }

    /// Canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Canonical text (always ASCII).
    pub fn as_str(&self) -> &str {
        // Constructors admit only ASCII, so this cannot fail.
        std::str::from_utf8(&self.bytes).unwrap_or_default()
    }

    /// Canonical length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; canonical MRZs have a fixed non-zero length.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The `i`-th printed line, if it exists.
    pub fn line(&self, i: usize) -> Option<&[u8]> {
        let len = self.format.line_length();
        self.bytes.get(i * len..(i + 1) * len)
    }

    /// Raw text of a field, including fillers.
    pub fn field(&self, field: MrzField) -> Option<&str> {
        let range = field.range(self.format)?;
        self.as_str().get(range)
    }

    /// DG1 encoding of this MRZ: `61 L 5F1F L <mrz>`.
    ///
    /// This is the preimage the issuer hashes for the DG1 entry of the
    /// security object.
    pub fn dg1_encoding(&self) -> Vec<u8> {
        let inner = encode_tlv(&MRZ_INFO_TAG, &self.bytes);
        encode_tlv(&[DG1_TAG], &inner)
    }

    /// Check-digit fields whose stored digit does not match the computed one.
    ///
    /// An empty result means every check digit verifies.
    pub fn check_digit_failures(&self) -> Vec<MrzField> {
        MrzField::checked_ranges(self.format)
            .into_iter()
            .filter(|(cd_field, ranges)| {
                let Some(cd_range) = cd_field.range(self.format) else {
                    return false;
                };
                let data: Vec<u8> = ranges
                    .iter()
                    .flat_map(|r| self.bytes[r.clone()].iter().copied())
                    .collect();
                let stored = self.bytes[cd_range.start];
                // A filler check digit over an all-filler field is valid.
                if stored == MRZ_FILLER && data.iter().all(|c| *c == MRZ_FILLER) {
                    return false;
                }
                check_digit(&data).map(|cd| cd != stored).unwrap_or(true)
            })
            .map(|(cd_field, _)| cd_field)
            .collect()
    }
}

impl AsRef<[u8]> for CanonicalMrz {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

fn split_lines(raw: &str) -> Vec<&str> {
    raw.lines().collect()
}

/// Canonicalize `raw` as an MRZ of `format`.
///
/// # Errors
///
/// - [`PassportError::InvalidMrzLength`] if the concatenated length, or any
///   line length when lines are separated, does not match the format.
/// - [`PassportError::MalformedInput`] for characters outside `0-9A-Z<`, or
///   the right total length split into the wrong number of lines.
pub fn canonicalize_mrz(raw: &str, format: MrzFormat) -> Result<CanonicalMrz, PassportError> {
    let lines = split_lines(raw);
    if lines.len() > 1 {
        if lines.len() != format.line_count() {
            let actual = lines.iter().map(|l| l.chars().count()).sum::<usize>();
            if actual != format.total_length() {
                return Err(PassportError::InvalidMrzLength {
                    expected: format.expected_description(),
                    actual,
                });
            }
            return Err(PassportError::malformed(format!(
                "{format} MRZ has {} lines, got {}",
                format.line_count(),
                lines.len()
            )));
        }
        for line in &lines {
            let n = line.chars().count();
            if n != format.line_length() {
                return Err(PassportError::InvalidMrzLength {
                    expected: format!("{} per line ({format})", format.line_length()),
                    actual: n,
                });
            }
        }
    }

    let joined: String = lines.concat();
    let actual = joined.chars().count();
    if actual != format.total_length() {
        return Err(PassportError::InvalidMrzLength {
            expected: format.expected_description(),
            actual,
        });
    }
    if let Some((pos, c)) = joined.chars().enumerate().find(|(_, c)| !is_mrz_char(*c)) {
        return Err(PassportError::malformed(format!(
            "character {c:?} at MRZ position {pos} not in 0-9A-Z<"
        )));
    }

    Ok(CanonicalMrz {
        format,
        bytes: joined.into_bytes(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ICAO 9303 Part 4 specimen.
    pub(crate) const TD3_LINE1: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<";
    pub(crate) const TD3_LINE2: &str = "L898902C36UTO7408122F1204159ZE184226B<<<<<10";

    /// ICAO 9303 Part 5 specimen.
    const TD1: [&str; 3] = [
        "I<UTOD231458907<<<<<<<<<<<<<<<",
        "7408122F1204159UTO<<<<<<<<<<<6",
        "ERIKSSON<<ANNA<MARIA<<<<<<<<<<",
    ];

    fn td3() -> String {
        format!("{TD3_LINE1}{TD3_LINE2}")
    }

    #[test]
    fn td3_concatenated() {
        let mrz = canonicalize_mrz(&td3(), MrzFormat::Td3).unwrap();
        assert_eq!(mrz.len(), 88);
        assert_eq!(mrz.as_bytes()[0], b'P');
        assert_eq!(mrz.as_str(), td3());
    }

    #[test]
    fn td3_with_line_breaks_matches_concatenated() {
        let a = CanonicalMrz::parse(&format!("{TD3_LINE1}\n{TD3_LINE2}\n")).unwrap();
        let b = CanonicalMrz::parse(&format!("{TD3_LINE1}\r\n{TD3_LINE2}")).unwrap();
        let c = CanonicalMrz::parse(&td3()).unwrap();
        assert_eq!(a, c);
        assert_eq!(b, c);
        assert_eq!(c.format(), MrzFormat::Td3);
    }

    #[test]
    fn short_mrz_is_length_error() {
        let short = &td3()[..87];
        match canonicalize_mrz(short, MrzFormat::Td3) {
            Err(PassportError::InvalidMrzLength { actual, .. }) => assert_eq!(actual, 87),
            other => panic!("expected InvalidMrzLength, got {other:?}"),
        }
    }

    #[test]
    fn long_mrz_is_length_error() {
        let long = format!("{}<", td3());
        assert!(matches!(
            canonicalize_mrz(&long, MrzFormat::Td3),
            Err(PassportError::InvalidMrzLength { actual: 89, .. })
        ));
        assert!(matches!(
            CanonicalMrz::parse(&long),
            Err(PassportError::InvalidMrzLength { .. })
        ));
    }

    #[test]
    fn extra_line_with_wrong_total_is_length_error() {
        let raw = format!("{TD3_LINE1}\n{TD3_LINE2}\n<");
        assert!(matches!(
            canonicalize_mrz(&raw, MrzFormat::Td3),
            Err(PassportError::InvalidMrzLength { actual: 89, .. })
        ));
        let raw = format!("{TD3_LINE1}\n{}\n{}", &TD3_LINE2[..20], &TD3_LINE2[20..]);
        assert!(matches!(
            canonicalize_mrz(&raw, MrzFormat::Td3),
            Err(PassportError::MalformedInput(_))
        ));
    }

    #[test]
    fn bad_line_length_is_length_error() {
        let raw = format!("{TD3_LINE1}<\n{}", &TD3_LINE2[1..]);
        assert!(matches!(
            canonicalize_mrz(&raw, MrzFormat::Td3),
            Err(PassportError::InvalidMrzLength { .. })
        ));
    }

    #[test]
    fn lowercase_is_malformed() {
        let raw = td3().replacen('P', "p", 1);
        assert!(matches!(
            canonicalize_mrz(&raw, MrzFormat::Td3),
            Err(PassportError::MalformedInput(_))
        ));
    }

    #[test]
    fn non_ascii_is_malformed_not_length() {
        let raw = td3().replacen('E', "É", 1);
        assert!(matches!(
            canonicalize_mrz(&raw, MrzFormat::Td3),
            Err(PassportError::MalformedInput(_))
        ));
    }

    #[test]
    fn td1_detected_from_lines() {
        let mrz = CanonicalMrz::parse(&TD1.join("\n")).unwrap();
        assert_eq!(mrz.format(), MrzFormat::Td1);
        assert_eq!(mrz.len(), 90);
        assert_eq!(mrz.line(2).unwrap(), TD1[2].as_bytes());
        assert!(mrz.line(3).is_none());
    }

    #[test]
    fn dg1_encoding_matches_reference_prefix() {
        let mrz = canonicalize_mrz(&td3(), MrzFormat::Td3).unwrap();
        let dg1 = mrz.dg1_encoding();
        assert_eq!(&dg1[..5], &[97, 91, 95, 31, 88]);
        assert_eq!(dg1.len(), 93);
        assert_eq!(&dg1[5..], mrz.as_bytes());
    }

    #[test]
    fn td1_dg1_prefix() {
        let mrz = CanonicalMrz::parse(&TD1.concat()).unwrap();
        assert_eq!(&mrz.dg1_encoding()[..5], &[0x61, 0x5d, 0x5f, 0x1f, 0x5a]);
    }

    #[test]
    fn field_extraction_td3() {
        let mrz = CanonicalMrz::parse(&td3()).unwrap();
        assert_eq!(mrz.field(MrzField::IssuingState), Some("UTO"));
        assert_eq!(mrz.field(MrzField::DocumentNumber), Some("L898902C3"));
        assert_eq!(mrz.field(MrzField::DateOfBirth), Some("740812"));
        assert_eq!(mrz.field(MrzField::Sex), Some("F"));
        assert_eq!(mrz.field(MrzField::OptionalData2), None);
    }

    #[test]
    fn field_ranges_tile_each_format() {
        use MrzField::*;
        let all = [
            DocumentCode,
            IssuingState,
            Name,
            DocumentNumber,
            DocumentNumberCheckDigit,
            Nationality,
            DateOfBirth,
            DateOfBirthCheckDigit,
            Sex,
            DateOfExpiry,
            DateOfExpiryCheckDigit,
            OptionalData1,
            OptionalData1CheckDigit,
            OptionalData2,
            CompositeCheckDigit,
        ];
        for format in [MrzFormat::Td1, MrzFormat::Td2, MrzFormat::Td3] {
            let mut covered = vec![0u8; format.total_length()];
            for f in all {
                if let Some(r) = f.range(format) {
                    for i in r {
                        covered[i] += 1;
                    }
                }
            }
            assert!(covered.iter().all(|c| *c <= 1), "{format} overlaps");
        }
    }

    #[test]
    fn check_digit_specimens() {
        assert_eq!(check_digit(b"L898902C3").unwrap(), b'6');
        assert_eq!(check_digit(b"740812").unwrap(), b'2');
        assert_eq!(check_digit(b"120415").unwrap(), b'9');
        assert!(check_digit(b"abc").is_err());
    }

    #[test]
    fn specimen_check_digits_verify() {
        let mrz = CanonicalMrz::parse(&td3()).unwrap();
        assert!(mrz.check_digit_failures().is_empty());
        let td1 = CanonicalMrz::parse(&TD1.concat()).unwrap();
        assert!(td1.check_digit_failures().is_empty());
    }

    #[test]
    fn corrupted_check_digit_reported() {
        let raw = td3().replacen("7408122", "7408123", 1);
        let mrz = CanonicalMrz::parse(&raw).unwrap();
        let failures = mrz.check_digit_failures();
        assert!(failures.contains(&MrzField::DateOfBirthCheckDigit));
        assert!(failures.contains(&MrzField::CompositeCheckDigit));
    }

    #[test]
    fn format_geometry() {
        assert_eq!(MrzFormat::Td3.total_length(), 88);
        assert_eq!(MrzFormat::from_length(72), Some(MrzFormat::Td2));
        assert_eq!(MrzFormat::from_length(89), None);
        assert_eq!(MrzFormat::Td1.document_type(), 1);
    }
}
