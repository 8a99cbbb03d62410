//! # Structured MRZ Fields
//!
//! [`MrzInfo`] is the decoded view of a [`CanonicalMrz`]. It is what
//! document readers typically report alongside the raw MRZ, and is carried
//! through ingestion as a typed optional field rather than an untyped blob.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::PassportError;
use crate::mrz::{check_digit, CanonicalMrz, MrzField, MRZ_FILLER};

/// Decoded MRZ fields.
///
/// Text fields have fillers stripped; names have fillers replaced with
/// spaces. Dates stay in their printed `YYMMDD` form; see
/// [`MrzInfo::birth_date`] and [`MrzInfo::expiry_date`] for calendar dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MrzInfo {
    /// 1, 2 or 3 for TD1, TD2, TD3.
    pub document_type: u8,
    pub document_code: String,
    pub issuing_state: String,
    /// Surname(s).
    pub primary_identifier: String,
    /// Given name(s).
    pub secondary_identifier: String,
    pub document_number: String,
    pub document_number_check_digit: String,
    pub nationality: String,
    pub date_of_birth: String,
    pub date_of_birth_check_digit: String,
    pub gender: String,
    pub date_of_expiry: String,
    pub date_of_expiry_check_digit: String,
    #[serde(default)]
    pub optional_data1: String,
    #[serde(default)]
    pub optional_data2: String,
    pub composite_check_digit: String,
}

fn strip_fillers(s: &str) -> String {
    s.trim_end_matches(MRZ_FILLER as char).to_string()
}

fn name_part(s: &str) -> String {
    s.replace(MRZ_FILLER as char, " ").trim().to_string()
}

impl MrzInfo {
    /// Decode the fields of a canonical MRZ.
    pub fn parse(mrz: &CanonicalMrz) -> Result<Self, PassportError> {
        let field = |f: MrzField| -> Result<&str, PassportError> {
            mrz.field(f).ok_or_else(|| {
                PassportError::malformed(format!("{:?} missing from {} MRZ", f, mrz.format()))
            })
        };
        let optional = |f: MrzField| mrz.field(f).map(strip_fillers).unwrap_or_default();

        let name = field(MrzField::Name)?;
        let (primary, secondary) = match name.split_once("<<") {
            Some((p, s)) => (name_part(p), name_part(s)),
            None => (name_part(name), String::new()),
        };

        Ok(Self {
            document_type: mrz.format().document_type(),
            document_code: strip_fillers(field(MrzField::DocumentCode)?),
            issuing_state: strip_fillers(field(MrzField::IssuingState)?),
            primary_identifier: primary,
            secondary_identifier: secondary,
            document_number: strip_fillers(field(MrzField::DocumentNumber)?),
            document_number_check_digit: field(MrzField::DocumentNumberCheckDigit)?.to_string(),
            nationality: strip_fillers(field(MrzField::Nationality)?),
            date_of_birth: field(MrzField::DateOfBirth)?.to_string(),
            date_of_birth_check_digit: field(MrzField::DateOfBirthCheckDigit)?.to_string(),
            gender: field(MrzField::Sex)?.to_string(),
            date_of_expiry: field(MrzField::DateOfExpiry)?.to_string(),
            date_of_expiry_check_digit: field(MrzField::DateOfExpiryCheckDigit)?.to_string(),
            optional_data1: optional(MrzField::OptionalData1),
            optional_data2: optional(MrzField::OptionalData2),
            composite_check_digit: field(MrzField::CompositeCheckDigit)?.to_string(),
        })
    }

    /// Birth date, pivoting the two-digit year so the date is not after `today`.
    pub fn birth_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        let (yy, mm, dd) = split_yymmdd(&self.date_of_birth)?;
        let century = if 2000 + yy > today.year() { 1900 } else { 2000 };
        NaiveDate::from_ymd_opt(century + yy, mm, dd)
    }

    /// Expiry date. Two-digit years below 70 are 20xx, others 19xx.
    pub fn expiry_date(&self) -> Option<NaiveDate> {
        let (yy, mm, dd) = split_yymmdd(&self.date_of_expiry)?;
        let century = if yy < 70 { 2000 } else { 1900 };
        NaiveDate::from_ymd_opt(century + yy, mm, dd)
    }

    /// True if the document has expired as of `today`.
    pub fn is_expired(&self, today: NaiveDate) -> Option<bool> {
        self.expiry_date().map(|d| d < today)
    }

    /// Recompute the per-field check digits from the decoded fields.
    ///
    /// Returns the check-digit fields that do not match. The composite digit
    /// needs the filler layout of the printed MRZ; use
    /// [`CanonicalMrz::check_digit_failures`] for it.
    pub fn verify_check_digits(&self) -> Vec<MrzField> {
        let mut document_number = self.document_number.clone();
        while document_number.len() < 9 {
            document_number.push(MRZ_FILLER as char);
        }
        [
            (
                MrzField::DocumentNumberCheckDigit,
                document_number,
                &self.document_number_check_digit,
            ),
            (
                MrzField::DateOfBirthCheckDigit,
                self.date_of_birth.clone(),
                &self.date_of_birth_check_digit,
            ),
            (
                MrzField::DateOfExpiryCheckDigit,
                self.date_of_expiry.clone(),
                &self.date_of_expiry_check_digit,
            ),
        ]
        .into_iter()
        .filter(|(_, data, stored)| {
            let computed = check_digit(data.as_bytes()).map(|c| (c as char).to_string());
            computed.as_deref() != Ok(stored.as_str())
        })
        .map(|(field, _, _)| field)
        .collect()
    }
}

fn split_yymmdd(s: &str) -> Option<(i32, u32, u32)> {
    if s.len() != 6 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let yy = s[0..2].parse().ok()?;
    let mm = s[2..4].parse().ok()?;
    let dd = s[4..6].parse().ok()?;
    Some((yy, mm, dd))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TD3: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<\
                       L898902C36UTO7408122F1204159ZE184226B<<<<<10";

    fn info() -> MrzInfo {
        MrzInfo::parse(&CanonicalMrz::parse(TD3).unwrap()).unwrap()
    }

    #[test]
    fn td3_fields() {
        let i = info();
        assert_eq!(i.document_type, 3);
        assert_eq!(i.document_code, "P");
        assert_eq!(i.issuing_state, "UTO");
        assert_eq!(i.primary_identifier, "ERIKSSON");
        assert_eq!(i.secondary_identifier, "ANNA MARIA");
        assert_eq!(i.document_number, "L898902C3");
        assert_eq!(i.document_number_check_digit, "6");
        assert_eq!(i.nationality, "UTO");
        assert_eq!(i.date_of_birth, "740812");
        assert_eq!(i.gender, "F");
        assert_eq!(i.date_of_expiry, "120415");
        assert_eq!(i.optional_data1, "ZE184226B");
        assert_eq!(i.optional_data2, "");
        assert_eq!(i.composite_check_digit, "0");
    }

    #[test]
    fn td1_fields() {
        let mrz = CanonicalMrz::parse(
            "I<UTOD231458907<<<<<<<<<<<<<<<\
             7408122F1204159UTO<<<<<<<<<<<6\
             ERIKSSON<<ANNA<MARIA<<<<<<<<<<",
        )
        .unwrap();
        let i = MrzInfo::parse(&mrz).unwrap();
        assert_eq!(i.document_type, 1);
        assert_eq!(i.document_code, "I");
        assert_eq!(i.document_number, "D23145890");
        assert_eq!(i.nationality, "UTO");
        assert_eq!(i.secondary_identifier, "ANNA MARIA");
        assert_eq!(i.composite_check_digit, "6");
    }

    #[test]
    fn dates() {
        let i = info();
        let today = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(i.birth_date(today), NaiveDate::from_ymd_opt(1974, 8, 12));
        assert_eq!(i.expiry_date(), NaiveDate::from_ymd_opt(2012, 4, 15));
        assert_eq!(i.is_expired(today), Some(true));
    }

    #[test]
    fn recent_birth_year_pivots_to_2000s() {
        let mut i = info();
        i.date_of_birth = "150101".into();
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert_eq!(i.birth_date(today), NaiveDate::from_ymd_opt(2015, 1, 1));
    }

    #[test]
    fn unparseable_date_is_none() {
        let mut i = info();
        i.date_of_expiry = "12<415".into();
        assert_eq!(i.expiry_date(), None);
        i.date_of_expiry = "121315".into();
        assert_eq!(i.expiry_date(), None);
    }

    #[test]
    fn check_digits_verify() {
        assert!(info().verify_check_digits().is_empty());
        let mut bad = info();
        bad.date_of_birth = "740813".into();
        assert_eq!(bad.verify_check_digits(), vec![MrzField::DateOfBirthCheckDigit]);
    }

    #[test]
    fn serde_uses_camel_case() {
        let json = serde_json::to_value(info()).unwrap();
        assert_eq!(json["primaryIdentifier"], "ERIKSSON");
        assert_eq!(json["documentNumberCheckDigit"], "6");
        let back: MrzInfo = serde_json::from_value(json).unwrap();
        assert_eq!(back, info());
    }
}
