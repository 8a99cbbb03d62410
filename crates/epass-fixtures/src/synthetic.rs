//! # Synthetic Passports
//!
//! Deterministic, seeded generation of TD3 passport records whose every
//! relation holds: MRZ check digits verify, the DG1 entry is the digest of
//! the DG1 encoding, the signed attributes carry the digest of the framed
//! data-group hashes at the template offset, and the signature satisfies
//! the mock relation `sig == int(hash(eContent)) mod n`.
//!
//! Nothing here is a real document or a real key.

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use epass_circuit::{PassportRecord, PublicKey};
use epass_core::mrz::MRZ_FILLER;
use epass_core::{
    bytes_to_integer, check_digit, hash, integer_to_bytes, BigUint, ByteOrder, CanonicalMrz,
    HashAlgorithm, MrzInfo,
};
use epass_sod::{
    DataGroupHash, DataGroupHashes, SecurityObjectAssembler, SignedAttributes, TemplateRegistry,
    TemplateVersion,
};

use crate::error::FixtureError;
use crate::FixtureProvider;

const STATES: &[&str] = &["UTO", "D<<", "FRA", "NLD", "ESP", "CAN"];
const SURNAMES: &[&str] = &["ERIKSSON", "MUSTERMANN", "DUPONT", "JANSEN", "GARCIA", "TREMBLAY"];
const GIVEN_NAMES: &[&str] = &["ANNA", "MARIA", "ERIKA", "JEAN", "PIETER", "LUCIA", "NOAH"];

/// Data groups present in a typical eMRTD.
pub const DEFAULT_GROUPS: [u8; 7] = [1, 2, 3, 11, 12, 14, 15];

/// Seeded synthetic passport generator.
#[derive(Debug, Clone)]
pub struct SyntheticPassport {
    seed: u64,
    algorithm: HashAlgorithm,
    modulus_bits: u64,
    groups: Vec<u8>,
}

impl SyntheticPassport {
    /// SHA-256, 2048-bit modulus, the seven default data groups.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            algorithm: HashAlgorithm::Sha256,
            modulus_bits: 2048,
            groups: DEFAULT_GROUPS.to_vec(),
        }
    }

    /// Use a different hash algorithm.
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Use a modulus of exactly `bits` bits.
    pub fn with_modulus_bits(mut self, bits: u64) -> Self {
        self.modulus_bits = bits;
        self
    }

    /// Use these data groups, in this order. DG1 must be among them.
    pub fn with_groups(mut self, groups: &[u8]) -> Self {
        self.groups = groups.to_vec();
        self
    }

    /// Generate the record.
    pub fn generate(&self) -> Result<PassportRecord, FixtureError> {
        if !self.groups.contains(&1) {
            return Err(FixtureError::Unsupported("DG1 must be present".into()));
        }
        // Room for a 512-bit digest below the modulus.
        if self.modulus_bits < 520 {
            return Err(FixtureError::Unsupported(format!(
                "modulus of {} bits is too small",
                self.modulus_bits
            )));
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mrz = CanonicalMrz::parse(&random_td3(&mut rng))?;

        let template = TemplateRegistry::with_builtins()
            .get(self.algorithm, &TemplateVersion::icao_lds_v0())?
            .clone();
        let issuer_list = DataGroupHashes::new(
            self.groups
                .iter()
                .map(|g| DataGroupHash::new(*g, random_bytes(&mut rng, self.algorithm.output_len())))
                .collect(),
        )?;
        let object = SecurityObjectAssembler::new(template)?.assemble(&mrz, &issuer_list)?;

        let signing_time = Utc
            .timestamp_opt(rng.gen_range(1_262_304_000..1_893_456_000), 0)
            .single()
            .ok_or_else(|| FixtureError::Unsupported("signing time out of range".into()))?;
        let e_content = SignedAttributes::new(object.concatenated_digest.bytes.clone())
            .with_signing_time(signing_time)
            .to_der();

        let modulus = random_modulus(&mut rng, self.modulus_bits);
        let message = bytes_to_integer(hash(&e_content, self.algorithm).as_bytes(), ByteOrder::BigEndian);
        let signature = message % &modulus;
        let modulus_len = usize::try_from(self.modulus_bits.div_ceil(8))
            .map_err(|_| FixtureError::Unsupported("modulus too large".into()))?;
        let encrypted_digest = integer_to_bytes(&signature, modulus_len, ByteOrder::BigEndian)?;

        tracing::debug!(
            seed = self.seed,
            algorithm = %self.algorithm,
            groups = self.groups.len(),
            modulus_bits = self.modulus_bits,
            "generated synthetic passport"
        );

        Ok(PassportRecord {
            mrz: mrz.as_str().to_string(),
            mrz_info: Some(MrzInfo::parse(&mrz)?),
            modulus: modulus.clone(),
            public_key: Some(PublicKey::Rsa {
                modulus,
                exponent: BigUint::from(65_537u32),
            }),
            public_key_pem: None,
            data_group_hashes: object.data_group_hashes,
            e_content,
            encrypted_digest,
            hash_algorithm: Some(self.algorithm),
            template_version: None,
        })
    }
}

impl FixtureProvider for SyntheticPassport {
    fn passport(&self) -> Result<PassportRecord, FixtureError> {
        self.generate()
    }
}

fn random_bytes(rng: &mut StdRng, len: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes[..]);
    bytes
}

/// Odd integer of exactly `bits` bits.
fn random_modulus(rng: &mut StdRng, bits: u64) -> BigUint {
    let len = bits.div_ceil(8) as usize;
    let unused = (len as u64 * 8 - bits) as u32;
    let mut bytes = random_bytes(rng, len);
    bytes[0] &= 0xff >> unused;
    bytes[0] |= 0x80 >> unused;
    bytes[len - 1] |= 1;
    bytes_to_integer(&bytes, ByteOrder::BigEndian)
}

fn pick<'a>(rng: &mut StdRng, options: &[&'a str]) -> &'a str {
    options.choose(rng).copied().unwrap_or("X")
}

fn pad(field: &str, len: usize) -> String {
    let mut out: String = field.chars().take(len).collect();
    while out.len() < len {
        out.push(MRZ_FILLER as char);
    }
    out
}

fn with_check_digit(field: &str) -> String {
    let digit = check_digit(field.as_bytes()).map(char::from).unwrap_or('0');
    format!("{field}{digit}")
}

fn random_date(rng: &mut StdRng, from: NaiveDate, days: i64) -> String {
    (from + Duration::days(rng.gen_range(0..days)))
        .format("%y%m%d")
        .to_string()
}

/// Two-line TD3 MRZ with correct check digits.
fn random_td3(rng: &mut StdRng) -> String {
    let state = pick(rng, STATES);
    let nationality = pick(rng, STATES);
    let name = format!(
        "{}<<{}<{}",
        pick(rng, SURNAMES),
        pick(rng, GIVEN_NAMES),
        pick(rng, GIVEN_NAMES)
    );
    let line1 = format!("P<{state}{}", pad(&name, 39));

    const ALNUM: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let number: String = (0..9)
        .map(|_| char::from(ALNUM[rng.gen_range(0..ALNUM.len())]))
        .collect();
    let base = NaiveDate::from_ymd_opt(1950, 1, 1).unwrap_or_default();
    let birth = random_date(rng, base, 55 * 365);
    let expiry = random_date(
        rng,
        NaiveDate::from_ymd_opt(2027, 1, 1).unwrap_or_default(),
        10 * 365,
    );
    let sex = ["M", "F", "<"][rng.gen_range(0..3)];
    let optional = pad("", 14);

    let doc = with_check_digit(&number);
    let birth = with_check_digit(&birth);
    let expiry = with_check_digit(&expiry);
    let optional = with_check_digit(&optional);
    let composite = with_check_digit(&format!("{doc}{birth}{expiry}{optional}"));
    let composite_digit = &composite[composite.len() - 1..];

    let line2 = format!("{doc}{nationality}{birth}{sex}{expiry}{optional}{composite_digit}");
    format!("{line1}\n{line2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_per_seed() {
        let a = SyntheticPassport::new(7).generate().unwrap();
        let b = SyntheticPassport::new(7).generate().unwrap();
        let c = SyntheticPassport::new(8).generate().unwrap();
        assert_eq!(a, b);
        assert_ne!(a.mrz, c.mrz);
    }

    #[test]
    fn mrz_check_digits_verify() {
        for seed in 0..20 {
            let record = SyntheticPassport::new(seed).generate().unwrap();
            let mrz = record.canonical_mrz().unwrap();
            assert_eq!(mrz.len(), 88);
            assert!(mrz.check_digit_failures().is_empty(), "seed {seed}: {}", mrz.as_str());
        }
    }

    #[test]
    fn modulus_has_requested_size() {
        let record = SyntheticPassport::new(1)
            .with_modulus_bits(1031)
            .generate()
            .unwrap();
        assert_eq!(record.modulus.bits(), 1031);
        assert_eq!(record.encrypted_digest.len(), 129);
    }

    #[test]
    fn signed_content_layout() {
        let record = SyntheticPassport::new(3).generate().unwrap();
        assert_eq!(record.e_content.len(), 104);
        assert_eq!(record.data_group_hashes.len(), 7);
    }

    #[test]
    fn rejects_missing_dg1() {
        assert!(matches!(
            SyntheticPassport::new(1).with_groups(&[2, 3]).generate(),
            Err(FixtureError::Unsupported(_))
        ));
    }

    #[test]
    fn rejects_tiny_modulus() {
        assert!(SyntheticPassport::new(1).with_modulus_bits(256).generate().is_err());
    }
}
