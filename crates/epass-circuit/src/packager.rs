//! # Circuit-Input Packager
//!
//! Aggregates a verified security object, the signed content, and the
//! signature and modulus into [`CircuitInputs`]. No algorithm of its own:
//! decimal strings for bytes, limbs for big integers, a bitmap from policy.
//!
//! ## Invariant
//!
//! Capacity errors from the limb splitter surface as
//! [`PassportError::ConfigurationMismatch`] naming the required limb count,
//! because at this level the fault lies in the circuit configuration, not
//! the value.

use epass_core::{
    limbs_to_decimal, split_to_limbs, to_decimal_strings, BigUint, CanonicalMrz, LimbSpec,
    PassportError,
};
use epass_sod::SecurityObject;

use crate::config::CircuitConfig;
use crate::inputs::CircuitInputs;

/// Check that `value` fits `limbs`, naming the shortfall otherwise.
///
/// # Errors
///
/// [`PassportError::ConfigurationMismatch`] with the bit length of `value`
/// and the limb count it needs at the configured width.
pub fn ensure_capacity(what: &str, value: &BigUint, limbs: LimbSpec) -> Result<(), PassportError> {
    if limbs.fits(value) {
        return Ok(());
    }
    let bits = value.bits();
    let needed = LimbSpec::required_count(bits, limbs.width);
    tracing::warn!(
        what,
        bits,
        configured = %limbs,
        needed,
        "limb capacity too small"
    );
    Err(PassportError::config(format!(
        "{what} is {bits} bits; {limbs} holds {} bits, {needed} limbs of {} bits required",
        limbs.capacity_bits(),
        limbs.width
    )))
}

fn limbs_of(what: &str, value: &BigUint, limbs: LimbSpec) -> Result<Vec<String>, PassportError> {
    ensure_capacity(what, value, limbs)?;
    let split = split_to_limbs(value, limbs.count, limbs.width).map_err(|e| match e {
        PassportError::ValueTooLarge { bits, capacity } => PassportError::config(format!(
            "{what} is {bits} bits, limb capacity is {capacity} bits"
        )),
        other => other,
    })?;
    Ok(limbs_to_decimal(&split))
}

fn check_fixed_length(what: &str, actual: usize, fixed: Option<usize>) -> Result<(), PassportError> {
    match fixed {
        Some(expected) if expected != actual => Err(PassportError::config(format!(
            "{what} is {actual} bytes, circuit is compiled for {expected}"
        ))),
        _ => Ok(()),
    }
}

/// Builds [`CircuitInputs`] for one circuit shape.
#[derive(Debug, Clone)]
pub struct CircuitInputPackager {
    config: CircuitConfig,
}

impl CircuitInputPackager {
    /// Packager for `config`.
    pub fn new(config: CircuitConfig) -> Result<Self, PassportError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The circuit shape in use.
    pub fn config(&self) -> &CircuitConfig {
        &self.config
    }

    /// Package one record.
    ///
    /// `object` must already have passed the placement check against
    /// `signed_content`.
    ///
    /// # Errors
    ///
    /// - [`PassportError::ConfigurationMismatch`] if the signature or modulus
    ///   does not fit the limb shape, or a fixed input length differs.
    /// - [`PassportError::MalformedInput`] if the reveal policy does not fit
    ///   the document.
    pub fn package(
        &self,
        mrz: &CanonicalMrz,
        object: &SecurityObject,
        signed_content: &[u8],
        signature: &BigUint,
        modulus: &BigUint,
    ) -> Result<CircuitInputs, PassportError> {
        let limbs = self.config.limbs;

        check_fixed_length(
            "dataHashes",
            object.concatenated_hashes.len(),
            self.config.data_hashes_length,
        )?;
        check_fixed_length(
            "signedContentBytes",
            signed_content.len(),
            self.config.signed_content_length,
        )?;
        if mrz.len() != self.config.reveal_length {
            return Err(PassportError::config(format!(
                "{} MRZ has {} characters, circuit reveals {}",
                mrz.format(),
                mrz.len(),
                self.config.reveal_length
            )));
        }

        let reveal_bitmap = self
            .config
            .reveal
            .bitmap(mrz.format(), self.config.reveal_length)?;
        let signature = limbs_of("signature", signature, limbs)?;
        let pubkey_modulus = limbs_of("modulus", modulus, limbs)?;

        tracing::debug!(
            mrz_len = object.mrz_preimage.len(),
            data_hashes_len = object.concatenated_hashes.len(),
            signed_len = signed_content.len(),
            revealed = reveal_bitmap.revealed_positions().len(),
            %limbs,
            "packaged circuit inputs"
        );

        Ok(CircuitInputs {
            mrz: to_decimal_strings(&object.mrz_preimage),
            reveal_bitmap,
            data_hashes: to_decimal_strings(&object.concatenated_hashes),
            signed_content_bytes: to_decimal_strings(signed_content),
            signature,
            pubkey_modulus,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epass_core::HashAlgorithm;
    use epass_sod::{DataGroupHash, DataGroupHashes, SecurityObjectAssembler, SecurityObjectTemplate};

    /// Smallest value of exactly `bits` bits.
    fn top_bit(bits: u64) -> BigUint {
        BigUint::from(1u8) << (bits - 1)
    }

    const TD3: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<\
                       L898902C36UTO7408122F1204159ZE184226B<<<<<10";

    fn object() -> (CanonicalMrz, SecurityObject) {
        let mrz = CanonicalMrz::parse(TD3).unwrap();
        let hashes = DataGroupHashes::new(vec![
            DataGroupHash::new(1, vec![0; 32]),
            DataGroupHash::new(2, vec![2; 32]),
        ])
        .unwrap();
        let object = SecurityObjectAssembler::new(SecurityObjectTemplate::icao_lds_v0(
            HashAlgorithm::Sha256,
        ))
        .unwrap()
        .assemble(&mrz, &hashes)
        .unwrap();
        (mrz, object)
    }

    #[test]
    fn reference_shape_packages_2048_bit_values() {
        let (mrz, object) = object();
        let packager = CircuitInputPackager::new(CircuitConfig::default()).unwrap();
        let modulus = top_bit(2048) + BigUint::from(12345u32);
        let signature = top_bit(2040);
        let inputs = packager
            .package(&mrz, &object, &[1, 2, 3], &signature, &modulus)
            .unwrap();

        assert_eq!(inputs.mrz.len(), 93);
        assert_eq!(&inputs.mrz[..5], &["97", "91", "95", "31", "88"]);
        assert_eq!(inputs.reveal_bitmap.len(), 88);
        assert_eq!(inputs.signature.len(), 32);
        assert_eq!(inputs.pubkey_modulus.len(), 32);
        assert_eq!(inputs.pubkey_modulus[0], "12345");
        assert_eq!(inputs.signed_content_bytes, vec!["1", "2", "3"]);
        assert_eq!(
            inputs.modulus_value(CircuitConfig::default().limbs).unwrap(),
            modulus
        );
    }

    #[test]
    fn thirty_one_limbs_is_configuration_mismatch() {
        let (mrz, object) = object();
        let config = CircuitConfig {
            limbs: LimbSpec::new(31, 64),
            ..CircuitConfig::default()
        };
        let packager = CircuitInputPackager::new(config).unwrap();
        let err = packager
            .package(&mrz, &object, &[1], &BigUint::from(1u8), &top_bit(2048))
            .unwrap_err();
        match err {
            PassportError::ConfigurationMismatch(msg) => {
                assert!(msg.contains("2048 bits"), "{msg}");
                assert!(msg.contains("32 limbs"), "{msg}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn fixed_length_mismatch() {
        let (mrz, object) = object();
        let config = CircuitConfig {
            signed_content_length: Some(104),
            ..CircuitConfig::default()
        };
        let packager = CircuitInputPackager::new(config).unwrap();
        assert!(matches!(
            packager.package(&mrz, &object, &[0; 103], &BigUint::from(1u8), &BigUint::from(3u8)),
            Err(PassportError::ConfigurationMismatch(_))
        ));
    }

    #[test]
    fn reveal_length_must_match_mrz() {
        let (mrz, object) = object();
        let config = CircuitConfig {
            reveal_length: 90,
            ..CircuitConfig::default()
        };
        let packager = CircuitInputPackager::new(config).unwrap();
        assert!(packager
            .package(&mrz, &object, &[0], &BigUint::from(1u8), &BigUint::from(3u8))
            .is_err());
    }

    #[test]
    fn ensure_capacity_boundary() {
        let limbs = LimbSpec::new(2, 8);
        assert!(ensure_capacity("x", &BigUint::from(0xffffu32), limbs).is_ok());
        assert!(ensure_capacity("x", &BigUint::from(0x10000u32), limbs).is_err());
    }
}
