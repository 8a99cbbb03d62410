//! End-to-end reconstruction of a seven-group SHA-256 security object, laid
//! out the way production passports are, followed by placement checks.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use epass_core::{CanonicalMrz, HashAlgorithm, PassportError};
use epass_sod::{
    locate_message_digest, DataGroupHash, DataGroupHashes, SecurityObjectAssembler,
    SecurityObjectTemplate, SignedAttributes, TemplateRegistry, TemplateVersion,
};

const MRZ: &str = "P<UTOERIKSSON<<ANNA<MARIA<<<<<<<<<<<<<<<<<<<\n\
                   L898902C36UTO7408122F1204159ZE184226B<<<<<10\n";

fn issuer_hashes() -> DataGroupHashes {
    // DG1 is a placeholder; the assembler replaces it with the MRZ digest.
    let entries = [1u8, 2, 3, 11, 12, 14, 15]
        .iter()
        .map(|g| DataGroupHash::new(*g, (0..32).map(|i| i * 7 + g).collect::<Vec<u8>>()))
        .collect();
    DataGroupHashes::new(entries).unwrap()
}

fn issue() -> (SecurityObjectAssembler, Vec<u8>) {
    let registry = TemplateRegistry::default();
    let template = registry
        .get(HashAlgorithm::Sha256, &TemplateVersion::icao_lds_v0())
        .unwrap()
        .clone();
    let assembler = SecurityObjectAssembler::new(template).unwrap();
    let mrz = CanonicalMrz::parse(MRZ).unwrap();
    let object = assembler.assemble(&mrz, &issuer_hashes()).unwrap();
    let signed = SignedAttributes::new(object.concatenated_digest.bytes.clone())
        .with_signing_time(Utc.with_ymd_and_hms(2012, 4, 15, 9, 0, 0).unwrap())
        .to_der();
    (assembler, signed)
}

#[test]
fn known_good_record_verifies() {
    let (assembler, signed) = issue();
    let mrz = CanonicalMrz::parse(MRZ).unwrap();
    let object = assembler
        .assemble_and_verify(&mrz, &issuer_hashes(), &signed)
        .unwrap();

    assert_eq!(signed.len(), 104);
    assert_eq!(&signed[72..104], object.concatenated_digest.as_bytes());
    assert_eq!(object.concatenated_hashes.len(), 24 + 7 * 39);
    assert_eq!(
        hex::encode(&object.concatenated_hashes[..24]),
        "30820125020100300b060960864801650304020130820111"
    );
}

#[test]
fn located_offset_agrees_with_template() {
    let (assembler, signed) = issue();
    let loc = locate_message_digest(&signed).unwrap();
    assert_eq!(loc.offset, assembler.template().digest_offset);
    assert_eq!(loc.length, assembler.template().digest_length);
}

#[test]
fn mutated_mrz_fails_placement() {
    let (assembler, signed) = issue();
    let tampered = MRZ.replacen("ERIKSSON", "ERIKSSEN", 1);
    let mrz = CanonicalMrz::parse(&tampered).unwrap();
    assert!(matches!(
        assembler.assemble_and_verify(&mrz, &issuer_hashes(), &signed),
        Err(PassportError::DigestPlacementMismatch { .. })
    ));
}

#[test]
fn misidentified_template_is_detected() {
    let (_, signed) = issue();
    let mut template = SecurityObjectTemplate::icao_lds_v0(HashAlgorithm::Sha256);
    template.digest_offset = 70;
    let assembler = SecurityObjectAssembler::new(template).unwrap();
    let mrz = CanonicalMrz::parse(MRZ).unwrap();
    let err = assembler
        .assemble_and_verify(&mrz, &issuer_hashes(), &signed)
        .unwrap_err();
    assert!(err.to_string().contains("offset 70"));
}

proptest! {
    #[test]
    fn any_single_byte_flip_of_signed_digest_fails(pos in 72usize..104, bit in 0u8..8) {
        let (assembler, mut signed) = issue();
        signed[pos] ^= 1 << bit;
        let mrz = CanonicalMrz::parse(MRZ).unwrap();
        let is_mismatch = matches!(
            assembler.assemble_and_verify(&mrz, &issuer_hashes(), &signed),
            Err(PassportError::DigestPlacementMismatch { .. })
        );
        prop_assert!(is_mismatch);
    }

    #[test]
    fn any_single_byte_flip_of_a_data_group_hash_fails(
        group_idx in 1usize..7,
        pos in 0usize..32,
        bit in 0u8..8,
    ) {
        let (assembler, signed) = issue();
        let mut entries = issuer_hashes().entries().to_vec();
        entries[group_idx].digest[pos] ^= 1 << bit;
        let tampered = DataGroupHashes::new(entries).unwrap();
        let mrz = CanonicalMrz::parse(MRZ).unwrap();
        prop_assert!(assembler.assemble_and_verify(&mrz, &tampered, &signed).is_err());
    }
}
