//! `epass check`: digest placement check with diagnostics.
//!
//! On a mismatch the signed content is walked for its `messageDigest`
//! attribute, so a misidentified template offset can be told apart from a
//! record whose hashes do not match what was signed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use epass_core::PassportError;
use epass_sod::locate_message_digest;

use crate::{load_pipeline, read_record};

/// Arguments for `epass check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Passport record JSON.
    #[arg(long)]
    pub record: PathBuf,

    /// Pipeline configuration YAML. Defaults to the reference circuit.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Execute `epass check`.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let pipeline = load_pipeline(args.config.as_deref())?;
    let record = read_record(&args.record)?;

    for field in record.canonical_mrz()?.check_digit_failures() {
        println!("WARN: MRZ check digit does not verify: {field:?}");
    }

    match pipeline.check(&record) {
        Ok(object) => {
            let template = pipeline.template_for(&record)?;
            println!(
                "OK: {} digest {} found at offset {}",
                template.algorithm,
                object.concatenated_digest.to_hex(),
                template.digest_offset
            );
            Ok(0)
        }
        Err(PassportError::DigestPlacementMismatch {
            offset,
            length,
            expected,
            found,
        }) => {
            println!("FAIL: reconstructed digest not found at offset {offset} (length {length})");
            println!("  Expected: {expected}");
            println!("  Found:    {}", found.as_deref().unwrap_or("<out of bounds>"));
            match locate_message_digest(&record.e_content) {
                Ok(located) if located.offset != offset || located.length != length => println!(
                    "  messageDigest is at offset {} (length {}); the template offset is likely misidentified",
                    located.offset, located.length
                ),
                Ok(_) => println!(
                    "  messageDigest is at the configured offset; the record's hashes do not match its signed content"
                ),
                Err(e) => println!("  messageDigest not located: {e}"),
            }
            Ok(1)
        }
        Err(e) => Err(e).with_context(|| format!("checking record: {}", args.record.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use epass_fixtures::{Mutation, SyntheticPassport};

    fn write_record(dir: &std::path::Path, record: &epass_circuit::PassportRecord) -> PathBuf {
        let path = dir.join("record.json");
        std::fs::write(&path, record.to_json_pretty().unwrap()).unwrap();
        path
    }

    #[test]
    fn valid_record_passes() {
        let dir = tempfile::tempdir().unwrap();
        let record = SyntheticPassport::new(1).generate().unwrap();
        let args = CheckArgs {
            record: write_record(dir.path(), &record),
            config: None,
        };
        assert_eq!(run_check(&args).unwrap(), 0);
    }

    #[test]
    fn corrupted_record_fails_with_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let record = SyntheticPassport::new(1).generate().unwrap();
        let record = Mutation::DataGroupHashByte { group: 2, index: 0 }
            .apply(&record)
            .unwrap();
        let args = CheckArgs {
            record: write_record(dir.path(), &record),
            config: None,
        };
        assert_eq!(run_check(&args).unwrap(), 1);
    }

    #[test]
    fn misidentified_offset_fails_with_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.yaml");
        std::fs::write(
            &config,
            r#"
template_version: shifted
templates:
  - algorithm: sha256
    version: shifted
    algorithm_identifier: "300b0609608648016503040201"
    digest_offset: 70
    digest_length: 32
"#,
        )
        .unwrap();
        let record = SyntheticPassport::new(2).generate().unwrap();
        let args = CheckArgs {
            record: write_record(dir.path(), &record),
            config: Some(config),
        };
        assert_eq!(run_check(&args).unwrap(), 1);
    }
}
