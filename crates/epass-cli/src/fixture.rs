//! `epass fixture`: emit a synthetic passport record.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use epass_core::HashAlgorithm;
use epass_fixtures::SyntheticPassport;

use crate::write_output;

/// Arguments for `epass fixture`.
#[derive(Args, Debug)]
pub struct FixtureArgs {
    /// Generator seed. The same seed always yields the same record.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Hash algorithm of the data-group hashes and signed content.
    #[arg(long, default_value = "sha256")]
    pub algorithm: HashAlgorithm,

    /// Modulus size in bits.
    #[arg(long, default_value_t = 2048)]
    pub modulus_bits: u64,

    /// Output file. Prints to stdout if omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Execute `epass fixture`.
pub fn run_fixture(args: &FixtureArgs) -> Result<u8> {
    let record = SyntheticPassport::new(args.seed)
        .with_algorithm(args.algorithm)
        .with_modulus_bits(args.modulus_bits)
        .generate()
        .with_context(|| format!("generating fixture for seed {}", args.seed))?;
    write_output(args.out.as_deref(), &record.to_json_pretty()?)?;
    Ok(0)
}
