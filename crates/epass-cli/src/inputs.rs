//! `epass inputs`: run the pipeline and emit the circuit-input JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::{load_pipeline, read_record, write_output};

/// Arguments for `epass inputs`.
#[derive(Args, Debug)]
pub struct InputsArgs {
    /// Passport record JSON.
    #[arg(long)]
    pub record: PathBuf,

    /// Pipeline configuration YAML. Defaults to the reference circuit.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output file. Prints to stdout if omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

/// Execute `epass inputs`.
pub fn run_inputs(args: &InputsArgs) -> Result<u8> {
    let pipeline = load_pipeline(args.config.as_deref())?;
    let record = read_record(&args.record)?;
    let inputs = pipeline
        .run(&record)
        .with_context(|| format!("packaging record: {}", args.record.display()))?;
    write_output(args.out.as_deref(), &inputs.to_json_pretty()?)?;
    Ok(0)
}
