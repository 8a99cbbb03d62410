//! # epass CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use epass_cli::check::{run_check, CheckArgs};
use epass_cli::fixture::{run_fixture, FixtureArgs};
use epass_cli::inputs::{run_inputs, InputsArgs};
use epass_cli::reveal::{run_reveal, RevealArgs};

/// ePassport circuit-input toolchain.
///
/// Canonicalizes passport records into the fixed-shape inputs of the
/// passport circuit, checks digest placement, and decodes revealed MRZ
/// characters from proof outputs.
#[derive(Parser, Debug)]
#[command(name = "epass", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the pipeline on a record and emit circuit inputs.
    Inputs(InputsArgs),

    /// Check that the reconstructed digest sits at the template offset.
    Check(CheckArgs),

    /// Decode revealed MRZ characters from public signals.
    Reveal(RevealArgs),

    /// Emit a synthetic passport record.
    Fixture(FixtureArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Inputs(args) => run_inputs(&args),
        Commands::Check(args) => run_check(&args),
        Commands::Reveal(args) => run_reveal(&args),
        Commands::Fixture(args) => run_fixture(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
