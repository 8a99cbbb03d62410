//! `epass reveal`: decode revealed MRZ characters from a proof's public
//! signals.
//!
//! Accepts either a bare JSON array of signals (strings or numbers) or a
//! proof object carrying a `publicSignals` array.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::Value;

use epass_circuit::{decode_revealed, render_revealed, REFERENCE_REVEAL_LENGTH};

/// Arguments for `epass reveal`.
#[derive(Args, Debug)]
pub struct RevealArgs {
    /// JSON file with the public signals.
    #[arg(long)]
    pub signals: PathBuf,

    /// Number of leading signals that encode the MRZ.
    #[arg(long, default_value_t = REFERENCE_REVEAL_LENGTH)]
    pub length: usize,
}

/// Signal strings from a signals array or a proof object.
pub fn parse_signals(value: &Value) -> Result<Vec<String>> {
    let array = match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("publicSignals") {
            Some(Value::Array(items)) => items,
            _ => bail!("expected a \"publicSignals\" array"),
        },
        _ => bail!("expected a JSON array of public signals"),
    };
    array
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            other => bail!("public signal {i} is neither a string nor a number: {other}"),
        })
        .collect()
}

/// Execute `epass reveal`.
pub fn run_reveal(args: &RevealArgs) -> Result<u8> {
    let text = std::fs::read_to_string(&args.signals)
        .with_context(|| format!("reading signals: {}", args.signals.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing signals: {}", args.signals.display()))?;
    let signals = parse_signals(&value)?;
    let chars = decode_revealed(&signals, args.length)?;

    let revealed: Vec<String> = chars
        .iter()
        .enumerate()
        .filter_map(|(i, c)| c.map(|c| format!("{i}={c}")))
        .collect();
    println!("{}", render_revealed(&chars));
    println!("Revealed ({}): {}", revealed.len(), revealed.join(" "));
    Ok(0)
}
