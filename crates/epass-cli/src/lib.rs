//! # epass-cli — Command-Line Front End
//!
//! Provides the `epass` binary over the canonicalization pipeline.
//!
//! ## Subcommands
//!
//! - `epass inputs`: run the pipeline on a record and emit circuit inputs.
//! - `epass check`: digest placement check only, with diagnostics.
//! - `epass reveal`: decode revealed MRZ characters from public signals.
//! - `epass fixture`: emit a synthetic record.
//!
//! ```bash
//! epass fixture --seed 7 --out passport.json
//! epass check --record passport.json
//! epass inputs --record passport.json --config circuit.yaml --out inputs.json
//! ```
//!
//! Handlers return an exit code: `0` success, `1` a record that fails its
//! checks. Errors propagate as [`anyhow::Error`] and are logged by `main`.

pub mod check;
pub mod fixture;
pub mod inputs;
pub mod reveal;

use std::path::Path;

use anyhow::{Context, Result};

use epass_circuit::{PassportRecord, Pipeline, PipelineConfig};

/// Load the pipeline configuration, or the reference defaults without a path.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config: {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

/// Build a pipeline from an optional config file.
pub fn load_pipeline(config: Option<&Path>) -> Result<Pipeline> {
    let config = load_config(config)?;
    Pipeline::new(config).context("invalid pipeline configuration")
}

/// Read and validate a passport record.
pub fn read_record(path: &Path) -> Result<PassportRecord> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading record: {}", path.display()))?;
    PassportRecord::from_json(&text).with_context(|| format!("parsing record: {}", path.display()))
}

/// Write `text` to `out`, or stdout without a path.
pub fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating output directory: {}", parent.display()))?;
            }
            std::fs::write(path, text)
                .with_context(|| format!("writing output: {}", path.display()))?;
            tracing::info!(path = %path.display(), bytes = text.len(), "wrote output");
        }
        None => println!("{text}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_uses_reference_defaults() {
        assert_eq!(load_config(None).unwrap(), PipelineConfig::default());
    }

    #[test]
    fn config_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "circuit: { reveal_length: 0 }\n").unwrap();
        let err = load_pipeline(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("bad.yaml"));
    }

    #[test]
    fn unreadable_record_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_record(&dir.path().join("missing.json")).unwrap_err();
        assert!(format!("{err:#}").contains("missing.json"));
    }

    #[test]
    fn write_output_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b.json");
        write_output(Some(&path), "{}").unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "{}");
    }
}
