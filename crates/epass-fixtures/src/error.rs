//! Fixture errors.

use std::path::PathBuf;

use thiserror::Error;

use epass_core::PassportError;

/// Errors producing fixtures.
#[derive(Error, Debug)]
pub enum FixtureError {
    /// Generated data failed pipeline validation.
    #[error("fixture failed validation: {0}")]
    Passport(#[from] PassportError),

    /// The generator was asked for something it cannot produce.
    #[error("unsupported fixture parameters: {0}")]
    Unsupported(String),

    /// A cached fixture could not be read or written.
    #[error("fixture cache {path}: {source}")]
    Cache {
        /// Cache file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}
