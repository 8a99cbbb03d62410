//! On-disk fixture caching.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use epass_circuit::PassportRecord;

use crate::error::FixtureError;
use crate::FixtureProvider;

/// Serves a record from `path`, generating and writing it on first use.
#[derive(Debug, Clone)]
pub struct CachedProvider<P> {
    inner: P,
    path: PathBuf,
}

impl<P: FixtureProvider> CachedProvider<P> {
    /// Cache `inner`'s record at `path`.
    pub fn new(inner: P, path: impl Into<PathBuf>) -> Self {
        Self {
            inner,
            path: path.into(),
        }
    }

    /// The cache file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cache_err(&self, source: std::io::Error) -> FixtureError {
        FixtureError::Cache {
            path: self.path.clone(),
            source,
        }
    }
}

impl<P: FixtureProvider> FixtureProvider for CachedProvider<P> {
    fn passport(&self) -> Result<PassportRecord, FixtureError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) => {
                tracing::debug!(path = %self.path.display(), "fixture cache hit");
                Ok(PassportRecord::from_json(&text)?)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let record = self.inner.passport()?;
                if let Some(parent) = self.path.parent() {
                    std::fs::create_dir_all(parent).map_err(|e| self.cache_err(e))?;
                }
                std::fs::write(&self.path, record.to_json_pretty()?)
                    .map_err(|e| self.cache_err(e))?;
                tracing::debug!(path = %self.path.display(), "fixture cache written");
                Ok(record)
            }
            Err(e) => Err(self.cache_err(e)),
        }
    }
}
