//! # Pipeline Configuration
//!
//! Circuit shape and template selection, loadable from YAML.
//!
//! ```yaml
//! algorithm: sha256
//! template_version: icao-9303-lds-v0
//! circuit:
//!   limbs: { count: 32, width: 64 }
//!   reveal_length: 88
//!   reveal:
//!     ranges: [{ start: 16, end: 22 }]
//! templates: []
//! ```
//!
//! Every key is optional; the defaults reproduce the reference circuit.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use epass_core::{HashAlgorithm, LimbSpec, PassportError};
use epass_sod::{SecurityObjectTemplate, TemplateRegistry, TemplateVersion};

use crate::reveal::{RevealPolicy, REFERENCE_REVEAL_LENGTH};

/// Limb shape of the reference circuit: 32 limbs of 64 bits.
pub const REFERENCE_LIMBS: LimbSpec = LimbSpec::new(32, 64);

/// Errors loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The YAML could not be parsed into a configuration.
    #[error("invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The configuration parsed but is inconsistent.
    #[error(transparent)]
    Invalid(#[from] PassportError),
}

/// Fixed shape of the circuit's inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CircuitConfig {
    /// Limb shape for the signature and modulus.
    pub limbs: LimbSpec,
    /// Disclosure policy.
    pub reveal: RevealPolicy,
    /// Number of reveal flags; the MRZ character count the circuit expects.
    pub reveal_length: usize,
    /// Exact `dataHashes` length the circuit was compiled for, if fixed.
    pub data_hashes_length: Option<usize>,
    /// Exact `signedContentBytes` length the circuit was compiled for, if fixed.
    pub signed_content_length: Option<usize>,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            limbs: REFERENCE_LIMBS,
            reveal: RevealPolicy::reference(),
            reveal_length: REFERENCE_REVEAL_LENGTH,
            data_hashes_length: None,
            signed_content_length: None,
        }
    }
}

impl CircuitConfig {
    /// Reject shapes no input can satisfy.
    pub fn validate(&self) -> Result<(), PassportError> {
        self.limbs.validate()?;
        if self.reveal_length == 0 {
            return Err(PassportError::config("reveal_length must be at least 1"));
        }
        Ok(())
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Default hash algorithm, used when a record does not declare one.
    pub algorithm: HashAlgorithm,
    /// Default template version, used when a record does not declare one.
    pub template_version: TemplateVersion,
    /// Additional templates registered on top of the built-ins.
    pub templates: Vec<SecurityObjectTemplate>,
    /// Circuit shape.
    pub circuit: CircuitConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            algorithm: HashAlgorithm::Sha256,
            template_version: TemplateVersion::icao_lds_v0(),
            templates: Vec::new(),
            circuit: CircuitConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Parse and validate YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(
            path = %path.display(),
            algorithm = %config.algorithm,
            version = %config.template_version,
            limbs = %config.circuit.limbs,
            "loaded pipeline config"
        );
        Ok(config)
    }

    /// Check the circuit shape, every extra template, and that the default
    /// template exists.
    pub fn validate(&self) -> Result<(), PassportError> {
        self.circuit.validate()?;
        self.registry()?
            .get(self.algorithm, &self.template_version)
            .map(|_| ())
    }

    /// Built-in templates plus the configured ones.
    pub fn registry(&self) -> Result<TemplateRegistry, PassportError> {
        let mut registry = TemplateRegistry::with_builtins();
        for template in &self.templates {
            registry.register(template.clone())?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_gives_reference_circuit() {
        let config = PipelineConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.circuit.limbs, LimbSpec::new(32, 64));
        assert_eq!(config.circuit.reveal_length, 88);
        let registry = config.registry().unwrap();
        let template = registry
            .get(config.algorithm, &config.template_version)
            .unwrap();
        assert_eq!(template.digest_offset, 72);
    }

    #[test]
    fn full_yaml() {
        let yaml = r#"
algorithm: sha256
template_version: issuer-x-2019
circuit:
  limbs: { count: 17, width: 121 }
  reveal_length: 88
  reveal:
    fields: [document_number]
  data_hashes_length: 297
templates:
  - algorithm: sha256
    version: issuer-x-2019
    algorithm_identifier: "300d06096086480165030402010500"
    digest_offset: 72
    digest_length: 32
"#;
        let config = PipelineConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.circuit.limbs, LimbSpec::new(17, 121));
        assert_eq!(config.circuit.data_hashes_length, Some(297));
        assert_eq!(config.template_version.as_str(), "issuer-x-2019");
    }

    #[test]
    fn unknown_default_template_rejected() {
        let err = PipelineConfig::from_yaml_str("template_version: nope\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(PassportError::ConfigurationMismatch(_))
        ));
    }

    #[test]
    fn zero_limbs_rejected() {
        let err =
            PipelineConfig::from_yaml_str("circuit:\n  limbs: { count: 0, width: 64 }\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(matches!(
            PipelineConfig::from_yaml_str("limb_count: 32\n"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.yaml");
        std::fs::write(&path, "algorithm: sha384\n").unwrap();
        let config = PipelineConfig::load(&path).unwrap();
        assert_eq!(config.algorithm, HashAlgorithm::Sha384);

        let missing = PipelineConfig::load(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
