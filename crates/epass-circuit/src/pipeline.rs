//! # Record-to-Inputs Pipeline
//!
//! Runs one [`PassportRecord`] through canonicalization, security-object
//! assembly, the placement check and packaging. Records are independent;
//! a [`Pipeline`] holds only immutable configuration and can be shared
//! across threads.

use epass_core::PassportError;
use epass_sod::{SecurityObject, SecurityObjectAssembler, SecurityObjectTemplate, TemplateRegistry};

use crate::config::PipelineConfig;
use crate::inputs::CircuitInputs;
use crate::packager::CircuitInputPackager;
use crate::record::PassportRecord;

/// Configured pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    registry: TemplateRegistry,
    packager: CircuitInputPackager,
}

impl Pipeline {
    /// Build a pipeline, validating `config`.
    pub fn new(config: PipelineConfig) -> Result<Self, PassportError> {
        config.validate()?;
        let registry = config.registry()?;
        let packager = CircuitInputPackager::new(config.circuit.clone())?;
        Ok(Self {
            config,
            registry,
            packager,
        })
    }

    /// The configuration in use.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Template for the record's declared algorithm and version, falling
    /// back to the configured defaults.
    pub fn template_for(
        &self,
        record: &PassportRecord,
    ) -> Result<&SecurityObjectTemplate, PassportError> {
        let algorithm = record.hash_algorithm.unwrap_or(self.config.algorithm);
        let version = record
            .template_version
            .as_ref()
            .unwrap_or(&self.config.template_version);
        self.registry.get(algorithm, version)
    }

    /// Reconstruct the security object and verify its placement.
    ///
    /// # Errors
    ///
    /// Any [`PassportError`]; [`PassportError::DigestPlacementMismatch`] when
    /// the record is corrupted or the template is misidentified.
    pub fn check(&self, record: &PassportRecord) -> Result<SecurityObject, PassportError> {
        let template = self.template_for(record)?;
        let mrz = record.canonical_mrz()?;
        SecurityObjectAssembler::new(template.clone())?.assemble_and_verify(
            &mrz,
            &record.data_group_hashes,
            &record.e_content,
        )
    }

    /// Produce circuit inputs for `record`.
    pub fn run(&self, record: &PassportRecord) -> Result<CircuitInputs, PassportError> {
        let mrz = record.canonical_mrz()?;
        let object = self.check(record)?;
        self.packager.package(
            &mrz,
            &object,
            &record.e_content,
            &record.signature(),
            &record.modulus,
        )
    }

    /// Mock backend for the default template and this circuit shape.
    #[cfg(feature = "mock")]
    pub fn mock_backend(&self) -> Result<crate::mock::MockProvingBackend, PassportError> {
        let template = self
            .registry
            .get(self.config.algorithm, &self.config.template_version)?;
        Ok(crate::mock::MockProvingBackend::new(
            template.clone(),
            self.config.circuit.limbs,
            self.config.circuit.reveal_length,
        ))
    }
}
