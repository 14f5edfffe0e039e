//! Configuration management and validation.
//!
//! Provides configuration structures for identifier schemes and validation
//! behaviour. A configuration can be built in code with the `with_*` methods
//! or loaded from a JSON file.

use crate::app::models::metadata::IdScheme;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Identifier scheme used for each kind of metadata reference in a bundle
///
/// Incoming identifiers on records are interpreted under these schemes. The
/// preprocessor writes attribute option combo identifiers back using the
/// `category_option_combo` scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IdSchemeConfig {
    pub program: IdScheme,
    pub program_stage: IdScheme,
    pub org_unit: IdScheme,
    pub category_option: IdScheme,
    pub category_option_combo: IdScheme,
    pub tracked_entity_type: IdScheme,
}

impl Default for IdSchemeConfig {
    fn default() -> Self {
        Self::uniform(IdScheme::Uid)
    }
}

impl IdSchemeConfig {
    /// Use the same scheme for every metadata kind
    pub fn uniform(scheme: IdScheme) -> Self {
        Self {
            program: scheme,
            program_stage: scheme,
            org_unit: scheme,
            category_option: scheme,
            category_option_combo: scheme,
            tracked_entity_type: scheme,
        }
    }
}

/// How much of the bundle is validated before stopping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationMode {
    /// Run every hook on every record and report everything
    #[default]
    Full,
    /// Stop the validation pass after the first recorded error
    FailFast,
    /// Do not validate; every preprocessed record is accepted
    Skip,
}

/// Whether errors reject single records or the whole bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AtomicMode {
    /// Only records with errors are rejected
    #[default]
    Object,
    /// Any error rejects every record in the bundle
    All,
}

/// Validation behaviour
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationConfig {
    pub validation_mode: ValidationMode,
    pub atomic_mode: AtomicMode,
}

/// Top-level processor configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Identifier schemes for metadata references
    pub id_schemes: IdSchemeConfig,

    /// Validation behaviour
    pub validation: ValidationConfig,
}

impl Config {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a JSON file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::io(
                format!("Failed to read configuration file {}", path.display()),
                e,
            )
        })?;

        let config: Config = serde_json::from_str(&content).map_err(|e| {
            Error::json(
                path.display().to_string(),
                "Invalid configuration file",
                e,
            )
        })?;

        config.validate()?;
        debug!("Loaded configuration from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Validate configuration consistency
    ///
    /// The canonical scheme used when the preprocessor inserts resolved
    /// programs and program stages is UID, so name-based identification is
    /// only accepted for kinds that are never written back.
    pub fn validate(&self) -> Result<()> {
        if self.id_schemes.category_option_combo == IdScheme::Name {
            return Err(Error::configuration(
                "categoryOptionCombo id scheme cannot be NAME: attribute option combos are written back to events and names are not unique",
            ));
        }

        if self.validation.validation_mode == ValidationMode::Skip
            && self.validation.atomic_mode == AtomicMode::All
        {
            debug!("Atomic mode ALL has no effect when validation is skipped");
        }

        Ok(())
    }

    pub fn with_id_schemes(mut self, id_schemes: IdSchemeConfig) -> Self {
        self.id_schemes = id_schemes;
        self
    }

    pub fn with_validation_mode(mut self, mode: ValidationMode) -> Self {
        self.validation.validation_mode = mode;
        self
    }

    pub fn with_atomic_mode(mut self, mode: AtomicMode) -> Self {
        self.validation.atomic_mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.id_schemes, IdSchemeConfig::uniform(IdScheme::Uid));
        assert_eq!(config.validation.validation_mode, ValidationMode::Full);
        assert_eq!(config.validation.atomic_mode, AtomicMode::Object);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = Config::new()
            .with_validation_mode(ValidationMode::FailFast)
            .with_atomic_mode(AtomicMode::All);
        assert_eq!(config.validation.validation_mode, ValidationMode::FailFast);
        assert_eq!(config.validation.atomic_mode, AtomicMode::All);
    }

    #[test]
    fn test_name_scheme_rejected_for_attribute_option_combos() {
        let mut schemes = IdSchemeConfig::default();
        schemes.category_option_combo = IdScheme::Name;
        let config = Config::new().with_id_schemes(schemes);
        assert!(matches!(
            config.validate(),
            Err(Error::Configuration { .. })
        ));
    }

    #[tokio::test]
    async fn test_load_partial_json_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "idSchemes": {{ "program": "code" }}, "validation": {{ "atomicMode": "all" }} }}"#
        )
        .unwrap();

        let config = Config::load(file.path()).await.unwrap();
        assert_eq!(config.id_schemes.program, IdScheme::Code);
        assert_eq!(config.id_schemes.org_unit, IdScheme::Uid);
        assert_eq!(config.validation.atomic_mode, AtomicMode::All);
        assert_eq!(config.validation.validation_mode, ValidationMode::Full);
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/config.json")).await;
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
