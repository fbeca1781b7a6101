//! Experiment settings: both engine configurations, loadable from JSON.
//!
//! Missing fields fall back to the built-in defaults, so a settings file
//! only needs the values it changes:
//!
//! ```json
//! { "spatial": { "grid_size": 40, "toxicity_limit": 300.0 } }
//! ```

use crate::error::SimError;
use evotherapy_core::{ConfigError, MeanFieldConfig, SpatialConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Configuration for a full policy comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentSettings {
    pub mean_field: MeanFieldConfig,
    pub spatial: SpatialConfig,
}

impl ExperimentSettings {
    /// Reads and validates settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let settings = Self::from_json(&text)?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Parses and validates settings from JSON text.
    pub fn from_json(text: &str) -> Result<Self, SimError> {
        let settings: Self = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks both engine configurations.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mean_field.validate()?;
        self.spatial.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings =
            ExperimentSettings::from_json(r#"{ "spatial": { "grid_size": 40 } }"#).unwrap();

        assert_eq!(settings.spatial.grid_size, 40);
        assert_eq!(settings.spatial.toxicity_limit, 400.0);
        assert_eq!(settings.mean_field, MeanFieldConfig::default());
    }

    #[test]
    fn test_empty_settings_are_defaults() {
        let settings = ExperimentSettings::from_json("{}").unwrap();
        assert_eq!(settings, ExperimentSettings::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ExperimentSettings::from_json(r#"{ "mean_field": { "dt": -0.1 } }"#).unwrap_err();
        assert!(matches!(err, SimError::Config(ConfigError::NonPositiveStep(_))));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let err = ExperimentSettings::from_json("{ spatial: ").unwrap_err();
        assert!(matches!(err, SimError::Serialization(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = ExperimentSettings::load("/nonexistent/evotherapy.json").unwrap_err();
        assert!(matches!(err, SimError::Io(_)));
    }
}
