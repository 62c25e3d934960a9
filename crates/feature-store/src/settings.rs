//! Feature Store Configuration

use crate::FeatureStoreError;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Environment variable prefix, e.g. `FEATURE_STORE_MIN_SAMPLES=20`
pub const ENV_PREFIX: &str = "FEATURE_STORE";

/// Feature store configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureStoreConfig {
    /// Maximum readings retained per machine (default: 10,000)
    pub buffer_capacity: usize,
    /// Readings required before features are computed (default: 10)
    pub min_samples: usize,
    /// Baseline power draw in kW for `power_deviation` (default: 12.0)
    pub baseline_power: f64,
}

impl Default for FeatureStoreConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: ring_buffer::DEFAULT_CAPACITY,
            min_samples: 10,
            baseline_power: 12.0,
        }
    }
}

impl FeatureStoreConfig {
    /// Small buffers for tests and local replay
    pub fn compact() -> Self {
        Self {
            buffer_capacity: 1_000,
            ..Default::default()
        }
    }

    /// Load configuration: defaults, then an optional TOML file, then
    /// `FEATURE_STORE_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, FeatureStoreError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            info!("Loading feature store config from {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML text (no environment overrides)
    pub fn from_toml_str(toml: &str) -> Result<Self, FeatureStoreError> {
        let config: Self = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check invariants the store relies on
    pub fn validate(&self) -> Result<(), FeatureStoreError> {
        if self.buffer_capacity < 2 {
            return Err(FeatureStoreError::InvalidConfig(format!(
                "buffer_capacity must be at least 2, got {}",
                self.buffer_capacity
            )));
        }
        if self.min_samples == 0 {
            return Err(FeatureStoreError::InvalidConfig(
                "min_samples must be at least 1".to_string(),
            ));
        }
        // Eviction leaves capacity/2 + 1 readings; a Ready machine must stay Ready
        if self.min_samples > self.buffer_capacity / 2 {
            return Err(FeatureStoreError::InvalidConfig(format!(
                "min_samples ({}) must not exceed half of buffer_capacity ({})",
                self.min_samples, self.buffer_capacity
            )));
        }
        if !(self.baseline_power.is_finite() && self.baseline_power > 0.0) {
            return Err(FeatureStoreError::InvalidConfig(format!(
                "baseline_power must be positive, got {}",
                self.baseline_power
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = FeatureStoreConfig::default();
        assert_eq!(config.buffer_capacity, 10_000);
        assert_eq!(config.min_samples, 10);
        assert!(config.validate().is_ok());
        assert!(FeatureStoreConfig::compact().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = FeatureStoreConfig::from_toml_str("min_samples = 25").unwrap();
        assert_eq!(config.min_samples, 25);
        assert_eq!(config.buffer_capacity, 10_000);
        assert_eq!(config.baseline_power, 12.0);
    }

    #[test]
    fn test_full_toml() {
        let config = FeatureStoreConfig::from_toml_str(
            "buffer_capacity = 200\nmin_samples = 5\nbaseline_power = 9.5",
        )
        .unwrap();
        assert_eq!(
            config,
            FeatureStoreConfig {
                buffer_capacity: 200,
                min_samples: 5,
                baseline_power: 9.5,
            }
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = FeatureStoreConfig::from_toml_str("min_samples = 0").unwrap_err();
        assert!(matches!(err, FeatureStoreError::InvalidConfig(_)));

        let err = FeatureStoreConfig::from_toml_str("buffer_capacity = 10\nmin_samples = 6")
            .unwrap_err();
        assert!(matches!(err, FeatureStoreError::InvalidConfig(_)));

        let err = FeatureStoreConfig::from_toml_str("baseline_power = -1.0").unwrap_err();
        assert!(matches!(err, FeatureStoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_toml() {
        let err = FeatureStoreConfig::from_toml_str("min_samples = \"many\"").unwrap_err();
        assert!(matches!(err, FeatureStoreError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = FeatureStoreConfig::load(Some(Path::new("/nonexistent/feature-store.toml")))
            .unwrap_err();
        assert!(matches!(err, FeatureStoreError::Config(_)));
    }
}
