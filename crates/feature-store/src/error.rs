//! Feature Store Error Types

use thiserror::Error;

/// Errors returned by the feature store
#[derive(Debug, Error)]
pub enum FeatureStoreError {
    /// Machine has never been ingested (or was cleared)
    #[error("No data available for machine {0}")]
    NotFound(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration loaded but failed validation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FeatureStoreError {
    /// Whether this is the normal "no data yet" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, FeatureStoreError::NotFound(_))
    }
}
