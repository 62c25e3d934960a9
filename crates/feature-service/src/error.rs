//! Service Error Types

use feature_store::FeatureStoreError;
use thiserror::Error;

/// Errors at the service boundary
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Record has no (or an empty) machine id
    #[error("Line {line}: missing required field machine_id")]
    MissingMachineId { line: usize },

    /// Record is not valid JSON of the expected shape
    #[error("Line {line}: invalid record: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Record bytes are not valid UTF-8
    #[error("Line {line}: invalid UTF-8: {source}")]
    Encoding {
        line: usize,
        #[source]
        source: std::str::Utf8Error,
    },

    /// Output could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A per-machine worker stopped before its queue drained
    #[error("Ingestion worker for {0} stopped unexpectedly")]
    WorkerClosed(String),

    #[error("Ingestion worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Store(#[from] FeatureStoreError),
}
