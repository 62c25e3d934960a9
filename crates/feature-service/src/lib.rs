//! Feature Service
//!
//! Composition root for the feature store: logging setup, newline-delimited
//! JSON replay through per-machine ingestion workers, and snapshot output.

mod error;
mod ingestor;

pub use error::ServiceError;
pub use ingestor::{parse_record, IngestRecord, Ingestor, DEFAULT_QUEUE_DEPTH};

use feature_store::FeatureStore;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Outcome of one replay run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    /// Records handed to the store
    pub accepted: usize,
    /// Records rejected at the boundary
    pub rejected: usize,
    /// Distinct machines seen
    pub machines: usize,
}

/// Initialize logging to stderr; level from `RUST_LOG`, default `info`
pub fn init_logging() -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

/// Ingest every record from `input`, one JSON object per line.
///
/// Malformed or non-UTF-8 lines and records without a machine id are
/// logged and skipped; they never reach the store.
pub async fn replay<R>(store: Arc<FeatureStore>, mut input: R) -> Result<ReplayReport, ServiceError>
where
    R: AsyncBufRead + Unpin,
{
    let mut ingestor = Ingestor::new(store, DEFAULT_QUEUE_DEPTH);
    let mut accepted = 0;
    let mut rejected = 0;
    let mut line = 0;
    let mut bytes = Vec::new();

    loop {
        bytes.clear();
        if input.read_until(b'\n', &mut bytes).await? == 0 {
            break;
        }
        line += 1;

        let text = match std::str::from_utf8(&bytes) {
            Ok(text) => text.trim(),
            Err(source) => {
                warn!("Rejected record: {}", ServiceError::Encoding { line, source });
                rejected += 1;
                continue;
            }
        };
        if text.is_empty() {
            continue;
        }

        match parse_record(text, line) {
            Ok(record) => {
                ingestor.submit(record).await?;
                accepted += 1;
            }
            Err(e) => {
                warn!("Rejected record: {}", e);
                rejected += 1;
            }
        }
    }

    let machines = ingestor.machine_count();
    ingestor.finish().await?;

    info!(
        "Replay complete: {} accepted, {} rejected, {} machines",
        accepted, rejected, machines
    );
    Ok(ReplayReport {
        accepted,
        rejected,
        machines,
    })
}

/// Write one `FeatureSnapshot` JSON line per machine, returning how many
/// were written
pub fn write_snapshots<W: Write>(store: &FeatureStore, mut writer: W) -> Result<usize, ServiceError> {
    let mut written = 0;
    for machine_id in store.machine_ids() {
        // Cleared between listing and lookup
        let snapshot = match store.get_features(&machine_id) {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e.into()),
        };
        serde_json::to_writer(&mut writer, &snapshot)?;
        writeln!(writer)?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use feature_store::FeatureStoreConfig;

    fn input() -> String {
        let mut lines = Vec::new();
        for i in 0..12 {
            lines.push(format!(
                r#"{{"machine_id":"CNC-ALPHA-921","values":{{"vibration_rms":{},"temperature":44.0,"power_consumption":12.3}}}}"#,
                20.0 + i as f64
            ));
        }
        for _ in 0..3 {
            lines.push(r#"{"machine_id":"LATHE-7","values":{"temp":39.5}}"#.to_string());
        }
        lines.push("{broken".to_string());
        lines.push(r#"{"values":{"temp":39.5}}"#.to_string());
        lines.push(String::new());
        lines.join("\n")
    }

    #[tokio::test]
    async fn test_replay() {
        let store = Arc::new(FeatureStore::new(FeatureStoreConfig::compact()));
        let report = replay(Arc::clone(&store), input().as_bytes()).await.unwrap();

        assert_eq!(
            report,
            ReplayReport {
                accepted: 15,
                rejected: 2,
                machines: 2,
            }
        );

        let alpha = store.get_features("CNC-ALPHA-921").unwrap();
        assert!(alpha.data_quality.sufficient);
        assert_eq!(
            alpha.features.unwrap().get("vibration_peak"),
            Some(31.0)
        );

        let lathe = store.get_features("LATHE-7").unwrap();
        assert!(!lathe.data_quality.sufficient);
        assert!(lathe.features.is_none());
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_rejected() {
        let mut input = Vec::new();
        input.extend_from_slice(b"{\"machine_id\":\"CNC-1\",\"values\":{\"temp\":40.0}}\n");
        input.extend_from_slice(b"{\"machine_id\":\"CNC-1\",\"values\":{\"temp\":\xff\xfe}}\n");
        input.extend_from_slice(b"{\"machine_id\":\"CNC-1\",\"values\":{\"temp\":41.0}}\r\n");

        let store = Arc::new(FeatureStore::new(FeatureStoreConfig::compact()));
        let report = replay(Arc::clone(&store), input.as_slice()).await.unwrap();

        assert_eq!(
            report,
            ReplayReport {
                accepted: 2,
                rejected: 1,
                machines: 1,
            }
        );
        assert_eq!(store.get_features("CNC-1").unwrap().data_quality.buffer_size, 2);
    }

    #[tokio::test]
    async fn test_write_snapshots() {
        let store = Arc::new(FeatureStore::new(FeatureStoreConfig::compact()));
        replay(Arc::clone(&store), input().as_bytes()).await.unwrap();

        let mut out = Vec::new();
        assert_eq!(write_snapshots(&store, &mut out).unwrap(), 2);

        let text = String::from_utf8(out).unwrap();
        let rows: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(rows[0]["machine_id"], "CNC-ALPHA-921");
        assert_eq!(rows[0]["data_quality"]["buffer_size"], 12);
        assert!(rows[1]["features"].is_null());
    }
}
