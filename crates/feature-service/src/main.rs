//! Feature Replay - Main Entry Point
//!
//! Usage: `feature-replay [config.toml] < readings.ndjson > snapshots.ndjson`

use feature_service::{init_logging, replay, write_snapshots};
use feature_store::{FeatureStore, FeatureStoreConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging()?;

    info!("=== Feature Store v{} ===", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = FeatureStoreConfig::load(config_path.as_deref())?;
    let store = Arc::new(FeatureStore::new(config));

    let report = replay(Arc::clone(&store), BufReader::new(tokio::io::stdin())).await?;
    let written = write_snapshots(&store, std::io::stdout().lock())?;
    info!("Wrote {} snapshots ({} readings accepted)", written, report.accepted);

    Ok(())
}
