//! Per-Machine Ingestion Workers
//!
//! Each machine gets one task that owns the only sender path into the
//! store for that id, so its readings are applied in arrival order while
//! different machines proceed in parallel.

use crate::ServiceError;
use feature_store::{FeatureStore, RawReading};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Default per-machine queue depth
pub const DEFAULT_QUEUE_DEPTH: usize = 256;

/// One line of replay input
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRecord {
    #[serde(default)]
    pub machine_id: String,
    #[serde(flatten)]
    pub reading: RawReading,
}

/// Parse and validate one NDJSON line (1-based `line` for error reporting)
pub fn parse_record(text: &str, line: usize) -> Result<IngestRecord, ServiceError> {
    let record: IngestRecord =
        serde_json::from_str(text).map_err(|source| ServiceError::Parse { line, source })?;

    if record.machine_id.trim().is_empty() {
        return Err(ServiceError::MissingMachineId { line });
    }
    Ok(record)
}

struct Worker {
    sender: mpsc::Sender<RawReading>,
    handle: JoinHandle<usize>,
}

/// Routes records to per-machine single-writer tasks
pub struct Ingestor {
    store: Arc<FeatureStore>,
    workers: HashMap<String, Worker>,
    queue_depth: usize,
}

impl Ingestor {
    /// Create an ingestor writing into `store`
    pub fn new(store: Arc<FeatureStore>, queue_depth: usize) -> Self {
        Self {
            store,
            workers: HashMap::new(),
            queue_depth: queue_depth.max(1),
        }
    }

    /// Queue a validated record for its machine's worker
    pub async fn submit(&mut self, record: IngestRecord) -> Result<(), ServiceError> {
        let IngestRecord { machine_id, reading } = record;

        let sender = match self.workers.get(&machine_id) {
            Some(worker) => worker.sender.clone(),
            None => {
                let worker = self.spawn_worker(&machine_id);
                let sender = worker.sender.clone();
                self.workers.insert(machine_id.clone(), worker);
                sender
            }
        };

        sender
            .send(reading)
            .await
            .map_err(|_| ServiceError::WorkerClosed(machine_id))
    }

    /// Number of machines with a worker
    pub fn machine_count(&self) -> usize {
        self.workers.len()
    }

    /// Close every queue and wait for the workers to drain.
    ///
    /// Returns the total number of readings ingested.
    pub async fn finish(self) -> Result<usize, ServiceError> {
        let mut total = 0;
        for (machine_id, worker) in self.workers {
            drop(worker.sender);
            let count = worker.handle.await?;
            debug!("Worker for {} drained {} readings", machine_id, count);
            total += count;
        }
        Ok(total)
    }

    fn spawn_worker(&self, machine_id: &str) -> Worker {
        info!("Starting ingestion worker for {}", machine_id);
        let (sender, mut receiver) = mpsc::channel::<RawReading>(self.queue_depth);
        let store = Arc::clone(&self.store);
        let machine_id = machine_id.to_string();

        let handle = tokio::spawn(async move {
            let mut count = 0;
            while let Some(reading) = receiver.recv().await {
                store.ingest(&machine_id, reading);
                count += 1;
            }
            count
        });

        Worker { sender, handle }
    }
}
