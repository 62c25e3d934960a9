//! Feature Store Orchestrator

use crate::cache::FeatureCache;
use crate::context::{NoContext, OperationalContext};
use crate::settings::FeatureStoreConfig;
use crate::statistics::{self, StatisticsReport};
use crate::sync;
use crate::FeatureStoreError;
use chrono::{DateTime, TimeZone, Utc};
use feature_engine::{FeatureExtractor, FeatureVector};
use ring_buffer::{RawReading, Reading, RingBuffer};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::{debug, info};

/// Data quality metadata computed at retrieval time
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQuality {
    /// Readings currently buffered
    pub buffer_size: usize,
    /// Whether the buffer has reached the minimum sample count
    pub sufficient: bool,
    /// Last feature recomputation, or last ingestion while insufficient
    pub last_update: DateTime<Utc>,
    pub staleness_seconds: f64,
}

/// Cached features plus freshly computed metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureSnapshot {
    pub machine_id: String,
    /// `None` until the machine has enough samples
    pub features: Option<FeatureVector>,
    pub data_quality: DataQuality,
    pub retrieved_at: DateTime<Utc>,
}

/// Per-machine state. The mutex serializes append, eviction and
/// recomputation; the atomics let readers see metadata without it.
struct MachineSlot {
    buffer: Mutex<RingBuffer>,
    buffer_len: AtomicUsize,
    last_ingest_ms: AtomicI64,
    /// Set under `buffer` when the slot is cleared
    retired: AtomicBool,
}

impl MachineSlot {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: Mutex::new(RingBuffer::new(capacity)),
            buffer_len: AtomicUsize::new(0),
            last_ingest_ms: AtomicI64::new(0),
            retired: AtomicBool::new(false),
        }
    }

    fn last_ingest(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.last_ingest_ms.load(Ordering::Acquire))
            .single()
    }
}

/// Multi-machine feature store
pub struct FeatureStore {
    config: FeatureStoreConfig,
    extractor: FeatureExtractor,
    context: Arc<dyn OperationalContext>,
    machines: RwLock<HashMap<String, Arc<MachineSlot>>>,
    cache: FeatureCache,
}

impl FeatureStore {
    /// Create a store without external operational context
    pub fn new(config: FeatureStoreConfig) -> Self {
        Self::with_context(config, Arc::new(NoContext))
    }

    /// Create a store that reads maintenance and cycle data from `context`
    pub fn with_context(config: FeatureStoreConfig, context: Arc<dyn OperationalContext>) -> Self {
        info!("Creating feature store with config: {:?}", config);
        Self {
            extractor: FeatureExtractor::new(config.baseline_power),
            config,
            context,
            machines: RwLock::new(HashMap::new()),
            cache: FeatureCache::new(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &FeatureStoreConfig {
        &self.config
    }

    /// Ingest a reading and, once the machine has enough samples,
    /// recompute and cache its full feature vector.
    pub fn ingest(&self, machine_id: &str, raw: RawReading) {
        let now = Utc::now();
        let reading = Reading::from_raw(machine_id, raw, now);

        loop {
            let slot = self.slot_or_insert(machine_id);
            let mut buffer = sync::lock(&slot.buffer);

            // Cleared while we waited; pick up the replacement slot
            if slot.retired.load(Ordering::Acquire) {
                continue;
            }

            buffer.append(reading);
            let len = buffer.len();
            slot.last_ingest_ms
                .store(now.timestamp_millis(), Ordering::Release);

            if len >= self.config.min_samples {
                let context = self.context.context(machine_id);
                let features = self.extractor.extract(&buffer, &context);
                debug!("{}: recomputed {} features from {} readings", machine_id, features.len(), len);
                self.cache.set(machine_id, features, Utc::now());
            } else {
                debug!(
                    "{}: {} of {} samples, features deferred",
                    machine_id, len, self.config.min_samples
                );
            }

            // Published after the cache so a reader that sees the length
            // also sees the vector computed from it
            slot.buffer_len.store(len, Ordering::Release);
            break;
        }
    }

    /// Cached features plus data quality; never recomputes.
    pub fn get_features(&self, machine_id: &str) -> Result<FeatureSnapshot, FeatureStoreError> {
        let slot = self
            .slot(machine_id)
            .ok_or_else(|| FeatureStoreError::NotFound(machine_id.to_string()))?;

        // Length first: the cache entry is at least as new as it
        let buffer_size = slot.buffer_len.load(Ordering::Acquire);
        let entry = self.cache.get(machine_id);
        let retrieved_at = Utc::now();

        let last_update = entry
            .as_ref()
            .map(|e| e.last_update)
            .or_else(|| slot.last_ingest())
            .unwrap_or(retrieved_at);
        let staleness_seconds =
            ((retrieved_at - last_update).num_milliseconds() as f64 / 1000.0).max(0.0);

        Ok(FeatureSnapshot {
            machine_id: machine_id.to_string(),
            features: entry.map(|e| e.features.clone()),
            data_quality: DataQuality {
                buffer_size,
                sufficient: buffer_size >= self.config.min_samples,
                last_update,
                staleness_seconds,
            },
            retrieved_at,
        })
    }

    /// Statistics over raw readings from the last `window_hours`
    pub fn get_statistics(
        &self,
        machine_id: &str,
        window_hours: u32,
    ) -> Result<StatisticsReport, FeatureStoreError> {
        let slot = self
            .slot(machine_id)
            .ok_or_else(|| FeatureStoreError::NotFound(machine_id.to_string()))?;
        let buffer = sync::lock(&slot.buffer);

        if buffer.is_empty() {
            return Err(FeatureStoreError::NotFound(machine_id.to_string()));
        }

        Ok(statistics::summarize(
            machine_id,
            buffer.iter(),
            window_hours,
            Utc::now(),
        ))
    }

    /// Copies of the most recent readings, oldest first
    pub fn recent_readings(
        &self,
        machine_id: &str,
        limit: usize,
    ) -> Result<Vec<Reading>, FeatureStoreError> {
        let slot = self
            .slot(machine_id)
            .ok_or_else(|| FeatureStoreError::NotFound(machine_id.to_string()))?;
        let buffer = sync::lock(&slot.buffer);
        Ok(buffer.tail(limit))
    }

    /// Drop buffer and cached features for one machine, or all machines
    pub fn clear(&self, machine_id: Option<&str>) {
        // Held throughout so a racing ingestion cannot create a new slot
        // until the old one is retired
        let mut machines = sync::write(&self.machines);

        match machine_id {
            Some(id) => {
                if let Some(slot) = machines.remove(id) {
                    self.retire(id, &slot);
                    info!("Cleared machine {}", id);
                }
            }
            None => {
                let count = machines.len();
                for (id, slot) in machines.drain() {
                    self.retire(&id, &slot);
                }
                self.cache.clear();
                info!("Cleared {} machines", count);
            }
        }
    }

    /// Ids of every machine with a buffer, sorted
    pub fn machine_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = sync::read(&self.machines).keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of machines with a buffer
    pub fn machine_count(&self) -> usize {
        sync::read(&self.machines).len()
    }

    fn slot(&self, machine_id: &str) -> Option<Arc<MachineSlot>> {
        sync::read(&self.machines).get(machine_id).cloned()
    }

    fn slot_or_insert(&self, machine_id: &str) -> Arc<MachineSlot> {
        if let Some(slot) = self.slot(machine_id) {
            return slot;
        }

        let mut machines = sync::write(&self.machines);
        let slot = machines.entry(machine_id.to_string()).or_insert_with(|| {
            info!("Tracking new machine {}", machine_id);
            Arc::new(MachineSlot::new(self.config.buffer_capacity))
        });
        Arc::clone(slot)
    }

    fn retire(&self, machine_id: &str, slot: &MachineSlot) {
        let mut buffer = sync::lock(&slot.buffer);
        slot.retired.store(true, Ordering::Release);
        buffer.clear();
        slot.buffer_len.store(0, Ordering::Release);
        self.cache.remove(machine_id);
    }
}

impl Default for FeatureStore {
    fn default() -> Self {
        Self::new(FeatureStoreConfig::default())
    }
}
