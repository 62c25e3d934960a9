//! Feature Cache
//!
//! Entries are immutable once stored. Recomputation builds a new entry and
//! swaps the `Arc`, so a reader holds either the old or the new vector,
//! never a mix.

use crate::sync;
use chrono::{DateTime, Utc};
use feature_engine::FeatureVector;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Most recently computed features for one machine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureCacheEntry {
    pub machine_id: String,
    pub features: FeatureVector,
    /// When the vector was computed
    pub last_update: DateTime<Utc>,
}

/// Machine id to latest feature vector
#[derive(Debug, Default)]
pub struct FeatureCache {
    entries: RwLock<HashMap<String, Arc<FeatureCacheEntry>>>,
}

impl FeatureCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entry for a machine
    pub fn set(
        &self,
        machine_id: &str,
        features: FeatureVector,
        last_update: DateTime<Utc>,
    ) -> Arc<FeatureCacheEntry> {
        let entry = Arc::new(FeatureCacheEntry {
            machine_id: machine_id.to_string(),
            features,
            last_update,
        });
        sync::write(&self.entries).insert(machine_id.to_string(), Arc::clone(&entry));
        entry
    }

    /// Get the entry for a machine; `None` means nothing computed yet
    pub fn get(&self, machine_id: &str) -> Option<Arc<FeatureCacheEntry>> {
        sync::read(&self.entries).get(machine_id).cloned()
    }

    /// Remove the entry for a machine
    pub fn remove(&self, machine_id: &str) -> Option<Arc<FeatureCacheEntry>> {
        sync::write(&self.entries).remove(machine_id)
    }

    /// Remove every entry
    pub fn clear(&self) {
        sync::write(&self.entries).clear();
    }

    /// Number of cached machines
    pub fn len(&self) -> usize {
        sync::read(&self.entries).len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
