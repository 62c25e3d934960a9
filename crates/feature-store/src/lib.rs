//! Feature Store
//!
//! Owns one bounded reading buffer and one cached feature vector per
//! machine. Ingestion for a machine is serialized by that machine's lock;
//! reads of cached features never take it.

mod cache;
mod context;
mod error;
mod settings;
mod statistics;
mod store;
mod sync;

pub use cache::{FeatureCache, FeatureCacheEntry};
pub use context::{NoContext, OperationalContext, StaticContext};
pub use error::FeatureStoreError;
pub use settings::FeatureStoreConfig;
pub use statistics::{ChannelStatistics, StatisticsReport};
pub use store::{DataQuality, FeatureSnapshot, FeatureStore};

pub use feature_engine::{FeatureVector, MachineContext};
pub use ring_buffer::{RawReading, Reading};
