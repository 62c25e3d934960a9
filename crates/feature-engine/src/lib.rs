//! Feature Engineering Engine
//!
//! Provides pure windowed aggregations and assembles the feature vector
//! consumed by downstream inference and risk scoring.

pub mod aggregator;
mod features;
mod windows;

pub use aggregator::{AggregationKind, Summary};
pub use features::{names, FeatureExtractor, FeatureVector, MachineContext};
pub use windows::{max_window_length, WindowSpec, WINDOW_SPECS};
