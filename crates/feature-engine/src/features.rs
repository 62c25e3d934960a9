//! Feature Vector Assembly

use crate::windows::{max_window_length, WindowSpec, WINDOW_SPECS};
use chrono::{Datelike, Timelike};
use ring_buffer::{Reading, RingBuffer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Feature names produced by the extractor
pub mod names {
    pub const VIBRATION_RMS: &str = "vibration_rms";
    pub const VIBRATION_PEAK: &str = "vibration_peak";
    pub const VIBRATION_KURTOSIS: &str = "vibration_kurtosis";
    pub const TEMPERATURE: &str = "temperature";
    pub const TEMP_RATE_OF_CHANGE: &str = "temp_rate_of_change";
    pub const POWER_CONSUMPTION: &str = "power_consumption";
    pub const POWER_STD: &str = "power_std";
    /// Percent deviation of mean power from the baseline
    pub const POWER_DEVIATION: &str = "power_deviation";
    pub const TIME_SINCE_MAINTENANCE: &str = "time_since_maintenance";
    pub const CUMULATIVE_CYCLES: &str = "cumulative_cycles";
    pub const HOUR_OF_DAY: &str = "hour_of_day";
    /// Monday = 0
    pub const DAY_OF_WEEK: &str = "day_of_week";
}

/// Default baseline power draw (kW) for `power_deviation`
pub const DEFAULT_BASELINE_POWER: f64 = 12.0;

/// Feature vector for ML inference, keyed by feature name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector {
    values: BTreeMap<String, f64>,
}

impl FeatureVector {
    /// Get a feature by name
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Check whether a feature is present
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Set a feature value
    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// Number of features
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no features are present
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over features in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.values.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Consume into the underlying map
    pub fn into_map(self) -> BTreeMap<String, f64> {
        self.values
    }
}

/// Operational context for one machine, supplied by external systems
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineContext {
    /// Hours since last maintenance
    pub hours_since_maintenance: f64,
    /// Cumulative machine cycles
    pub cumulative_cycles: u64,
}

/// Feature extractor that recomputes the full vector from buffer tails
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    /// Window registry
    windows: &'static [WindowSpec],
    /// Longest window length, precomputed
    span: usize,
    /// Baseline power draw for deviation
    baseline_power: f64,
}

impl FeatureExtractor {
    /// Create a new extractor over the default window registry
    pub fn new(baseline_power: f64) -> Self {
        Self::with_windows(WINDOW_SPECS, baseline_power)
    }

    /// Create an extractor over a custom window registry
    pub fn with_windows(windows: &'static [WindowSpec], baseline_power: f64) -> Self {
        Self {
            windows,
            span: max_window_length(windows),
            baseline_power,
        }
    }

    /// Window registry in use
    pub fn windows(&self) -> &'static [WindowSpec] {
        self.windows
    }

    /// Extract features from the ring buffer.
    ///
    /// Only the tail covered by the longest window is read, so the cost is
    /// bounded by window size rather than buffer length.
    pub fn extract(&self, buffer: &RingBuffer, context: &MachineContext) -> FeatureVector {
        let tail: Vec<&Reading> = buffer.tail_iter(self.span).collect();
        self.compute(&tail, context)
    }

    /// Extract features from a slice of readings directly
    pub fn extract_from_readings(&self, readings: &[Reading], context: &MachineContext) -> FeatureVector {
        let start = readings.len().saturating_sub(self.span);
        let tail: Vec<&Reading> = readings[start..].iter().collect();
        self.compute(&tail, context)
    }

    fn compute(&self, readings: &[&Reading], context: &MachineContext) -> FeatureVector {
        debug!(
            "Extracting features: {} readings over {} windows",
            readings.len(),
            self.windows.len()
        );

        let mut features = FeatureVector::default();

        for window in self.windows {
            let start = readings.len().saturating_sub(window.length);
            let values: Vec<f64> = readings[start..]
                .iter()
                .filter_map(|r| r.value(window.channel))
                .collect();

            // A channel absent from the whole window yields no feature
            if values.is_empty() {
                continue;
            }
            features.insert(window.name, window.kind.apply(&values));
        }

        if let Some(power) = features.get(names::POWER_CONSUMPTION) {
            let deviation = (power - self.baseline_power) / self.baseline_power * 100.0;
            features.insert(names::POWER_DEVIATION, deviation);
        }

        features.insert(names::TIME_SINCE_MAINTENANCE, context.hours_since_maintenance);
        features.insert(names::CUMULATIVE_CYCLES, context.cumulative_cycles as f64);

        if let Some(latest) = readings.last() {
            let ts = latest.timestamp();
            features.insert(names::HOUR_OF_DAY, ts.hour() as f64);
            features.insert(names::DAY_OF_WEEK, ts.weekday().num_days_from_monday() as f64);
        }

        features
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_BASELINE_POWER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::{excess_kurtosis, rms};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use ring_buffer::RawReading;

    fn base() -> DateTime<Utc> {
        // Monday
        Utc.with_ymd_and_hms(2024, 7, 15, 14, 0, 0).unwrap()
    }

    fn push(buffer: &mut RingBuffer, i: usize, raw: RawReading) {
        let raw = raw.at(base() + Duration::seconds(i as i64));
        buffer.append(Reading::from_raw("CNC-1", raw, base()));
    }

    fn full_reading(i: usize) -> RawReading {
        RawReading::new()
            .with_value("vibration_rms", 20.0 + (i % 5) as f64)
            .with_value("temperature", 40.0 + i as f64 * 0.1)
            .with_value("power_consumption", 13.2)
    }

    #[test]
    fn test_feature_extraction() {
        let extractor = FeatureExtractor::default();
        let mut buffer = RingBuffer::new(1000);
        for i in 0..100 {
            push(&mut buffer, i, full_reading(i));
        }

        let context = MachineContext {
            hours_since_maintenance: 250.0,
            cumulative_cycles: 91_000,
        };
        let features = extractor.extract(&buffer, &context);

        for name in [
            names::VIBRATION_RMS,
            names::VIBRATION_PEAK,
            names::VIBRATION_KURTOSIS,
            names::TEMPERATURE,
            names::TEMP_RATE_OF_CHANGE,
            names::POWER_CONSUMPTION,
            names::POWER_STD,
            names::POWER_DEVIATION,
            names::TIME_SINCE_MAINTENANCE,
            names::CUMULATIVE_CYCLES,
            names::HOUR_OF_DAY,
            names::DAY_OF_WEEK,
        ] {
            assert!(features.contains(name), "missing {}", name);
        }

        assert_eq!(features.get(names::VIBRATION_PEAK), Some(24.0));
        assert!((features.get(names::TEMP_RATE_OF_CHANGE).unwrap() - 0.1).abs() < 1e-9);
        assert!((features.get(names::POWER_DEVIATION).unwrap() - 10.0).abs() < 1e-9);
        assert_eq!(features.get(names::CUMULATIVE_CYCLES), Some(91_000.0));
        assert_eq!(features.get(names::HOUR_OF_DAY), Some(14.0));
        assert_eq!(features.get(names::DAY_OF_WEEK), Some(0.0));
    }

    #[test]
    fn test_windows_use_fixed_tail_lengths() {
        let extractor = FeatureExtractor::default();
        let mut buffer = RingBuffer::new(2000);
        // 100 loud samples followed by 60 quiet ones
        for i in 0..160 {
            let level = if i < 100 { 50.0 } else { 2.0 };
            push(&mut buffer, i, RawReading::new().with_value("vibration", level));
        }

        let features = extractor.extract(&buffer, &MachineContext::default());

        // RMS and peak only see the last 60 samples
        assert_eq!(features.get(names::VIBRATION_RMS), Some(2.0));
        assert_eq!(features.get(names::VIBRATION_PEAK), Some(2.0));

        // Kurtosis sees all 160
        let all: Vec<f64> = buffer
            .iter()
            .filter_map(|r| r.value(ring_buffer::Channel::Vibration))
            .collect();
        assert_eq!(features.get(names::VIBRATION_KURTOSIS), Some(excess_kurtosis(&all)));
    }

    #[test]
    fn test_missing_channels_omitted() {
        let extractor = FeatureExtractor::default();
        let mut buffer = RingBuffer::new(100);
        for i in 0..20 {
            push(&mut buffer, i, RawReading::new().with_value("spindle_speed", 1200.0));
        }

        let features = extractor.extract(&buffer, &MachineContext::default());

        assert!(!features.contains(names::VIBRATION_RMS));
        assert!(!features.contains(names::TEMPERATURE));
        assert!(!features.contains(names::POWER_DEVIATION));
        assert!(features.contains(names::TIME_SINCE_MAINTENANCE));
        assert!(features.contains(names::HOUR_OF_DAY));
    }

    #[test]
    fn test_sparse_channel_in_window() {
        let extractor = FeatureExtractor::default();
        let mut buffer = RingBuffer::new(100);
        for i in 0..20 {
            let raw = if i % 2 == 0 {
                RawReading::new().with_value("vibration", 3.0)
            } else {
                RawReading::new().with_value("vibration", 4.0).with_value("temp", 40.0)
            };
            push(&mut buffer, i, raw);
        }

        let features = extractor.extract(&buffer, &MachineContext::default());
        assert_eq!(features.get(names::TEMPERATURE), Some(40.0));
        assert_eq!(features.get(names::VIBRATION_RMS), Some(rms(&[3.0, 4.0].repeat(10))));
    }

    #[test]
    fn test_extract_from_readings_matches_buffer() {
        let extractor = FeatureExtractor::default();
        let mut buffer = RingBuffer::new(1000);
        for i in 0..50 {
            push(&mut buffer, i, full_reading(i));
        }
        let readings = buffer.tail(buffer.len());
        let context = MachineContext::default();

        assert_eq!(
            extractor.extract(&buffer, &context),
            extractor.extract_from_readings(&readings, &context)
        );
    }

    #[test]
    fn test_serializes_as_flat_map() {
        let mut features = FeatureVector::default();
        features.insert(names::TEMPERATURE, 44.5);
        assert_eq!(serde_json::to_string(&features).unwrap(), r#"{"temperature":44.5}"#);
    }
}
