//! Raw Channel Statistics

use chrono::{DateTime, Duration, Utc};
use feature_engine::Summary;
use ring_buffer::Reading;
use serde::Serialize;
use std::collections::BTreeMap;

/// Min/max/mean/std/current for one raw channel
pub type ChannelStatistics = Summary;

/// Statistics over the raw readings of one machine within a look-back window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsReport {
    pub machine_id: String,
    pub window_hours: u32,
    /// Readings that fell inside the window
    pub sample_count: usize,
    /// Every numeric channel seen in the window, by name
    pub channels: BTreeMap<String, ChannelStatistics>,
    pub generated_at: DateTime<Utc>,
}

/// Summarize readings with `timestamp >= now - window_hours`.
///
/// A window reaching past the representable time range covers the whole
/// buffer. Channels missing from some readings are summarized over the readings
/// that carry them; `current` is the last such value in buffer order.
pub(crate) fn summarize<'a>(
    machine_id: &str,
    readings: impl Iterator<Item = &'a Reading>,
    window_hours: u32,
    now: DateTime<Utc>,
) -> StatisticsReport {
    let cutoff = Duration::try_hours(i64::from(window_hours))
        .and_then(|window| now.checked_sub_signed(window));

    let mut sample_count = 0;
    let mut series: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for reading in readings.filter(|r| cutoff.map_or(true, |c| r.timestamp() >= c)) {
        sample_count += 1;
        for (name, value) in reading.numeric_channels() {
            series.entry(name).or_default().push(value);
        }
    }

    let channels = series
        .into_iter()
        .map(|(name, values)| (name.to_string(), Summary::compute(&values)))
        .collect();

    StatisticsReport {
        machine_id: machine_id.to_string(),
        window_hours,
        sample_count,
        channels,
        generated_at: now,
    }
}
