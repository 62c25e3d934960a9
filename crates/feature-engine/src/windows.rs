//! Feature Window Registry
//!
//! Windows are fixed sample counts taken from the tail of a machine's
//! buffer, not wall-clock durations.

use crate::aggregator::AggregationKind;
use ring_buffer::Channel;

/// Named aggregation over the most recent samples of one channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowSpec {
    /// Feature name written into the vector
    pub name: &'static str,
    /// Source channel
    pub channel: Channel,
    /// Number of most recent readings considered
    pub length: usize,
    /// Aggregation applied to the channel values in the window
    pub kind: AggregationKind,
}

/// Windows computed on every qualifying ingestion
pub const WINDOW_SPECS: &[WindowSpec] = &[
    WindowSpec {
        name: "vibration_rms",
        channel: Channel::Vibration,
        length: 60,
        kind: AggregationKind::Rms,
    },
    WindowSpec {
        name: "vibration_peak",
        channel: Channel::Vibration,
        length: 60,
        kind: AggregationKind::Max,
    },
    WindowSpec {
        name: "vibration_kurtosis",
        channel: Channel::Vibration,
        length: 720,
        kind: AggregationKind::Kurtosis,
    },
    WindowSpec {
        name: "temperature",
        channel: Channel::Temperature,
        length: 180,
        kind: AggregationKind::Mean,
    },
    WindowSpec {
        name: "temp_rate_of_change",
        channel: Channel::Temperature,
        length: 180,
        kind: AggregationKind::Rate,
    },
    WindowSpec {
        name: "power_consumption",
        channel: Channel::Power,
        length: 720,
        kind: AggregationKind::Mean,
    },
    WindowSpec {
        name: "power_std",
        channel: Channel::Power,
        length: 720,
        kind: AggregationKind::Std,
    },
];

/// Longest window in a registry, i.e. how much buffer tail one pass reads
pub fn max_window_length(windows: &[WindowSpec]) -> usize {
    windows.iter().map(|w| w.length).max().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_unique() {
        let names: HashSet<_> = WINDOW_SPECS.iter().map(|w| w.name).collect();
        assert_eq!(names.len(), WINDOW_SPECS.len());
    }

    #[test]
    fn test_max_window_length() {
        assert_eq!(max_window_length(WINDOW_SPECS), 720);
        assert_eq!(max_window_length(&[]), 0);
    }
}
