//! Sensor Reading Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Sensor channels recognized for feature derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Vibration magnitude (mm/s)
    Vibration,
    /// Temperature (°C)
    Temperature,
    /// Power draw (kW)
    Power,
}

impl Channel {
    /// All recognized channels
    pub const ALL: [Channel; 3] = [Channel::Vibration, Channel::Temperature, Channel::Power];

    /// Names accepted for this channel, in precedence order
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Channel::Vibration => &["vibration", "vibration_rms"],
            Channel::Temperature => &["temperature", "temp"],
            Channel::Power => &["power", "power_consumption"],
        }
    }

    /// Name used when reporting raw statistics for this channel
    pub fn canonical_name(self) -> &'static str {
        match self {
            Channel::Vibration => "vibration_rms",
            Channel::Temperature => "temperature",
            Channel::Power => "power_consumption",
        }
    }

    /// Classify a raw channel name
    pub fn classify(name: &str) -> Option<Channel> {
        Self::ALL
            .into_iter()
            .find(|channel| channel.aliases().contains(&name))
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Reading as delivered by a producer, before classification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawReading {
    /// Producer timestamp; the store assigns one when absent
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Channel name to magnitude
    #[serde(default)]
    pub values: HashMap<String, f64>,
}

impl RawReading {
    /// Create an empty reading without a timestamp
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the producer timestamp
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Add a channel value
    pub fn with_value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }
}

/// Classified, immutable sensor reading for one machine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    machine_id: String,
    timestamp: DateTime<Utc>,
    /// Recognized channel values with the alias that supplied them, indexed by `Channel`
    known: [Option<(&'static str, f64)>; 3],
    /// Unrecognized channels, kept for raw statistics only
    extra: BTreeMap<String, f64>,
}

impl Reading {
    /// Classify a raw reading, stamping it with `now` if it carries no timestamp.
    ///
    /// Non-finite values are dropped. When several aliases of one channel are
    /// present the first in precedence order is used and the others are kept
    /// in the pass-through bag under their own names.
    pub fn from_raw(machine_id: impl Into<String>, raw: RawReading, now: DateTime<Utc>) -> Self {
        let machine_id = machine_id.into();
        let mut values = raw.values;

        values.retain(|name, value| {
            if value.is_finite() {
                true
            } else {
                warn!("Dropping non-finite value for {}/{}: {}", machine_id, name, value);
                false
            }
        });

        let mut known = [None; 3];
        for channel in Channel::ALL {
            for alias in channel.aliases() {
                if known[channel.index()].is_some() {
                    break;
                }
                if let Some(value) = values.remove(*alias) {
                    known[channel.index()] = Some((*alias, value));
                }
            }
        }

        Self {
            machine_id,
            timestamp: raw.timestamp.unwrap_or(now),
            known,
            extra: values.into_iter().collect(),
        }
    }

    /// Machine this reading belongs to
    pub fn machine_id(&self) -> &str {
        &self.machine_id
    }

    /// Reading timestamp
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Value of a recognized channel, if present
    pub fn value(&self, channel: Channel) -> Option<f64> {
        self.known[channel.index()].map(|(_, value)| value)
    }

    /// Raw name that supplied a recognized channel
    pub fn source_alias(&self, channel: Channel) -> Option<&'static str> {
        self.known[channel.index()].map(|(alias, _)| alias)
    }

    /// Unrecognized channels
    pub fn extra(&self) -> &BTreeMap<String, f64> {
        &self.extra
    }

    /// Every numeric channel in the reading, one entry per distinct name.
    ///
    /// Known channels are reported under their canonical name unless a
    /// losing alias in the pass-through bag already carries that name; the
    /// known value is then reported under the alias that supplied it.
    pub fn numeric_channels(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        Channel::ALL
            .into_iter()
            .filter_map(|channel| {
                let (alias, value) = self.known[channel.index()]?;
                let canonical = channel.canonical_name();
                let name = if self.extra.contains_key(canonical) {
                    alias
                } else {
                    canonical
                };
                Some((name, value))
            })
            .chain(self.extra.iter().map(|(name, &v)| (name.as_str(), v)))
    }
}
