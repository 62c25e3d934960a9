//! Windowed Aggregation Functions
//!
//! Every function here is total: empty or short inputs return a documented
//! sentinel instead of dividing by zero. Standard deviation is the
//! population form (divide by `n`) throughout.

use serde::{Deserialize, Serialize};

/// Kurtosis of a normal distribution in the non-excess convention
pub const NORMAL_KURTOSIS: f64 = 3.0;

/// Aggregation applied over a window of samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    Mean,
    Std,
    Max,
    Min,
    Rms,
    Kurtosis,
    /// Least-squares slope in units per sample
    Rate,
}

impl AggregationKind {
    /// Apply this aggregation to a window of values
    pub fn apply(self, values: &[f64]) -> f64 {
        match self {
            AggregationKind::Mean => mean(values),
            AggregationKind::Std => std(values),
            AggregationKind::Max => max(values),
            AggregationKind::Min => min(values),
            AggregationKind::Rms => rms(values),
            AggregationKind::Kurtosis => excess_kurtosis(values),
            AggregationKind::Rate => linear_slope(values),
        }
    }
}

/// Arithmetic mean; 0.0 when empty
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation; 0.0 when empty
pub fn std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mu = mean(values);
    let variance = values.iter().map(|v| (v - mu) * (v - mu)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Largest value; 0.0 when empty
pub fn max(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().cloned().fold(f64::MIN, f64::max)
}

/// Smallest value; 0.0 when empty
pub fn min(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().cloned().fold(f64::MAX, f64::min)
}

/// Root mean square: sqrt(mean(v²)); 0.0 when empty
pub fn rms(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    (values.iter().map(|v| v * v).sum::<f64>() / values.len() as f64).sqrt()
}

/// Kurtosis reported so that a normal signal reads ≈3.0.
///
/// Uses the population fourth standardized moment `m4 / m2²`: the excess
/// (`- 3`) is computed and the normal baseline added back. Fewer than 4
/// samples, or zero variance, return exactly [`NORMAL_KURTOSIS`].
pub fn excess_kurtosis(values: &[f64]) -> f64 {
    if values.len() < 4 {
        return NORMAL_KURTOSIS;
    }

    let n = values.len() as f64;
    let mu = mean(values);
    let mut m2 = 0.0;
    let mut m4 = 0.0;
    for &v in values {
        let d = v - mu;
        let d2 = d * d;
        m2 += d2;
        m4 += d2 * d2;
    }
    m2 /= n;
    m4 /= n;

    if m2 <= 0.0 {
        return NORMAL_KURTOSIS;
    }

    let excess = m4 / (m2 * m2) - NORMAL_KURTOSIS;
    let kurtosis = excess + NORMAL_KURTOSIS;
    if kurtosis.is_finite() {
        kurtosis
    } else {
        NORMAL_KURTOSIS
    }
}

/// Ordinary least-squares slope of values against their 0-based index.
///
/// Returns 0.0 for fewer than 2 samples. The result is in units per
/// sample; callers scale by the sampling interval for per-minute rates.
pub fn linear_slope(values: &[f64]) -> f64 {
    let len = values.len();
    if len < 2 {
        return 0.0;
    }

    let n = len as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = mean(values);

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        numerator += dx * (y - y_mean);
        denominator += dx * dx;
    }

    numerator / denominator
}

/// Summary statistics over one channel
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    /// Last value in sequence order
    pub current: f64,
}

impl Summary {
    /// Compute summary statistics; all zeros when empty
    pub fn compute(values: &[f64]) -> Self {
        let Some(&current) = values.last() else {
            return Self::default();
        };

        Self {
            min: min(values),
            max: max(values),
            mean: mean(values),
            std: std(values),
            current,
        }
    }
}
