//! Bounded Ring Buffer Implementation

use crate::Reading;
use std::collections::VecDeque;
use tracing::debug;

/// Default buffer capacity (10,000 readings per machine)
pub const DEFAULT_CAPACITY: usize = 10_000;

/// Upper bound on storage reserved up front; the rest grows on demand
const INITIAL_RESERVE: usize = 1024;

/// Bounded, insertion-ordered buffer of readings for one machine.
///
/// When an append pushes the length past capacity, the oldest half is
/// dropped in a single compaction rather than one reading at a time.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    /// Readings, oldest first
    storage: VecDeque<Reading>,
    /// Maximum number of readings retained
    capacity: usize,
    /// Total readings appended (for statistics)
    total_written: u64,
}

impl RingBuffer {
    /// Create a new ring buffer with given capacity (at least 2)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            storage: VecDeque::with_capacity(capacity.min(INITIAL_RESERVE)),
            capacity,
            total_written: 0,
        }
    }

    /// Create a buffer with default capacity (10,000 readings)
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }

    /// Append a reading, returning how many old readings were evicted
    pub fn append(&mut self, reading: Reading) -> usize {
        self.storage.push_back(reading);
        self.total_written += 1;

        if self.storage.len() <= self.capacity {
            return 0;
        }

        let evicted = self.capacity / 2;
        self.storage.drain(..evicted);
        debug!(
            "Evicted {} readings, {} remain (capacity {})",
            evicted,
            self.storage.len(),
            self.capacity
        );
        evicted
    }

    /// Copy of the last `n` readings in chronological order (all of them if fewer exist)
    pub fn tail(&self, n: usize) -> Vec<Reading> {
        self.tail_iter(n).cloned().collect()
    }

    /// Borrowing iterator over the last `n` readings, oldest first
    pub fn tail_iter(&self, n: usize) -> impl Iterator<Item = &Reading> + '_ {
        let start = self.storage.len().saturating_sub(n);
        self.storage.range(start..)
    }

    /// Iterate over all readings, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Reading> + '_ {
        self.storage.iter()
    }

    /// Most recent reading
    pub fn latest(&self) -> Option<&Reading> {
        self.storage.back()
    }

    /// Get the number of readings currently in the buffer
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Get the buffer capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get fill ratio (0.0 to 1.0)
    pub fn fill_ratio(&self) -> f64 {
        self.storage.len() as f64 / self.capacity as f64
    }

    /// Get total readings appended (for statistics)
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.storage.clear();
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
