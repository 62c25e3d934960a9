//! Per-Machine Reading Buffer
//!
//! Provides the bounded, insertion-ordered buffer that holds raw sensor
//! readings for one machine, and the reading types stored in it.

mod buffer;
mod reading;

pub use buffer::{RingBuffer, DEFAULT_CAPACITY};
pub use reading::{Channel, RawReading, Reading};
