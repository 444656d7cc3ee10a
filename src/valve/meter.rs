//! Throughput meter.

use serde::Serialize;
use std::time::Instant;

/// Running totals for one open/close cycle of a valve.
#[derive(Debug, Clone)]
pub struct Meter {
    /// Chunks yielded since the last reset
    iter_count: u64,
    /// Bytes yielded since the last reset
    size_accumulator: u64,
    /// Seconds elapsed between the last reset and the latest chunk
    time_accumulator: f64,
    /// When the meter was last reset
    mono_clock_origin: Instant,
}

/// A point-in-time copy of a meter's totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeterSnapshot {
    pub iter_count: u64,
    pub size_accumulator: u64,
    pub time_accumulator: f64,
    /// Observed bytes per second, if any time has elapsed
    pub rate: Option<f64>,
}

impl Meter {
    /// Create a zeroed meter whose clock starts now.
    pub fn new() -> Self {
        Self {
            iter_count: 0,
            size_accumulator: 0,
            time_accumulator: 0.0,
            mono_clock_origin: Instant::now(),
        }
    }

    /// Zero every total and restart the clock.
    pub fn zero(&mut self) {
        *self = Self::new();
    }

    /// Account for one chunk of `len` bytes and return the updated rate.
    ///
    /// The time total is the wall time from the last reset to this chunk, so
    /// the rate is the average throughput since the valve was opened.
    pub fn record(&mut self, len: usize) -> Option<f64> {
        self.record_at(len, Instant::now())
    }

    fn record_at(&mut self, len: usize, now: Instant) -> Option<f64> {
        self.iter_count += 1;
        self.size_accumulator += len as u64;
        self.time_accumulator = now
            .saturating_duration_since(self.mono_clock_origin)
            .as_secs_f64();
        self.rate()
    }

    /// Bytes per second, or `None` while no time has accumulated.
    pub fn rate(&self) -> Option<f64> {
        if self.time_accumulator > 0.0 {
            Some(self.size_accumulator as f64 / self.time_accumulator)
        } else {
            None
        }
    }

    pub fn iter_count(&self) -> u64 {
        self.iter_count
    }

    pub fn size_accumulator(&self) -> u64 {
        self.size_accumulator
    }

    pub fn time_accumulator(&self) -> f64 {
        self.time_accumulator
    }

    pub fn snapshot(&self) -> MeterSnapshot {
        MeterSnapshot {
            iter_count: self.iter_count,
            size_accumulator: self.size_accumulator,
            time_accumulator: self.time_accumulator,
            rate: self.rate(),
        }
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}
