//! Throughput summaries for a metered pass over a source.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::valve::MeterSnapshot;

/// Significant digits beyond which an `f64` carries no extra information.
const F64_SIGNIFICANT_DIGITS: u32 = 17;

/// Summary of one pass over a file valve.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub path: PathBuf,
    pub chunk_size: usize,
    /// Configured target throughput
    pub throughput: Option<f64>,
    pub chunks: u64,
    pub bytes: u64,
    pub elapsed_secs: f64,
    /// Observed bytes per second
    pub rate: Option<f64>,
}

impl Report {
    /// Build a report, rounding the observed rate to `decimal_prec`
    /// significant digits.
    pub fn new(
        path: &Path,
        chunk_size: usize,
        throughput: Option<f64>,
        meter: MeterSnapshot,
        decimal_prec: u32,
    ) -> Self {
        Self {
            path: path.to_path_buf(),
            chunk_size,
            throughput,
            chunks: meter.iter_count,
            bytes: meter.size_accumulator,
            elapsed_secs: meter.time_accumulator,
            rate: meter.rate.map(|r| round_significant(r, decimal_prec)),
        }
    }

    /// Render as a JSON document.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "path:       {}", self.path.display())?;
        writeln!(f, "chunk size: {}", self.chunk_size)?;
        if let Some(throughput) = self.throughput {
            writeln!(f, "target:     {} bytes/s", throughput)?;
        }
        writeln!(f, "chunks:     {}", self.chunks)?;
        writeln!(f, "bytes:      {}", self.bytes)?;
        writeln!(f, "elapsed:    {:.6} s", self.elapsed_secs)?;
        match self.rate {
            Some(rate) => write!(f, "rate:       {} bytes/s", rate),
            None => write!(f, "rate:       n/a"),
        }
    }
}

/// Round `value` to `digits` significant digits.
///
/// Zero digits, non-finite values and precisions beyond what an `f64` holds
/// leave the value unchanged.
pub fn round_significant(value: f64, digits: u32) -> f64 {
    if digits == 0 || digits >= F64_SIGNIFICANT_DIGITS || value == 0.0 || !value.is_finite() {
        return value;
    }

    let magnitude = value.abs().log10().floor() as i32;
    let exponent = digits as i32 - 1 - magnitude;
    let scale = 10f64.powi(exponent.abs());
    if !scale.is_finite() {
        return value;
    }

    // Scale by exact powers of ten in both directions.
    if exponent >= 0 {
        (value * scale).round() / scale
    } else {
        (value / scale).round() * scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(rate: Option<f64>) -> MeterSnapshot {
        MeterSnapshot {
            iter_count: 3,
            size_accumulator: 3000,
            time_accumulator: 0.5,
            rate,
        }
    }

    #[test]
    fn test_round_significant() {
        assert_eq!(round_significant(123456.789, 3), 123000.0);
        assert_eq!(round_significant(0.00123456, 2), 0.0012);
        assert_eq!(round_significant(-98.76, 2), -99.0);
        assert_eq!(round_significant(1.5, 28), 1.5);
        assert_eq!(round_significant(0.0, 4), 0.0);
    }

    #[test]
    fn test_report_rounds_rate() {
        let report = Report::new(Path::new("data.bin"), 1024, None, snapshot(Some(6000.4)), 2);
        assert_eq!(report.rate, Some(6000.0));
        assert_eq!(report.chunks, 3);
        assert_eq!(report.bytes, 3000);
    }

    #[test]
    fn test_report_display() {
        let report = Report::new(Path::new("data.bin"), 1024, Some(512.0), snapshot(None), 28);
        let text = report.to_string();

        assert!(text.contains("data.bin"));
        assert!(text.contains("target:     512 bytes/s"));
        assert!(text.contains("rate:       n/a"));
    }

    #[test]
    fn test_report_json() {
        let report = Report::new(Path::new("data.bin"), 1024, None, snapshot(Some(6000.0)), 28);
        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["chunks"], 3);
        assert_eq!(value["bytes"], 3000);
        assert_eq!(value["rate"], 6000.0);
        assert!(value["throughput"].is_null());
    }
}
