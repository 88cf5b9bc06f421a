//! Per-read latency accumulation for one harness session.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// Asking for an average with zero samples.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("no latency samples recorded")]
pub struct EmptySampleSetError;

/// Append-only collection of per-read round-trip durations.
///
/// All samples of a session are retained; there is no eviction or
/// windowing.
#[derive(Debug, Default)]
pub struct LatencyTracker {
    samples: Vec<Duration>,
}

impl LatencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample.
    pub fn record(&mut self, sample: Duration) {
        self.samples.push(sample);
    }

    /// Number of recorded samples.
    pub fn count(&self) -> usize {
        self.samples.len()
    }

    /// Mean of all samples, integer nanosecond division.
    pub fn average(&self) -> Result<Duration, EmptySampleSetError> {
        if self.samples.is_empty() {
            return Err(EmptySampleSetError);
        }
        let total: u128 = self.samples.iter().map(Duration::as_nanos).sum();
        let mean = total / self.samples.len() as u128;
        Ok(Duration::from_nanos(mean.min(u64::MAX as u128) as u64))
    }

    /// Smallest recorded sample.
    pub fn min(&self) -> Option<Duration> {
        self.samples.iter().min().copied()
    }

    /// Largest recorded sample.
    pub fn max(&self) -> Option<Duration> {
        self.samples.iter().max().copied()
    }

    /// Session-end summary: count plus average/min/max.
    pub fn summary(&self) -> LatencySummary {
        LatencySummary {
            count: self.count(),
            average: self.average().ok(),
            min: self.min(),
            max: self.max(),
        }
    }
}

/// Count and aggregate latencies for one completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatencySummary {
    pub count: usize,
    /// `None` when no samples were recorded.
    pub average: Option<Duration>,
    pub min: Option<Duration>,
    pub max: Option<Duration>,
}

impl fmt::Display for LatencySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.average, self.min, self.max) {
            (Some(avg), Some(min), Some(max)) => write!(
                f,
                "reads={} avg={:?} min={:?} max={:?}",
                self.count, avg, min, max
            ),
            _ => write!(f, "reads={} (no latency samples)", self.count),
        }
    }
}
