//! The driver result record shared by every transport.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Size of the fixed binary encoding: four little-endian 8-byte fields.
pub const BINARY_FRAME_LEN: usize = 32;

/// One synthetic driver measurement.
///
/// The layout is `#[repr(C)]` so the identical struct crosses the
/// dynamic-library boundary by value, and the serde names are PascalCase so
/// the JSON wire format is
/// `{"Value":..,"Iteration":..,"CreateTimestamp":..,"ReadTimestamp":..}`.
///
/// Timestamps are nanoseconds since the Unix epoch. A record that has never
/// been read carries `read_timestamp == 0`, which consumers treat as
/// "not yet read".
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DriverResult {
    /// The synthetic measurement value.
    pub value: f64,
    /// Regeneration counter, incremented exactly once per update.
    pub iteration: i64,
    /// When the record was last regenerated.
    pub create_timestamp: i64,
    /// When the record was last read. Zero until the first read.
    pub read_timestamp: i64,
}

impl DriverResult {
    /// A zeroed record, as held by a producer before its first regeneration.
    pub fn empty() -> Self {
        Self {
            value: 0.0,
            iteration: 0,
            create_timestamp: 0,
            read_timestamp: 0,
        }
    }

    /// Whether this snapshot has ever been read.
    pub fn is_read(&self) -> bool {
        self.read_timestamp > 0
    }
}

impl Default for DriverResult {
    fn default() -> Self {
        Self::empty()
    }
}

/// Current time as nanoseconds since the Unix epoch.
///
/// Saturates rather than panicking once the i64 range runs out (year 2262).
pub fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}
