//! Harness configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::codec::WireFormat;

/// Which transport/encoding combination a session exercises.
///
/// `json`/`bin`/`str` select the pipe process transport with the matching
/// wire format; `dynamic` selects the shared-library transport; `embedded`
/// keeps producer and consumer in one address space for baseline latency
/// measurements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Json,
    Bin,
    Str,
    Dynamic,
    Embedded,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RunMode::Json => "json",
            RunMode::Bin => "bin",
            RunMode::Str => "str",
            RunMode::Dynamic => "dynamic",
            RunMode::Embedded => "embedded",
        };
        f.write_str(name)
    }
}

impl RunMode {
    /// The wire format carried over the pipe, if this mode uses one.
    pub fn wire_format(&self) -> Option<WireFormat> {
        match self {
            RunMode::Json => Some(WireFormat::Json),
            RunMode::Bin => Some(WireFormat::Binary),
            RunMode::Str => Some(WireFormat::Text),
            RunMode::Dynamic | RunMode::Embedded => None,
        }
    }
}

/// Session parameters for one harness run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarnessConfig {
    /// Transport/encoding to exercise.
    #[serde(default)]
    pub mode: RunMode,
    /// Producer regeneration interval in milliseconds.
    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
    /// Delay between consecutive reads in milliseconds.
    #[serde(default = "default_read_delay_ms")]
    pub read_delay_ms: u64,
    /// The session stops once an observed iteration reaches this value.
    #[serde(default = "default_target_iteration")]
    pub target_iteration: i64,
    /// Driver binary spawned by the pipe transport.
    #[serde(default = "default_driver_bin")]
    pub driver_bin: PathBuf,
    /// Shared library loaded by the dynamic transport.
    #[serde(default = "default_driver_lib")]
    pub driver_lib: PathBuf,
}

fn default_update_interval_ms() -> u64 {
    50
}

fn default_read_delay_ms() -> u64 {
    100
}

fn default_target_iteration() -> i64 {
    50
}

fn exe_sibling(name: &str) -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(name)))
        .unwrap_or_else(|| PathBuf::from(name))
}

fn default_driver_bin() -> PathBuf {
    exe_sibling("driver")
}

fn default_driver_lib() -> PathBuf {
    let name = if cfg!(target_os = "macos") {
        "libdriver_harness.dylib"
    } else if cfg!(windows) {
        "driver_harness.dll"
    } else {
        "libdriver_harness.so"
    };
    exe_sibling(name)
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            mode: RunMode::default(),
            update_interval_ms: default_update_interval_ms(),
            read_delay_ms: default_read_delay_ms(),
            target_iteration: default_target_iteration(),
            driver_bin: default_driver_bin(),
            driver_lib: default_driver_lib(),
        }
    }
}

impl HarnessConfig {
    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_target_iteration(mut self, target: i64) -> Self {
        self.target_iteration = target;
        self
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms)
    }

    pub fn read_delay(&self) -> Duration {
        Duration::from_millis(self.read_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HarnessConfig::default();
        assert_eq!(config.mode, RunMode::Json);
        assert_eq!(config.update_interval(), Duration::from_millis(50));
        assert_eq!(config.read_delay(), Duration::from_millis(100));
        assert_eq!(config.target_iteration, 50);
    }

    #[test]
    fn test_mode_wire_formats() {
        assert_eq!(RunMode::Json.wire_format(), Some(WireFormat::Json));
        assert_eq!(RunMode::Bin.wire_format(), Some(WireFormat::Binary));
        assert_eq!(RunMode::Str.wire_format(), Some(WireFormat::Text));
        assert_eq!(RunMode::Dynamic.wire_format(), None);
        assert_eq!(RunMode::Embedded.wire_format(), None);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: HarnessConfig = serde_json::from_str(r#"{"mode":"bin"}"#).unwrap();
        assert_eq!(config.mode, RunMode::Bin);
        assert_eq!(config.update_interval_ms, 50);
    }
}
