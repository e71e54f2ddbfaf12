//! Runtime configuration of the sampling loop.

use std::path::PathBuf;
use std::time::Duration;

use crate::marker::DEFAULT_MARKER_PATH;

/// Default sampling interval, in microseconds (one second).
pub const DEFAULT_INTERVAL_US: u64 = 1_000_000;

/// Default kernel CPU counter file.
pub const DEFAULT_PROC_STAT: &str = "/proc/stat";

/// Settings the CLI layer hands to [`Poller`](crate::poller::Poller).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Pause between the end of one row and the start of the next sample.
    pub interval: Duration,
    /// Write the trace marker once, before the first sample.
    pub write_marker: bool,
    pub proc_stat_path: PathBuf,
    pub marker_path: PathBuf,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_micros(DEFAULT_INTERVAL_US),
            write_marker: false,
            proc_stat_path: PathBuf::from(DEFAULT_PROC_STAT),
            marker_path: PathBuf::from(DEFAULT_MARKER_PATH),
        }
    }
}
