//! One-shot trace marker used to align sample timestamps with ftrace.
//!
//! The marker text shows up as a `print` event in the trace, whose timestamp
//! can then be matched against the first CSV row.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, error};

/// Text written to the marker sink.
pub const MARKER_TEXT: &str = "CPU_POLLER_START";

/// Default ftrace marker file.
pub const DEFAULT_MARKER_PATH: &str = "/sys/kernel/debug/tracing/trace_marker";

/// A marker that has not been written yet.
///
/// Writing consumes it, so it can be written at most once.
#[derive(Debug, Clone)]
pub struct TraceMarker {
    path: PathBuf,
}

impl TraceMarker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Writes the marker. Failures are logged and otherwise ignored.
    pub fn write(self) -> io::Result<()> {
        let result = write_marker(&self.path);
        match &result {
            Ok(()) => debug!("Trace marker written to {}", self.path.display()),
            Err(e) => error!(
                "Failed writing trace marker to {}: {}",
                self.path.display(),
                e
            ),
        }
        result
    }
}

fn write_marker(path: &Path) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(MARKER_TEXT.as_bytes())
}
