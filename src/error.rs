//! Error types and process exit codes.

use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;

/// Clean shutdown after a termination signal.
pub const EXIT_OK: i32 = 0;
/// Help requested or arguments could not be parsed.
pub const EXIT_USAGE: i32 = 1;
/// The counter file could not be opened or read at startup.
pub const EXIT_OPEN: i32 = 2;
/// The counter file lists no per-core lines.
pub const EXIT_NO_CORES: i32 = 3;
/// Per-core state could not be allocated.
pub const EXIT_ALLOC: i32 = 4;
/// Standard output became unwritable.
pub const EXIT_OUTPUT: i32 = 5;

/// Fatal errors while bringing the sampler up.
#[derive(Debug)]
pub enum StartupError {
    /// Opening the counter file failed.
    Open { path: PathBuf, source: io::Error },
    /// Reading the counter file during core discovery failed.
    Read { path: PathBuf, source: io::Error },
    /// No per-core lines were found.
    NoCores { path: PathBuf },
    /// Allocating per-core state failed.
    Alloc {
        cores: usize,
        source: TryReserveError,
    },
    /// Writing the CSV header failed.
    Output(io::Error),
}

impl StartupError {
    pub fn exit_code(&self) -> i32 {
        match self {
            StartupError::Open { .. } | StartupError::Read { .. } => EXIT_OPEN,
            StartupError::NoCores { .. } => EXIT_NO_CORES,
            StartupError::Alloc { .. } => EXIT_ALLOC,
            StartupError::Output(_) => EXIT_OUTPUT,
        }
    }
}

impl std::fmt::Display for StartupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StartupError::Open { path, source } => {
                write!(f, "Could not open {}: {}", path.display(), source)
            }
            StartupError::Read { path, source } => {
                write!(f, "Could not read {}: {}", path.display(), source)
            }
            StartupError::NoCores { path } => {
                write!(f, "No CPU information found in {}", path.display())
            }
            StartupError::Alloc { cores, source } => {
                write!(f, "Failed to allocate memory for {} CPUs: {}", cores, source)
            }
            StartupError::Output(e) => write!(f, "Failed to write CSV header: {}", e),
        }
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StartupError::Open { source, .. } | StartupError::Read { source, .. } => Some(source),
            StartupError::Alloc { source, .. } => Some(source),
            StartupError::Output(e) => Some(e),
            StartupError::NoCores { .. } => None,
        }
    }
}

/// Fatal errors inside the sampling loop.
#[derive(Debug)]
pub enum PollError {
    /// Writing a row to the output failed.
    Output(io::Error),
}

impl PollError {
    pub fn exit_code(&self) -> i32 {
        match self {
            PollError::Output(_) => EXIT_OUTPUT,
        }
    }
}

impl std::fmt::Display for PollError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollError::Output(e) => write!(f, "Failed to write sample row: {}", e),
        }
    }
}

impl std::error::Error for PollError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PollError::Output(e) => Some(e),
        }
    }
}

impl From<io::Error> for PollError {
    fn from(e: io::Error) -> Self {
        PollError::Output(e)
    }
}
