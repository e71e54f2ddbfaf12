//! Held-open reader over the kernel CPU counter file.
//!
//! `/proc/stat` is regenerated by the kernel on every read from offset zero,
//! so the file is opened once and rewound before each pass instead of being
//! reopened every tick.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, trace};

use crate::collector::procfs::parser::{CpuCounters, parse_core_line};

/// Maximum accepted line length in bytes.
///
/// A per-core line with ten maximal `u64` counters is well under this. Longer
/// lines (the `intr` line on large machines) are truncated and never parsed.
pub const MAX_LINE_LEN: usize = 512;

/// Result of reading one line with the length bound applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineRead {
    Eof,
    Line,
    Truncated,
}

/// Reads per-core counters from a rewindable `/proc/stat`-formatted source.
pub struct ProcStatSource<R> {
    reader: BufReader<R>,
    /// Reused line buffer, never grows past `MAX_LINE_LEN`.
    line: Vec<u8>,
    truncated_lines: u64,
}

impl ProcStatSource<File> {
    /// Opens the counter file at `path` for the lifetime of the source.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read + Seek> ProcStatSource<R> {
    /// Wraps an already opened source.
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            line: Vec::with_capacity(MAX_LINE_LEN),
            truncated_lines: 0,
        }
    }

    /// Resets the read cursor to the start of the source.
    ///
    /// Seeking the `BufReader` discards its buffer, so the next read reflects
    /// the current kernel state.
    pub fn rewind(&mut self) -> io::Result<()> {
        self.reader.seek(SeekFrom::Start(0))?;
        Ok(())
    }

    /// Number of over-long lines skipped since the source was created.
    pub fn truncated_lines(&self) -> u64 {
        self.truncated_lines
    }

    /// Rewinds and visits every line that fits the length bound and is valid UTF-8.
    ///
    /// `visit` returns `false` to stop the pass early.
    pub fn scan(&mut self, mut visit: impl FnMut(&str) -> bool) -> io::Result<()> {
        self.rewind()?;

        loop {
            match self.read_bounded_line()? {
                LineRead::Eof => return Ok(()),
                LineRead::Truncated => {
                    self.truncated_lines += 1;
                    continue;
                }
                LineRead::Line => {}
            }

            let Ok(text) = std::str::from_utf8(&self.line) else {
                continue;
            };
            if !visit(text) {
                return Ok(());
            }
        }
    }

    /// Reads the current counters of the cores in `ids` into the matching slots of `out`.
    ///
    /// `out[i]` receives the counters of core `ids[i]`, or `None` when that
    /// core's line is missing, does not carry ten valid counters, or was not
    /// reached before an I/O error. Lines of cores not listed in `ids` are
    /// ignored. Returns the number of slots filled.
    pub fn sample_into(&mut self, ids: &[u32], out: &mut [Option<CpuCounters>]) -> usize {
        out.fill(None);
        let wanted = ids.len().min(out.len());
        if wanted == 0 {
            return 0;
        }
        let ids = &ids[..wanted];

        let mut filled = 0;
        let result = self.scan(|line| {
            match parse_core_line(line) {
                Ok(Some((id, counters))) => match slot_of(ids, id) {
                    Some(slot) if out[slot].is_none() => {
                        out[slot] = Some(counters);
                        filled += 1;
                    }
                    Some(_) => trace!("Ignoring repeated line for cpu{}", id),
                    None => trace!("Ignoring cpu{}: not present at startup", id),
                },
                Ok(None) => {}
                Err(e) => trace!("Skipping CPU line: {}", e),
            }
            filled < wanted
        });

        if let Err(e) = result {
            debug!("Counter read ended early after {} cores: {}", filled, e);
        }

        filled
    }

    /// Reads every well-formed per-core line as `(id, counters)`, in file order.
    pub fn sample(&mut self) -> Vec<(u32, CpuCounters)> {
        let mut out = Vec::new();
        let result = self.scan(|line| {
            if let Ok(Some(entry)) = parse_core_line(line) {
                out.push(entry);
            }
            true
        });

        if let Err(e) = result {
            debug!("Counter read ended early after {} cores: {}", out.len(), e);
        }

        out
    }

    /// Reads one line into `self.line`, keeping at most `MAX_LINE_LEN` bytes.
    ///
    /// The newline is not stored. Bytes past the bound are consumed and dropped.
    fn read_bounded_line(&mut self) -> io::Result<LineRead> {
        self.line.clear();
        let mut truncated = false;

        loop {
            let available = match self.reader.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };

            if available.is_empty() {
                return Ok(if truncated {
                    LineRead::Truncated
                } else if self.line.is_empty() {
                    LineRead::Eof
                } else {
                    LineRead::Line
                });
            }

            let (chunk, used, done) = match available.iter().position(|&b| b == b'\n') {
                Some(pos) => (&available[..pos], pos + 1, true),
                None => (available, available.len(), false),
            };

            let room = MAX_LINE_LEN - self.line.len();
            if chunk.len() > room {
                self.line.extend_from_slice(&chunk[..room]);
                truncated = true;
            } else {
                self.line.extend_from_slice(chunk);
            }
            self.reader.consume(used);

            if done {
                return Ok(if truncated {
                    LineRead::Truncated
                } else {
                    LineRead::Line
                });
            }
        }
    }
}

/// Position of core `id` in `ids`.
fn slot_of(ids: &[u32], id: u32) -> Option<usize> {
    // Ids are normally dense, so the id is usually its own slot.
    match ids.get(id as usize) {
        Some(&known) if known == id => Some(id as usize),
        _ => ids.iter().position(|&known| known == id),
    }
}
