//! In-memory stand-in for a held-open `/proc/stat`.
//!
//! Like the real file, the content can change between reads: every clone of a
//! `MockProcStat` shares the same content, so a test keeps one clone and hands
//! the other to the source under test.

use std::io::{self, Read, Seek, SeekFrom};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Shared {
    content: String,
    /// Reads at or past this offset fail, to simulate a broken source.
    fail_after: Option<u64>,
}

/// Rewindable in-memory counter file.
#[derive(Debug, Clone, Default)]
pub struct MockProcStat {
    shared: Arc<Mutex<Shared>>,
    pos: u64,
}

impl MockProcStat {
    /// Creates a mock file with the given content.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared {
                content: content.into(),
                fail_after: None,
            })),
            pos: 0,
        }
    }

    /// Replaces the content seen by every clone.
    ///
    /// Read positions are left untouched, as with the kernel file.
    pub fn set_content(&self, content: impl Into<String>) {
        self.lock().content = content.into();
    }

    /// Makes reads at or beyond `offset` return an I/O error. `None` clears it.
    pub fn fail_reads_after(&self, offset: Option<u64>) {
        self.lock().fail_after = offset;
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Read for MockProcStat {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let shared = self.lock();
        let bytes = shared.content.as_bytes();

        let mut end = bytes.len() as u64;
        if let Some(limit) = shared.fail_after {
            if self.pos >= limit {
                return Err(io::Error::other("mock read failure"));
            }
            end = end.min(limit);
        }

        let start = self.pos.min(end) as usize;
        let n = buf.len().min(end as usize - start);
        buf[..n].copy_from_slice(&bytes[start..start + n]);
        drop(shared);

        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for MockProcStat {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let len = self.lock().content.len() as i128;
        let target = match pos {
            SeekFrom::Start(offset) => offset as i128,
            SeekFrom::End(delta) => len + delta as i128,
            SeekFrom::Current(delta) => self.pos as i128 + delta as i128,
        };

        if target < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "seek before start of mock file",
            ));
        }

        self.pos = target as u64;
        Ok(self.pos)
    }
}
