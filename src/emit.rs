//! CSV output of sampled loads.

use std::fmt::Write as _;
use std::io::{self, Write};

/// Builds the header line (without newline): `time,cpu0_load,...,cpu{N-1}_load`.
pub fn header_line(cores: usize) -> String {
    let mut line = String::from("time");
    for idx in 0..cores {
        let _ = write!(line, ",cpu{idx}_load");
    }
    line
}

/// Appends one data row (without newline) to `buf`.
///
/// The timestamp keeps microsecond precision, loads are printed with two decimals.
pub fn format_row(buf: &mut String, timestamp: f64, loads: &[f64]) {
    let _ = write!(buf, "{timestamp:.6}");
    for load in loads {
        let _ = write!(buf, ",{load:.2}");
    }
}

/// Writes the CSV stream: one header, then one flushed row per sample.
pub struct CsvEmitter<W: Write> {
    out: W,
    /// Reused row buffer so steady-state sampling does not allocate.
    row: String,
}

impl<W: Write> CsvEmitter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            row: String::new(),
        }
    }

    pub fn write_header(&mut self, cores: usize) -> io::Result<()> {
        let mut line = header_line(cores);
        line.push('\n');
        self.out.write_all(line.as_bytes())?;
        self.out.flush()
    }

    /// Writes a complete row and flushes it.
    ///
    /// The row is formatted in full before the first byte is written.
    pub fn write_row(&mut self, timestamp: f64, loads: &[f64]) -> io::Result<()> {
        self.row.clear();
        format_row(&mut self.row, timestamp, loads);
        self.row.push('\n');

        self.out.write_all(self.row.as_bytes())?;
        self.out.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_line() {
        assert_eq!(header_line(0), "time");
        assert_eq!(header_line(3), "time,cpu0_load,cpu1_load,cpu2_load");
    }

    #[test]
    fn test_format_row() {
        let mut buf = String::new();
        format_row(&mut buf, 12345.678901234, &[0.0, 80.0, 33.333333]);
        assert_eq!(buf, "12345.678901,0.00,80.00,33.33");
    }

    #[test]
    fn test_row_and_header_column_counts_match() {
        let cores = 6;
        let mut buf = String::new();
        format_row(&mut buf, 1.0, &vec![12.5; cores]);

        let header_cols = header_line(cores).split(',').count();
        assert_eq!(header_cols, 1 + cores);
        assert_eq!(buf.split(',').count(), header_cols);
    }

    #[test]
    fn test_emitter_writes_lines() {
        let mut emitter = CsvEmitter::new(Vec::new());
        emitter.write_header(2).unwrap();
        emitter.write_row(1.5, &[10.0, 20.0]).unwrap();
        emitter.write_row(2.5, &[0.0, 100.0]).unwrap();

        let text = String::from_utf8(emitter.into_inner()).unwrap();
        assert_eq!(
            text,
            "time,cpu0_load,cpu1_load\n1.500000,10.00,20.00\n2.500000,0.00,100.00\n"
        );
    }

    #[test]
    fn test_emitter_propagates_write_errors() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::ErrorKind::BrokenPipe.into())
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut emitter = CsvEmitter::new(Closed);
        let err = emitter.write_row(0.0, &[1.0]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
