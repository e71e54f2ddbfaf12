//! Parsers for the Linux `/proc` CPU counter file.

pub mod parser;

pub use parser::{CPU_FIELDS, CpuCounters, ParseError};
