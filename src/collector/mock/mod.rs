//! Mock counter sources for testing.
//!
//! This module provides `MockProcStat` and pre-built scenarios for testing
//! the sampler without requiring actual Linux `/proc` filesystem access.

mod scenarios;
mod stat_file;

pub use scenarios::render_proc_stat;
pub use stat_file::MockProcStat;
