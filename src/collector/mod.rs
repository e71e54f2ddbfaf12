//! Kernel CPU counter collection.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │              ProcStatSource<R>               │
//! │  - rewind()          (every pass)            │
//! │  - scan()            bounded line reader     │
//! │  - sample_into()  ──► procfs::parser         │
//! └───────────────────────┬──────────────────────┘
//!                         │ R: Read + Seek
//!              ┌──────────┴──────────┐
//!       ┌──────▼──────┐       ┌──────▼──────┐
//!       │    File     │       │ MockProcStat│
//!       │ /proc/stat  │       │  (Testing)  │
//!       └─────────────┘       └─────────────┘
//! ```
//!
//! `topology::discover_cores` runs once over the same source before sampling and
//! fixes which `cpuN` ids map to which slot.
//!
//! # Usage
//!
//! ```
//! use cpuload::collector::{MockProcStat, ProcStatSource, discover_cores};
//!
//! let mut source = ProcStatSource::new(MockProcStat::quad_core_idle());
//! let ids = discover_cores(&mut source).unwrap();
//! assert_eq!(ids, [0, 1, 2, 3]);
//!
//! let mut snapshots = vec![None; ids.len()];
//! assert_eq!(source.sample_into(&ids, &mut snapshots), 4);
//! ```

pub mod mock;
pub mod procfs;
mod source;
mod topology;

pub use mock::MockProcStat;
pub use procfs::{CpuCounters, ParseError};
pub use source::{MAX_LINE_LEN, ProcStatSource};
pub use topology::discover_cores;
