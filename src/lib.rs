//! cpuload - per-core CPU load sampler.
//!
//! Reads the kernel CPU counters from `/proc/stat` at a fixed interval, turns
//! the cumulative tick counts into a load percentage per core and streams the
//! result as timestamped CSV rows.
//!
//! Provides:
//! - `collector`: held-open counter source, parsing, core discovery, mocks
//! - `load`: two-generation per-core state and the load formula
//! - `emit`: CSV header and row output
//! - `poller`: the sampling loop tying it all together
//! - `clock`, `marker`, `shutdown`, `config`, `error`: supporting pieces

pub mod clock;
pub mod collector;
pub mod config;
pub mod emit;
pub mod error;
pub mod load;
pub mod marker;
pub mod poller;
pub mod shutdown;

pub use config::PollerConfig;
pub use poller::Poller;
pub use shutdown::ShutdownToken;
