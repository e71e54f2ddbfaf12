//! The sampling loop: read counters, derive loads, emit a CSV row, sleep.
//!
//! A `Poller` moves through three phases:
//!
//! 1. **Initializing** ([`Poller::open`] / [`Poller::init`]): discover cores,
//!    allocate per-core state, print the header, seed the first snapshot.
//! 2. **Sampling** ([`Poller::run`], one [`Poller::tick`] per interval) until
//!    the shutdown token is set. The token is checked between iterations only,
//!    so every started row is completed.
//! 3. **Terminating** ([`Poller::finish`] or drop): the counter file and the
//!    per-core state are released.

use std::fs::File;
use std::io::{Read, Seek, Write};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::collector::{CpuCounters, ProcStatSource, discover_cores};
use crate::config::PollerConfig;
use crate::emit::CsvEmitter;
use crate::error::{PollError, StartupError};
use crate::load::LoadSampler;
use crate::marker::TraceMarker;
use crate::shutdown::ShutdownToken;

/// Drives sampling of one counter source into one CSV stream.
pub struct Poller<R, W: Write, C> {
    source: ProcStatSource<R>,
    sampler: LoadSampler,
    emitter: CsvEmitter<W>,
    clock: C,
    /// Pending marker; taken on the first tick.
    marker: Option<TraceMarker>,
    interval: Duration,
    /// `cpuN` id of each column, fixed at discovery.
    core_ids: Vec<u32>,
    /// Per-tick snapshot slots, one per core.
    scratch: Vec<Option<CpuCounters>>,
    rows: u64,
    short_ticks: u64,
}

impl<W: Write, C: Clock> Poller<File, W, C> {
    /// Opens `config.proc_stat_path` and initializes a poller over it.
    pub fn open(config: &PollerConfig, out: W, clock: C) -> Result<Self, StartupError> {
        let source =
            ProcStatSource::open(&config.proc_stat_path).map_err(|e| StartupError::Open {
                path: config.proc_stat_path.clone(),
                source: e,
            })?;
        Self::init(source, out, clock, config)
    }
}

impl<R: Read + Seek, W: Write, C: Clock> Poller<R, W, C> {
    /// Discovers cores, allocates state, writes the header and seeds the first snapshot.
    pub fn init(
        mut source: ProcStatSource<R>,
        out: W,
        clock: C,
        config: &PollerConfig,
    ) -> Result<Self, StartupError> {
        let core_ids = discover_cores(&mut source).map_err(|e| StartupError::Read {
            path: config.proc_stat_path.clone(),
            source: e,
        })?;
        let cores = core_ids.len();
        if cores == 0 {
            return Err(StartupError::NoCores {
                path: config.proc_stat_path.clone(),
            });
        }
        info!("Detected {} CPU cores", cores);

        let alloc_err = |e| StartupError::Alloc { cores, source: e };
        let mut sampler = LoadSampler::with_cores(cores).map_err(alloc_err)?;
        let mut scratch = Vec::new();
        scratch.try_reserve_exact(cores).map_err(alloc_err)?;
        scratch.resize(cores, None);

        let mut emitter = CsvEmitter::new(out);
        emitter.write_header(cores).map_err(StartupError::Output)?;

        let seeded = source.sample_into(&core_ids, &mut scratch);
        sampler.seed(&scratch);
        debug!("Seeded {} of {} cores", seeded, cores);

        Ok(Self {
            source,
            sampler,
            emitter,
            clock,
            marker: config
                .write_marker
                .then(|| TraceMarker::new(&config.marker_path)),
            interval: config.interval,
            core_ids,
            scratch,
            rows: 0,
            short_ticks: 0,
        })
    }

    pub fn core_count(&self) -> usize {
        self.sampler.core_count()
    }

    /// `cpuN` id sampled into each column, in column order.
    pub fn core_ids(&self) -> &[u32] {
        &self.core_ids
    }

    /// Rows emitted so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Ticks on which fewer cores than discovered could be parsed.
    pub fn short_ticks(&self) -> u64 {
        self.short_ticks
    }

    pub fn output(&self) -> &W {
        self.emitter.get_ref()
    }

    /// Runs one iteration: timestamp, marker (first tick only), sample, loads, row.
    pub fn tick(&mut self) -> Result<(), PollError> {
        let timestamp = self.clock.now_secs();

        if let Some(marker) = self.marker.take() {
            // Logged inside; a failed marker never stops sampling.
            let _ = marker.write();
        }

        let cores = self.sampler.core_count();
        let parsed = self.source.sample_into(&self.core_ids, &mut self.scratch);
        if parsed < cores {
            self.note_short_tick(parsed, cores);
        }

        let loads = self.sampler.update(&self.scratch);
        self.emitter.write_row(timestamp, loads)?;
        self.rows += 1;

        Ok(())
    }

    /// Samples every interval until `shutdown` is requested. Returns the row count.
    pub fn run(&mut self, shutdown: &ShutdownToken) -> Result<u64, PollError> {
        info!(
            "Starting sampling loop: {} cores every {:?}",
            self.core_count(),
            self.interval
        );

        while !shutdown.is_requested() {
            self.tick()?;
            shutdown.sleep(self.interval);
        }

        info!("Shutting down after {} rows", self.rows);
        Ok(self.rows)
    }

    /// Releases the counter source and per-core state, returning the output.
    pub fn finish(self) -> W {
        self.emitter.into_inner()
    }

    fn note_short_tick(&mut self, parsed: usize, cores: usize) {
        self.short_ticks += 1;
        if self.short_ticks == 1 {
            warn!(
                "Only {} of {} CPU lines parsed; reusing last counters for the rest",
                parsed, cores
            );
        } else {
            debug!(
                "Short read #{}: {} of {} CPU lines parsed",
                self.short_ticks, parsed, cores
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::StepClock;
    use crate::collector::MockProcStat;
    use crate::error::{EXIT_NO_CORES, EXIT_OPEN};

    fn counters(user: u64, idle: u64) -> CpuCounters {
        CpuCounters {
            user,
            idle,
            ..Default::default()
        }
    }

    fn poller(stat: &MockProcStat) -> Poller<MockProcStat, Vec<u8>, StepClock> {
        Poller::init(
            ProcStatSource::new(stat.clone()),
            Vec::new(),
            StepClock::new(100.0, 1.0),
            &PollerConfig::default(),
        )
        .unwrap()
    }

    fn output_lines(p: &Poller<MockProcStat, Vec<u8>, StepClock>) -> Vec<String> {
        String::from_utf8(p.output().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_init_writes_header_only() {
        let p = poller(&MockProcStat::quad_core_idle());

        assert_eq!(p.core_count(), 4);
        assert_eq!(
            output_lines(&p),
            vec!["time,cpu0_load,cpu1_load,cpu2_load,cpu3_load"]
        );
    }

    #[test]
    fn test_first_tick_is_zero() {
        let stat = MockProcStat::from_cores(&[counters(0, 0), counters(0, 0)]);
        let mut p = poller(&stat);

        stat.set_content(crate::collector::mock::render_proc_stat(&[
            counters(90, 10),
            counters(50, 50),
        ]));
        p.tick().unwrap();

        assert_eq!(output_lines(&p)[1], "100.000000,0.00,0.00");
    }

    #[test]
    fn test_loads_follow_counter_deltas() {
        let stat = MockProcStat::from_cores(&[counters(100, 100), counters(100, 100)]);
        let mut p = poller(&stat);
        p.tick().unwrap();

        stat.set_content(crate::collector::mock::render_proc_stat(&[
            counters(180, 120),
            counters(100, 200),
        ]));
        p.tick().unwrap();

        let lines = output_lines(&p);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2], "101.000000,80.00,0.00");
    }

    #[test]
    fn test_unchanged_source_reports_zero() {
        let mut p = poller(&MockProcStat::dual_core());
        p.tick().unwrap();
        p.tick().unwrap();

        assert_eq!(output_lines(&p)[2], "101.000000,0.00,0.00");
    }

    #[test]
    fn test_missing_middle_core_reports_zero_in_its_own_column() {
        let idle = counters(0, 1000);
        let stat = MockProcStat::from_cores(&[idle, idle, idle]);
        let mut p = poller(&stat);
        p.tick().unwrap();

        // Every core idle for 100 ticks; cpu1's line is unreadable this tick.
        stat.set_content(
            "cpu  0 0 0 3300 0 0 0 0 0 0\n\
             cpu0 0 0 0 1100 0 0 0 0 0 0\n\
             cpu1 bad\n\
             cpu2 0 0 0 1100 0 0 0 0 0 0\n",
        );
        p.tick().unwrap();

        assert_eq!(p.short_ticks(), 1);
        assert_eq!(output_lines(&p)[2], "101.000000,0.00,0.00,0.00");
    }

    #[test]
    fn test_busy_core_after_missing_core_stays_in_its_column() {
        let idle = counters(0, 1000);
        let stat = MockProcStat::from_cores(&[idle, idle, idle]);
        let mut p = poller(&stat);
        p.tick().unwrap();

        // cpu1 offlined; cpu2 fully busy for 100 ticks.
        stat.set_content(
            "cpu0 0 0 0 1100 0 0 0 0 0 0\n\
             cpu2 100 0 0 1000 0 0 0 0 0 0\n",
        );
        p.tick().unwrap();

        assert_eq!(output_lines(&p)[2], "101.000000,0.00,0.00,100.00");
    }

    #[test]
    fn test_core_ids_follow_discovery() {
        let stat = MockProcStat::new(
            "cpu0 0 0 0 1 0 0 0 0 0 0\n\
             cpu2 0 0 0 1 0 0 0 0 0 0\n",
        );
        let p = poller(&stat);

        assert_eq!(p.core_ids(), &[0, 2]);
        assert_eq!(output_lines(&p), vec!["time,cpu0_load,cpu1_load"]);
    }

    #[test]
    fn test_short_read_keeps_column_count() {
        let stat = MockProcStat::dual_core();
        let mut p = poller(&stat);

        stat.set_content("cpu  1 0 0 0 0 0 0 0 0 0\ncpu0 1 0 0 0 0 0 0 0 0 0\ncpu1 bad\n");
        p.tick().unwrap();
        p.tick().unwrap();

        assert_eq!(p.short_ticks(), 2);
        for line in output_lines(&p) {
            assert_eq!(line.split(',').count(), 3);
        }
    }

    #[test]
    fn test_no_cores() {
        let err = Poller::init(
            ProcStatSource::new(MockProcStat::aggregate_only()),
            Vec::new(),
            StepClock::new(0.0, 1.0),
            &PollerConfig::default(),
        )
        .err()
        .unwrap();

        assert_eq!(err.exit_code(), EXIT_NO_CORES);
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = PollerConfig {
            proc_stat_path: dir.path().join("stat"),
            ..Default::default()
        };

        let err = Poller::open(&config, Vec::new(), StepClock::new(0.0, 1.0))
            .err()
            .unwrap();

        assert_eq!(err.exit_code(), EXIT_OPEN);
    }

    #[test]
    fn test_marker_written_once_before_first_sample() {
        let dir = tempfile::tempdir().unwrap();
        let marker_path = dir.path().join("trace_marker");
        let config = PollerConfig {
            write_marker: true,
            marker_path: marker_path.clone(),
            ..Default::default()
        };
        let mut p = Poller::init(
            ProcStatSource::new(MockProcStat::dual_core()),
            Vec::new(),
            StepClock::new(0.0, 1.0),
            &config,
        )
        .unwrap();
        assert!(!marker_path.exists());

        p.tick().unwrap();
        assert_eq!(
            std::fs::read_to_string(&marker_path).unwrap(),
            crate::marker::MARKER_TEXT
        );

        std::fs::remove_file(&marker_path).unwrap();
        p.tick().unwrap();
        assert!(!marker_path.exists());
    }

    #[test]
    fn test_marker_failure_does_not_stop_sampling() {
        let dir = tempfile::tempdir().unwrap();
        let config = PollerConfig {
            write_marker: true,
            marker_path: dir.path().join("no_such_dir").join("trace_marker"),
            ..Default::default()
        };
        let mut p = Poller::init(
            ProcStatSource::new(MockProcStat::dual_core()),
            Vec::new(),
            StepClock::new(0.0, 1.0),
            &config,
        )
        .unwrap();

        p.tick().unwrap();
        assert_eq!(p.rows(), 1);
    }

    #[test]
    fn test_run_returns_immediately_when_already_cancelled() {
        let mut p = poller(&MockProcStat::dual_core());
        let token = ShutdownToken::new();
        token.request();

        assert_eq!(p.run(&token).unwrap(), 0);
        assert_eq!(output_lines(&p).len(), 1);
    }
}
