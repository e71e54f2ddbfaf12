//! Per-core load derivation from cumulative CPU counters.
//!
//! Counters in `/proc/stat` only ever grow, so a load figure needs two
//! generations: the counters read this tick and the ones read the tick
//! before. [`LoadSampler`] keeps both for every core.

use std::collections::TryReserveError;

use crate::collector::CpuCounters;

/// Load of one core between two snapshots, in percent.
///
/// `100 * (1 - idle_delta / total_delta)`. Returns `0.0` when no ticks elapsed.
/// Deltas are signed, so counters that went backwards produce a value outside
/// `0..=100` instead of wrapping.
pub fn cpu_load(current: &CpuCounters, previous: &CpuCounters) -> f64 {
    let total_delta = current.total() as i128 - previous.total() as i128;
    if total_delta == 0 {
        return 0.0;
    }
    let idle_delta = current.idle_total() as i128 - previous.idle_total() as i128;

    100.0 * (1.0 - idle_delta as f64 / total_delta as f64)
}

/// Current and previous counters of one core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoreState {
    pub current: CpuCounters,
    pub previous: CpuCounters,
}

impl CoreState {
    pub fn load(&self) -> f64 {
        cpu_load(&self.current, &self.previous)
    }
}

/// Holds per-core state for a fixed number of cores and turns raw snapshots into loads.
#[derive(Debug)]
pub struct LoadSampler {
    cores: Vec<CoreState>,
    loads: Vec<f64>,
    first_tick: bool,
}

impl LoadSampler {
    /// Allocates state for `count` cores. The size never changes afterwards.
    pub fn with_cores(count: usize) -> Result<Self, TryReserveError> {
        let mut cores = Vec::new();
        cores.try_reserve_exact(count)?;
        cores.resize(count, CoreState::default());

        let mut loads = Vec::new();
        loads.try_reserve_exact(count)?;
        loads.resize(count, 0.0);

        Ok(Self {
            cores,
            loads,
            first_tick: true,
        })
    }

    pub fn core_count(&self) -> usize {
        self.cores.len()
    }

    pub fn cores(&self) -> &[CoreState] {
        &self.cores
    }

    /// `true` until the first call to [`update`](Self::update).
    pub fn is_first_tick(&self) -> bool {
        self.first_tick
    }

    /// Sets both generations to `snapshots`, before the first tick.
    ///
    /// Cores without a snapshot keep zeroed counters.
    pub fn seed(&mut self, snapshots: &[Option<CpuCounters>]) {
        for (core, snap) in self.cores.iter_mut().zip(snapshots) {
            if let Some(snap) = snap {
                core.current = *snap;
                core.previous = *snap;
            }
        }
    }

    /// Records this tick's snapshots and returns one load per core, in core order.
    ///
    /// `snapshots[i]` belongs to core `i`. Cores whose slot is `None` (or missing)
    /// keep their last counters, which makes their delta zero and their load `0.0`.
    /// The first tick reports `0.0` for every core. Afterwards the current
    /// generation becomes the previous one.
    pub fn update(&mut self, snapshots: &[Option<CpuCounters>]) -> &[f64] {
        for (idx, (core, load)) in self
            .cores
            .iter_mut()
            .zip(self.loads.iter_mut())
            .enumerate()
        {
            if let Some(Some(snap)) = snapshots.get(idx) {
                core.current = *snap;
            }

            *load = if self.first_tick { 0.0 } else { core.load() };

            core.previous = core.current;
        }

        self.first_tick = false;
        &self.loads
    }
}
