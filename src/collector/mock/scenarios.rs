//! Pre-built `/proc/stat` scenarios for testing.
//!
//! These scenarios provide realistic counter file states for the conditions
//! the sampler has to handle.

use std::fmt::Write;

use super::stat_file::MockProcStat;
use crate::collector::procfs::parser::CpuCounters;

/// Renders a `/proc/stat` text for the given per-core counters.
///
/// The aggregate `cpu` line is the field-wise sum, and the usual trailing
/// non-CPU lines are appended.
pub fn render_proc_stat(cores: &[CpuCounters]) -> String {
    let mut sum = CpuCounters::default();
    for c in cores {
        sum.user += c.user;
        sum.nice += c.nice;
        sum.system += c.system;
        sum.idle += c.idle;
        sum.iowait += c.iowait;
        sum.irq += c.irq;
        sum.softirq += c.softirq;
        sum.steal += c.steal;
        sum.guest += c.guest;
        sum.guest_nice += c.guest_nice;
    }

    let mut out = String::new();
    push_cpu_line(&mut out, "cpu ", &sum);
    for (idx, c) in cores.iter().enumerate() {
        push_cpu_line(&mut out, &format!("cpu{idx}"), c);
    }
    out.push_str(
        "\
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
softirq 20000 10 5000 20 3000 100 0 200 4000 0 7667
",
    );
    out
}

fn push_cpu_line(out: &mut String, tag: &str, c: &CpuCounters) {
    let _ = writeln!(
        out,
        "{} {} {} {} {} {} {} {} {} {} {}",
        tag,
        c.user,
        c.nice,
        c.system,
        c.idle,
        c.iowait,
        c.irq,
        c.softirq,
        c.steal,
        c.guest,
        c.guest_nice
    );
}

impl MockProcStat {
    /// A mostly idle four-core machine.
    pub fn quad_core_idle() -> Self {
        Self::new(
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
cpu1 2500 125 750 20000 250 50 25 0 0 0
cpu2 2500 125 750 20000 250 50 25 0 0 0
cpu3 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
",
        )
    }

    /// Two cores, as in the smallest multi-core systems.
    pub fn dual_core() -> Self {
        Self::new(
            "\
cpu  200 0 100 1000 20 0 0 0 0 0
cpu0 100 0 50 500 10 0 0 0 0 0
cpu1 100 0 50 500 10 0 0 0 0 0
intr 5000 0 0
ctxt 1000
btime 1700000000
",
        )
    }

    /// Only the aggregate line is present, so no cores can be discovered.
    pub fn aggregate_only() -> Self {
        Self::new(
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
intr 1000000 50 0 0
ctxt 500000
btime 1700000000
",
        )
    }

    /// Counters from a pre-2.6.33 kernel: only eight fields per line.
    pub fn legacy_eight_fields() -> Self {
        Self::new(
            "\
cpu  10000 500 3000 80000 1000 200 100 0
cpu0 5000 250 1500 40000 500 100 50 0
cpu1 5000 250 1500 40000 500 100 50 0
ctxt 500000
",
        )
    }

    /// Builds a scenario from explicit per-core counters.
    pub fn from_cores(cores: &[CpuCounters]) -> Self {
        Self::new(render_proc_stat(cores))
    }
}
