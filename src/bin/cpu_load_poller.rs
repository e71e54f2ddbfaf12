//! cpu_load_poller - per-core CPU load sampler.
//!
//! Polls /proc/stat every INTERVAL microseconds and writes per-core load as CSV
//! to stdout until terminated. Logs go to stderr.
//!
//! Usage:
//!   cpu_load_poller               # sample once per second
//!   cpu_load_poller -t 100000     # sample every 100 ms
//!   cpu_load_poller -m            # write an ftrace marker before the first sample

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::fmt;
use std::io::{self, BufWriter, IsTerminal};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::{Event, Level, Subscriber, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use cpuload::clock::BootClock;
use cpuload::config::{DEFAULT_INTERVAL_US, DEFAULT_PROC_STAT};
use cpuload::error::{EXIT_OK, EXIT_USAGE};
use cpuload::marker::DEFAULT_MARKER_PATH;
use cpuload::{Poller, PollerConfig, ShutdownToken};

const USAGE: &str = "\
usage: cpu_load_poller [-h] [-m] [-t INTERVAL]
polls /proc/stat every INTERVAL microseconds and outputs
per-core CPU load in CSV format including a timestamp to STDOUT

    -h     Display this message
    -m     Insert a marker into ftrace at the time of the first
           sample. This marker may be used to align the timestamps
           produced by the poller with those of ftrace events.
    -t     The polling sample interval in microseconds
           Defaults to 1000000 (1 second)
    --proc-stat PATH    Counter file to read (default /proc/stat)
    --marker-path PATH  Trace marker sink (default
                        /sys/kernel/debug/tracing/trace_marker)
    -v     More log output on stderr (-vv for trace)
    -q     Only log errors
";

/// Per-core CPU load sampler.
#[derive(Parser)]
#[command(name = "cpu_load_poller", version, disable_help_flag = true)]
struct Args {
    /// Print usage and exit.
    #[arg(short, long)]
    help: bool,

    /// Write a marker into ftrace before the first sample.
    #[arg(short, long)]
    marker: bool,

    /// Sampling interval in microseconds.
    #[arg(short = 't', long, value_name = "INTERVAL", default_value_t = DEFAULT_INTERVAL_US)]
    interval: u64,

    /// Path to the kernel CPU counter file.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_PROC_STAT)]
    proc_stat: PathBuf,

    /// Path to the ftrace marker file.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_MARKER_PATH)]
    marker_path: PathBuf,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn to_config(&self) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_micros(self.interval),
            write_marker: self.marker,
            proc_stat_path: self.proc_stat.clone(),
            marker_path: self.marker_path.clone(),
        }
    }
}

/// `LEVEL: message` lines, with warnings spelled `WARNING` for the host's log scan.
struct HostLogFormat;

impl<S, N> FormatEvent<S, N> for HostLogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let level = *event.metadata().level();
        let label = if level == Level::WARN {
            "WARNING"
        } else {
            level.as_str()
        };
        write!(writer, "{label}: ")?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Initializes the tracing subscriber on stderr; stdout carries the CSV stream.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("cpu_load_poller={}", level).parse().unwrap())
        .add_directive(format!("cpuload={}", level).parse().unwrap());

    tracing_subscriber::fmt()
        .with_ansi(io::stderr().is_terminal())
        .event_format(HostLogFormat)
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.kind() == ErrorKind::DisplayVersion => e.exit(),
        Err(e) => {
            eprintln!("{}", e.render());
            eprint!("{USAGE}");
            std::process::exit(EXIT_USAGE);
        }
    };

    if args.help {
        eprint!("{USAGE}");
        std::process::exit(EXIT_USAGE);
    }

    init_logging(args.verbose, args.quiet);
    std::process::exit(run(&args.to_config()));
}

/// Runs the sampler to completion and returns the process exit code.
///
/// All resources are dropped before returning, since `process::exit` skips destructors.
fn run(config: &PollerConfig) -> i32 {
    info!(
        "cpu_load_poller {} starting: source={}, interval={:?}, marker={}",
        env!("CARGO_PKG_VERSION"),
        config.proc_stat_path.display(),
        config.interval,
        config.write_marker
    );

    let stdout = BufWriter::new(io::stdout().lock());
    let mut poller = match Poller::open(config, stdout, BootClock) {
        Ok(poller) => poller,
        Err(e) => {
            error!("{}", e);
            return e.exit_code();
        }
    };

    let shutdown = ShutdownToken::new();
    if let Err(e) = shutdown.install_handler() {
        warn!("Failed to set termination handler: {}", e);
    }

    let code = match poller.run(&shutdown) {
        Ok(_) => EXIT_OK,
        Err(e) => {
            error!("{}", e);
            e.exit_code()
        }
    };

    drop(poller);
    info!("Shutdown complete");
    code
}
