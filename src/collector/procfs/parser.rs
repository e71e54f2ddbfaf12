//! Parsers for `/proc/stat` CPU lines.
//!
//! These are pure functions over a single line of text, so they can be tested
//! with string inputs and reused by both topology discovery and sampling.

/// Tag prefix shared by the aggregate line and the per-core lines.
const CPU_TAG: &str = "cpu";

/// Number of counters expected after the tag on a CPU line.
pub const CPU_FIELDS: usize = 10;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Cumulative tick counters of one core, in `/proc/stat` field order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuCounters {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
    pub guest: u64,
    pub guest_nice: u64,
}

impl CpuCounters {
    /// Builds counters from the ten fields in kernel order.
    pub fn from_fields(f: [u64; CPU_FIELDS]) -> Self {
        Self {
            user: f[0],
            nice: f[1],
            system: f[2],
            idle: f[3],
            iowait: f[4],
            irq: f[5],
            softirq: f[6],
            steal: f[7],
            guest: f[8],
            guest_nice: f[9],
        }
    }

    /// Sum of all ten counters.
    ///
    /// Widened to `u128` so that even saturated `u64` fields cannot overflow.
    pub fn total(&self) -> u128 {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
            self.guest,
            self.guest_nice,
        ]
        .iter()
        .map(|&v| v as u128)
        .sum()
    }

    /// Time spent not doing work: `idle + iowait`.
    pub fn idle_total(&self) -> u128 {
        self.idle as u128 + self.iowait as u128
    }
}

/// Returns the core id if the leading token is a per-core tag (`cpu<N>`).
///
/// The aggregate `cpu` line has no trailing digits and yields `None`.
pub fn core_tag_id(token: &str) -> Option<u32> {
    let digits = token.strip_prefix(CPU_TAG)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Returns the core id if the line starts with a per-core tag.
pub fn core_line_id(line: &str) -> Option<u32> {
    line.split_whitespace().next().and_then(core_tag_id)
}

/// Parses a per-core line: `cpuN user nice system idle iowait irq softirq steal guest guest_nice`.
///
/// Fields beyond the tenth are ignored. Returns `Ok(None)` for lines that are not
/// per-core lines at all (aggregate line, `intr`, `ctxt`, ...), and `Err` for
/// per-core lines that do not carry ten valid counters.
pub fn parse_core_line(line: &str) -> Result<Option<(u32, CpuCounters)>, ParseError> {
    let mut parts = line.split_whitespace();
    let Some(cpu_id) = parts.next().and_then(core_tag_id) else {
        return Ok(None);
    };

    let mut fields = [0u64; CPU_FIELDS];
    for (idx, slot) in fields.iter_mut().enumerate() {
        let raw = parts.next().ok_or_else(|| {
            ParseError::new(format!(
                "cpu{cpu_id}: expected {CPU_FIELDS} fields, got {idx}"
            ))
        })?;
        *slot = raw
            .parse()
            .map_err(|e| ParseError::new(format!("cpu{cpu_id}: field {idx} '{raw}': {e}")))?;
    }

    Ok(Some((cpu_id, CpuCounters::from_fields(fields))))
}
