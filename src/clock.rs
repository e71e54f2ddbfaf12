//! Timestamp source for sample rows.

use std::cell::Cell;

/// Supplies the capture time of a sample, in seconds.
pub trait Clock {
    fn now_secs(&self) -> f64;
}

/// Seconds since boot from `CLOCK_BOOTTIME`.
///
/// Unaffected by timezone or clock adjustments, and keeps counting across suspend.
#[derive(Debug, Default, Clone, Copy)]
pub struct BootClock;

impl Clock for BootClock {
    fn now_secs(&self) -> f64 {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // SAFETY: `clock_gettime` only writes into the provided, valid timespec.
        if unsafe { libc::clock_gettime(BOOT_CLOCK_ID, &mut ts) } == 0 {
            ts.tv_sec as f64 + ts.tv_nsec as f64 / 1_000_000_000.0
        } else {
            0.0
        }
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
const BOOT_CLOCK_ID: libc::clockid_t = libc::CLOCK_BOOTTIME;

#[cfg(not(any(target_os = "linux", target_os = "android")))]
const BOOT_CLOCK_ID: libc::clockid_t = libc::CLOCK_MONOTONIC;

/// Deterministic clock that advances by a fixed step on every reading.
#[derive(Debug)]
pub struct StepClock {
    next: Cell<f64>,
    step: f64,
}

impl StepClock {
    pub fn new(start: f64, step: f64) -> Self {
        Self {
            next: Cell::new(start),
            step,
        }
    }
}

impl Clock for StepClock {
    fn now_secs(&self) -> f64 {
        let now = self.next.get();
        self.next.set(now + self.step);
        now
    }
}
