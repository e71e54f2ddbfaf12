//! Cooperative shutdown on termination signals.
//!
//! The signal handler only sets a flag. The sampling loop polls it between
//! iterations and while sleeping, so a row is never cut short.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::info;

/// Longest uninterrupted sleep before the flag is checked again.
const SLEEP_SLICE: Duration = Duration::from_millis(100);

/// Shared "shutdown requested" flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownToken {
    requested: Arc<AtomicBool>,
}

impl ShutdownToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes SIGINT, SIGTERM and SIGHUP to [`request`](Self::request).
    ///
    /// Can only succeed once per process.
    pub fn install_handler(&self) -> Result<(), ctrlc::Error> {
        let token = self.clone();
        ctrlc::set_handler(move || {
            info!("Received shutdown signal");
            token.request();
        })
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    /// Sleeps for `duration`, returning early once shutdown is requested.
    ///
    /// Returns `true` if shutdown was requested.
    pub fn sleep(&self, duration: Duration) -> bool {
        let mut remaining = duration;
        while remaining > Duration::ZERO && !self.is_requested() {
            let slice = remaining.min(SLEEP_SLICE);
            std::thread::sleep(slice);
            remaining = remaining.saturating_sub(slice);
        }
        self.is_requested()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_request_is_shared_between_clones() {
        let token = ShutdownToken::new();
        let clone = token.clone();
        assert!(!clone.is_requested());

        token.request();

        assert!(clone.is_requested());
    }

    #[test]
    fn test_sleep_returns_early_when_requested() {
        let token = ShutdownToken::new();
        let remote = token.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            remote.request();
        });

        let start = Instant::now();
        assert!(token.sleep(Duration::from_secs(30)));
        assert!(start.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn test_sleep_full_duration() {
        let token = ShutdownToken::new();
        let start = Instant::now();
        assert!(!token.sleep(Duration::from_millis(30)));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
