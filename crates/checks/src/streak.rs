// Failure streak - consecutive failures tolerated before a check escalates

use std::sync::atomic::{AtomicU32, Ordering};
use vigil_core::domain::Severity;

/// Consecutive failure counter owned by one check instance
///
/// Every failure increments the counter, success resets it. While the count
/// before a failure is below the tolerated number of retries the failure is
/// reported as [`Severity::Debug`]; from then on as [`Severity::Error`].
#[derive(Debug, Default)]
pub struct FailureStreak {
    failed: AtomicU32,
}

impl FailureStreak {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a transport or status failure and return the severity to report
    pub fn record_failure(&self, retries: u32) -> Severity {
        let previous = self.failed.fetch_add(1, Ordering::SeqCst);
        if previous < retries {
            Severity::Debug
        } else {
            Severity::Error
        }
    }

    /// Record a failure that is reported at its own severity (bad arguments)
    pub fn record_other(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.failed.store(0, Ordering::SeqCst);
    }

    pub fn count(&self) -> u32 {
        self.failed.load(Ordering::SeqCst)
    }
}
