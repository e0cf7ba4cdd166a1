// Check outcome model shared by the engine and every provider

use serde::{Deserialize, Serialize};
use tracing::Level;

/// Severity ladder for a failed check.
///
/// Each level maps to exactly one reaction in the scheduler; the ordering is
/// informational only and never used for threshold comparisons.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Debug,
    Notice,
    Warning,
    Error,
    Down,
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Down => "down",
            Severity::Fatal => "fatal",
        }
    }

    /// Log level the scheduler emits a failure of this severity at
    pub fn log_level(&self) -> Level {
        match self {
            Severity::Debug => Level::DEBUG,
            Severity::Notice => Level::INFO,
            Severity::Warning => Level::WARN,
            Severity::Error | Severity::Down | Severity::Fatal => Level::ERROR,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single check invocation
///
/// `severity` is only meaningful when `success` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub success: bool,
    pub severity: Severity,
    pub message: String,
}

impl CheckResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            severity: Severity::default(),
            message: String::new(),
        }
    }

    pub fn failure(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            success: false,
            severity,
            message: message.into(),
        }
    }

    /// True when this result must stop the scheduler
    pub fn is_fatal(&self) -> bool {
        !self.success && self.severity == Severity::Fatal
    }
}
