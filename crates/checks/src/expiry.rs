// Expiry policy - grades how close a certificate or registration is to expiring

use crate::args::{duration_arg, require_duration};
use chrono::{DateTime, Utc};
use std::time::Duration;
use vigil_core::domain::{CheckArgs, CheckResult, Severity};
use vigil_core::port::ArgsError;

pub const DEFAULT_NOTIFY_AFTER: &str = "720h";
pub const DEFAULT_ERROR_AFTER: &str = "168h";

/// Warning and error windows before an expiry date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub notify_after: Duration,
    pub error_after: Duration,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            notify_after: Duration::from_secs(720 * 3600),
            error_after: Duration::from_secs(168 * 3600),
        }
    }
}

impl ExpiryPolicy {
    /// Read `notify_after` and `error_after`, defaulting to 720h and 168h
    pub fn from_args(args: &CheckArgs) -> Result<Self, ArgsError> {
        Ok(Self {
            notify_after: duration_arg(args, "notify_after", DEFAULT_NOTIFY_AFTER)?,
            error_after: duration_arg(args, "error_after", DEFAULT_ERROR_AFTER)?,
        })
    }

    /// Grade `expires_at` as seen at `now`
    ///
    /// Already expired is Down, inside the error window is Error, inside the
    /// notify window is Warning, anything later succeeds. The two windows are
    /// not required to be ordered.
    pub fn classify(
        &self,
        subject: &str,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> CheckResult {
        let date = expires_at.to_rfc2822();

        if expires_at < now {
            return CheckResult::failure(
                Severity::Down,
                format!("{subject} is not valid anymore. Expiration date: {date}"),
            );
        }
        if expires_at < shift(now, self.error_after) {
            return CheckResult::failure(
                Severity::Error,
                format!("{subject} is about to expire. Expiration date: {date}"),
            );
        }
        if expires_at < shift(now, self.notify_after) {
            return CheckResult::failure(
                Severity::Warning,
                format!("{subject} is about to expire. Expiration date: {date}"),
            );
        }
        CheckResult::ok()
    }
}

fn shift(now: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(by)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Argument validator shared by the ssl and dns checks
pub fn validate_expiry_args(args: &CheckArgs) -> Result<(), ArgsError> {
    require_duration(args, "notify_after")?;
    require_duration(args, "error_after")
}
