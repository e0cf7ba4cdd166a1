// Severity escalation - maps a check result to a log event and a scheduler action

use crate::domain::{CheckResult, Severity};
use tracing::{debug, error, info, warn};

/// What the scheduler does after a check returns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// Reschedule and carry on with the tick
    Continue,
    /// Stop the scheduler now, skipping the rest of the tick
    Abort,
}

/// Log a failed result at the level its severity calls for and decide whether
/// scheduling continues. Successful results are not logged.
pub fn escalate(name: &str, target: &str, result: &CheckResult) -> Escalation {
    if result.success {
        return Escalation::Continue;
    }

    let message = result.message.as_str();
    match result.severity {
        Severity::Debug => {
            debug!(name = %name, target = %target, message = %message, "Check Debug")
        }
        Severity::Notice => {
            info!(name = %name, target = %target, message = %message, "Check Notice")
        }
        Severity::Warning => {
            warn!(name = %name, target = %target, message = %message, "Check Warning")
        }
        Severity::Error => {
            error!(name = %name, target = %target, message = %message, "Check Error")
        }
        Severity::Down => {
            error!(name = %name, target = %target, message = %message, down = true, "Target Down")
        }
        Severity::Fatal => {
            error!(name = %name, target = %target, message = %message, "Check Fatal");
            return Escalation::Abort;
        }
    }

    Escalation::Continue
}
