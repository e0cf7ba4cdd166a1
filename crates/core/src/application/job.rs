// Job - one scheduled binding of a target and a configured check

use crate::application::scheduler::constants::DEFAULT_CHECK_INTERVAL;
use crate::domain::{CheckConfig, CheckResult, TargetConfig};
use crate::port::{Check, CheckDescriptor};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Resolve the rescheduling interval
///
/// Priority: check override, then target default, then [`DEFAULT_CHECK_INTERVAL`].
/// Zero durations count as unset.
pub fn resolve_interval(check: Option<Duration>, target: Option<Duration>) -> Duration {
    check
        .filter(|d| !d.is_zero())
        .or_else(|| target.filter(|d| !d.is_zero()))
        .unwrap_or(DEFAULT_CHECK_INTERVAL)
}

/// Materialized job. Only `next_run` (and the check instance's own state) changes
/// after construction, and only the scheduler touches either.
pub struct Job {
    target: Arc<TargetConfig>,
    check_config: CheckConfig,
    descriptor: CheckDescriptor,
    instance: Box<dyn Check>,
    next_run: DateTime<Utc>,
}

impl Job {
    /// Bind a fresh check instance from `descriptor` to this target
    pub fn new(
        target: Arc<TargetConfig>,
        check_config: CheckConfig,
        descriptor: CheckDescriptor,
        next_run: DateTime<Utc>,
    ) -> Self {
        let instance = descriptor.instantiate();
        Self {
            target,
            check_config,
            descriptor,
            instance,
            next_run,
        }
    }

    pub fn target(&self) -> &TargetConfig {
        &self.target
    }

    pub fn target_id(&self) -> &str {
        &self.target.target_id
    }

    pub fn check_config(&self) -> &CheckConfig {
        &self.check_config
    }

    pub fn descriptor(&self) -> &CheckDescriptor {
        &self.descriptor
    }

    /// Display name of the bound check
    pub fn name(&self) -> &str {
        self.descriptor.display_name()
    }

    pub fn next_run(&self) -> DateTime<Utc> {
        self.next_run
    }

    /// Due once `now` has passed `next_run`; a job due exactly at `now` waits
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_run < now
    }

    pub fn interval(&self) -> Duration {
        resolve_interval(self.check_config.interval, self.target.default_interval)
    }

    pub(crate) async fn execute(&self) -> CheckResult {
        self.instance
            .run(&self.target.target_id, &self.check_config.args)
            .await
    }

    /// Set `next_run` to `now` plus the resolved interval
    pub(crate) fn reschedule(&mut self, now: DateTime<Utc>) {
        self.next_run = chrono::Duration::from_std(self.interval())
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("target", &self.target.target_id)
            .field("check", &self.descriptor.key())
            .field("next_run", &self.next_run)
            .finish()
    }
}
