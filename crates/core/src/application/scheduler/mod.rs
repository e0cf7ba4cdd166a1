// Scheduler - tick loop, due-job selection and severity-driven reaction

pub mod constants;
mod escalation;
mod shutdown;

use constants::*;
pub use escalation::{escalate, Escalation};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};

use crate::application::job::Job;
use crate::port::TimeProvider;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    /// Graceful stop requested; the loop exits after the in-flight tick
    Draining,
    Stopped,
}

/// Check that stopped the scheduler with a Fatal result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalStop {
    pub check: String,
    pub target: String,
    pub message: String,
}

/// Result of one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// All due jobs ran; `ran` of them were due
    Completed { ran: usize },
    /// A Fatal result ended the tick early
    Fatal(FatalStop),
}

/// Why [`Scheduler::run`] returned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerOutcome {
    Graceful,
    Fatal(FatalStop),
}

/// Scheduler owns the job set and is the only writer of `next_run`
///
/// Jobs run sequentially in creation order; a slow check delays every job after
/// it in the same tick.
pub struct Scheduler {
    jobs: Vec<Job>,
    time_provider: Arc<dyn TimeProvider>,
    tick_period: Duration,
    state: SchedulerState,
}

impl Scheduler {
    pub fn new(jobs: Vec<Job>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            jobs,
            time_provider,
            tick_period: DEFAULT_TICK_PERIOD,
            state: SchedulerState::Running,
        }
    }

    /// Override the tick period (clamped to [`MIN_TICK_PERIOD`])
    pub fn with_tick_period(mut self, tick_period: Duration) -> Self {
        self.tick_period = tick_period.max(MIN_TICK_PERIOD);
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// Drive the tick loop until a graceful stop is requested or a check
    /// reports Fatal
    pub async fn run(&mut self, mut shutdown: ShutdownToken) -> SchedulerOutcome {
        info!(
            jobs = self.jobs.len(),
            tick_ms = self.tick_period.as_millis() as u64,
            "Scheduler started"
        );

        let mut ticker = interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick of a tokio interval fires immediately; the first scan
        // happens one period after start
        ticker.tick().await;

        loop {
            if shutdown.is_shutdown() {
                self.state = SchedulerState::Draining;
                break;
            }

            tokio::select! {
                biased;
                _ = shutdown.wait() => {
                    info!("Exiting...");
                    self.state = SchedulerState::Draining;
                    break;
                }
                _ = ticker.tick() => {
                    let now = self.time_provider.now();
                    if let TickOutcome::Fatal(stop) = self.run_tick(now).await {
                        info!(name = %stop.check, target = %stop.target, "Scheduler aborted by fatal check");
                        return SchedulerOutcome::Fatal(stop);
                    }
                }
            }
        }

        self.state = SchedulerState::Stopped;
        info!("Scheduler stopped");
        SchedulerOutcome::Graceful
    }

    /// Run every job whose `next_run` is before `now`, in creation order
    ///
    /// A Fatal result stops the scheduler immediately: later due jobs in this
    /// tick do not run and the fatal job is not rescheduled.
    pub async fn run_tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        if self.state == SchedulerState::Stopped {
            return TickOutcome::Completed { ran: 0 };
        }

        let mut ran = 0;
        for job in self.jobs.iter_mut() {
            if !job.is_due(now) {
                continue;
            }

            info!(name = %job.name(), target = %job.target_id(), "Running check");
            let result = job.execute().await;
            ran += 1;

            if escalate(job.name(), job.target_id(), &result) == Escalation::Abort {
                self.state = SchedulerState::Stopped;
                return TickOutcome::Fatal(FatalStop {
                    check: job.descriptor().key().to_string(),
                    target: job.target_id().to_string(),
                    message: result.message,
                });
            }

            job.reschedule(now);
        }

        TickOutcome::Completed { ran }
    }
}
