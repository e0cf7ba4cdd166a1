// Application Layer - Registry, provider lifecycle, jobs and scheduling

pub mod job;
pub mod lifecycle;
pub mod materializer;
pub mod registry;
pub mod scheduler;

// Re-exports
pub use job::{resolve_interval, Job};
pub use lifecycle::{load_providers, run_setup, run_shutdown, setup_all, LoadedProvider};
pub use materializer::{materialize_jobs, validate_config};
pub use registry::{Registry, RegistryBuilder};
pub use scheduler::{
    shutdown_channel, FatalStop, Scheduler, SchedulerOutcome, SchedulerState, ShutdownSender,
    ShutdownToken, TickOutcome,
};
