// Scheduler constants (no magic values)
use std::time::Duration;

/// Period of the scheduler tick (1s)
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Interval used when neither the check nor its target sets one (1 minute)
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Shortest tick period accepted from configuration (10ms)
pub const MIN_TICK_PERIOD: Duration = Duration::from_millis(10);
