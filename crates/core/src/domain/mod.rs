// Domain Layer - Pure data model shared by the engine and providers

pub mod duration;
pub mod error;
pub mod severity;
pub mod target;

// Re-exports
pub use duration::parse_duration;
pub use error::DomainError;
pub use severity::{CheckResult, Severity};
pub use target::{CheckArgs, CheckConfig, TargetConfig};
