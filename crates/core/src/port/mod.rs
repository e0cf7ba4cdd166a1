// Port Layer - Interfaces for external dependencies

pub mod check;
pub mod id_provider; // For deterministic testing
pub mod provider;
pub mod provider_source;
pub mod time_provider;

// Re-exports
pub use check::{ArgsError, ArgsValidator, Check, CheckDescriptor, CheckFactory};
pub use id_provider::{IdProvider, UuidProvider};
pub use provider::{
    CheckRegistrar, Provider, ProviderError, ProviderFactory, SetupContext, ShutdownContext,
};
pub use provider_source::{LoadError, ProviderSource, StaticProviderSource};
pub use time_provider::{SystemTimeProvider, TimeProvider};
