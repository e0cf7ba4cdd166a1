// Provider Port
// A provider is an externally supplied unit that registers checks during setup

use crate::port::check::CheckDescriptor;
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by a provider's lifecycle hooks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("setup failed: {0}")]
    Setup(String),

    #[error("shutdown failed: {0}")]
    Shutdown(String),
}

/// Write side of the check registry as seen by providers
pub trait CheckRegistrar {
    /// Register `descriptor` under `namespace`. Conflicts are resolved by the registrar.
    fn add_check(&mut self, namespace: &str, descriptor: CheckDescriptor);
}

/// Capability handed to [`Provider::setup`]
///
/// Bound to the provider's load-time id; every check added through it is
/// namespaced by that id. This is the only way a provider can register checks.
pub struct SetupContext<'a> {
    provider_id: &'a str,
    registrar: &'a mut dyn CheckRegistrar,
}

impl<'a> SetupContext<'a> {
    pub fn new(provider_id: &'a str, registrar: &'a mut dyn CheckRegistrar) -> Self {
        Self {
            provider_id,
            registrar,
        }
    }

    pub fn provider_id(&self) -> &str {
        self.provider_id
    }

    pub fn add_check(&mut self, descriptor: CheckDescriptor) {
        self.registrar.add_check(self.provider_id, descriptor);
    }
}

/// Context handed to [`Provider::shutdown`]
pub struct ShutdownContext<'a> {
    provider_id: &'a str,
}

impl<'a> ShutdownContext<'a> {
    pub fn new(provider_id: &'a str) -> Self {
        Self { provider_id }
    }

    pub fn provider_id(&self) -> &str {
        self.provider_id
    }
}

/// Provider lifecycle contract
///
/// `setup` runs once at startup, `shutdown` once when the engine stops gracefully.
pub trait Provider: Send + Sync {
    fn name(&self) -> &str;

    fn setup(&self, ctx: &mut SetupContext<'_>) -> Result<(), ProviderError>;

    fn shutdown(&self, ctx: &ShutdownContext<'_>) -> Result<(), ProviderError>;
}

/// Constructs a provider; used by static and catalog-based sources
pub type ProviderFactory = Arc<dyn Fn() -> Box<dyn Provider> + Send + Sync>;

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Provider that registers a fixed set of descriptors and records shutdowns
    pub struct StubProvider {
        name: String,
        checks: Vec<CheckDescriptor>,
        fail_setup: Option<String>,
        shutdowns: Arc<Mutex<Vec<String>>>,
    }

    impl StubProvider {
        pub fn new(name: impl Into<String>, checks: Vec<CheckDescriptor>) -> Self {
            Self {
                name: name.into(),
                checks,
                fail_setup: None,
                shutdowns: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn failing_setup(mut self, reason: impl Into<String>) -> Self {
            self.fail_setup = Some(reason.into());
            self
        }

        /// Share a shutdown log across providers to assert call order
        pub fn with_shutdown_log(mut self, log: Arc<Mutex<Vec<String>>>) -> Self {
            self.shutdowns = log;
            self
        }

        pub fn shutdown_log(&self) -> Arc<Mutex<Vec<String>>> {
            Arc::clone(&self.shutdowns)
        }
    }

    impl Provider for StubProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn setup(&self, ctx: &mut SetupContext<'_>) -> Result<(), ProviderError> {
            if let Some(reason) = &self.fail_setup {
                return Err(ProviderError::Setup(reason.clone()));
            }
            for descriptor in &self.checks {
                ctx.add_check(descriptor.clone());
            }
            Ok(())
        }

        fn shutdown(&self, _ctx: &ShutdownContext<'_>) -> Result<(), ProviderError> {
            self.shutdowns.lock().unwrap().push(self.name.clone());
            Ok(())
        }
    }
}
