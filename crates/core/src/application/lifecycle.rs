// Provider Lifecycle - load, setup and shutdown of providers

use crate::application::registry::RegistryBuilder;
use crate::error::{EngineError, Result};
use crate::port::{
    IdProvider, LoadError, Provider, ProviderSource, SetupContext, ShutdownContext,
};
use tracing::{error, info};

/// A discovered provider with its load-time id
pub struct LoadedProvider {
    id: String,
    provider: Box<dyn Provider>,
}

impl LoadedProvider {
    pub fn new(id: impl Into<String>, provider: Box<dyn Provider>) -> Self {
        Self {
            id: id.into(),
            provider,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.provider.name()
    }
}

impl std::fmt::Debug for LoadedProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedProvider")
            .field("id", &self.id)
            .field("name", &self.provider.name())
            .finish()
    }
}

/// Discover providers and assign each an opaque id
///
/// Discovery order is kept: it decides which provider wins a check key conflict.
/// Any failure aborts the whole load; there is no partial provider set.
pub fn load_providers(
    source: &dyn ProviderSource,
    ids: &dyn IdProvider,
) -> std::result::Result<Vec<LoadedProvider>, LoadError> {
    info!(source = %source.describe(), "Loading providers...");

    let providers: Vec<LoadedProvider> = source
        .discover()?
        .into_iter()
        .map(|provider| {
            let loaded = LoadedProvider::new(ids.generate_id(), provider);
            info!(name = %loaded.name(), id = %loaded.id(), "Provider discovered");
            loaded
        })
        .collect();

    info!(count = providers.len(), "Providers loaded");
    Ok(providers)
}

/// Run one provider's setup against the registry
///
/// Returns how many of its checks were accepted (conflicting keys are dropped).
pub fn run_setup(provider: &LoadedProvider, registry: &mut RegistryBuilder) -> Result<usize> {
    info!(name = %provider.name(), "Loading plugin");

    let before = registry.len();
    let mut ctx = SetupContext::new(&provider.id, registry);
    provider
        .provider
        .setup(&mut ctx)
        .map_err(|source| EngineError::ProviderSetup {
            name: provider.name().to_string(),
            source,
        })?;

    let accepted = registry.len() - before;
    info!(name = %provider.name(), checks = accepted, "Plugin loaded");
    Ok(accepted)
}

/// Set up every provider in load order; stops at the first failure
pub fn setup_all(providers: &[LoadedProvider], registry: &mut RegistryBuilder) -> Result<()> {
    for provider in providers {
        run_setup(provider, registry)?;
    }
    Ok(())
}

/// Invoke every provider's shutdown hook once, in load order
///
/// Failures are logged and do not stop the remaining hooks. Returns the number
/// of hooks that failed.
pub fn run_shutdown(providers: &[LoadedProvider]) -> usize {
    let mut failed = 0;
    for provider in providers {
        let ctx = ShutdownContext::new(&provider.id);
        match provider.provider.shutdown(&ctx) {
            Ok(()) => info!(name = %provider.name(), "Provider shut down"),
            Err(e) => {
                failed += 1;
                error!(name = %provider.name(), error = %e, "Provider shutdown failed");
            }
        }
    }
    failed
}
