//! Composition root: provider discovery, registry, jobs and the scheduler

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use vigil_checks::provider::{StdProvider, STD_PROVIDER_KIND};
use vigil_core::application::{
    load_providers, materialize_jobs, run_shutdown, setup_all, shutdown_channel, validate_config,
    LoadedProvider, Registry, RegistryBuilder, Scheduler, SchedulerOutcome, ShutdownToken,
};
use vigil_core::domain::{CheckArgs, CheckResult, TargetConfig};
use vigil_core::port::{
    Check, ProviderSource, StaticProviderSource, SystemTimeProvider, TimeProvider,
    UuidProvider,
};
use vigil_infra_fs::{load_config, DirectoryProviderSource, ProviderCatalog, ProviderManifest};

use crate::signals::wait_for_signal;

/// Provider implementations that a manifest can name
pub fn catalog() -> ProviderCatalog {
    ProviderCatalog::new().with_kind(STD_PROVIDER_KIND, |manifest: &ProviderManifest| {
        StdProvider::named(manifest.name.clone())
    })
}

/// Directory source when `providers_dir` exists, otherwise the built-in provider
pub fn provider_source(providers_dir: &Path) -> Box<dyn ProviderSource> {
    if providers_dir.is_dir() {
        Box::new(DirectoryProviderSource::new(providers_dir, catalog()))
    } else {
        info!(
            path = %providers_dir.display(),
            "No providers directory, using built-in standard provider"
        );
        Box::new(StaticProviderSource::new().with(StdProvider::new))
    }
}

/// Loaded providers plus the sealed registry they populated
pub struct Engine {
    pub providers: Vec<LoadedProvider>,
    pub registry: Registry,
}

impl Engine {
    /// Load every provider and run its setup, in discovery order
    pub fn bootstrap(source: &dyn ProviderSource) -> Result<Self> {
        let providers =
            load_providers(source, &UuidProvider).context("Failed to load providers")?;

        let mut builder = RegistryBuilder::new();
        setup_all(&providers, &mut builder)?;
        let registry = builder.seal();

        for (namespace, keys) in registry.namespaces() {
            info!(provider = %namespace, checks = ?keys, "Checks registered");
        }
        if registry.is_empty() {
            warn!("No checks registered");
        }

        Ok(Self {
            providers,
            registry,
        })
    }

    /// Graceful-stop hook; failures are logged only
    pub fn shutdown(&self) {
        let failed = run_shutdown(&self.providers);
        if failed > 0 {
            warn!(failed, "Some providers failed to shut down");
        }
    }
}

/// `vigil run`: stops on SIGINT/SIGTERM or on the first Fatal result
pub async fn run(
    source: &dyn ProviderSource,
    targets: &[TargetConfig],
    tick_period: Duration,
) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = shutdown_channel();

    let signal_handle = tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(signal) => info!(signal, "Shutdown signal received. Exiting gracefully..."),
            Err(e) => warn!(error = %e, "Signal handler failed, stopping"),
        }
        shutdown_tx.shutdown();
    });

    let result = run_with(
        source,
        targets,
        tick_period,
        shutdown_rx,
        Arc::new(SystemTimeProvider),
    )
    .await;
    signal_handle.abort();
    result
}

/// Engine run with an injected stop token and clock
///
/// Provider shutdown hooks run after a graceful stop only. A Fatal result
/// returns an error without calling them.
pub async fn run_with(
    source: &dyn ProviderSource,
    targets: &[TargetConfig],
    tick_period: Duration,
    shutdown: ShutdownToken,
    time_provider: Arc<dyn TimeProvider>,
) -> Result<()> {
    let engine = Engine::bootstrap(source)?;

    let jobs = materialize_jobs(&engine.registry, targets, time_provider.as_ref())?;
    info!(jobs = jobs.len(), "Jobs created");

    let mut scheduler = Scheduler::new(jobs, time_provider).with_tick_period(tick_period);

    match scheduler.run(shutdown).await {
        SchedulerOutcome::Graceful => {
            engine.shutdown();
            info!("Shutdown complete.");
            Ok(())
        }
        SchedulerOutcome::Fatal(stop) => bail!(
            "check {} on {} reported a fatal result: {}",
            stop.check,
            stop.target,
            stop.message
        ),
    }
}

/// `vigil validate`: returns the number of jobs the configuration would create
pub fn validate(source: &dyn ProviderSource, config_path: &Path) -> Result<usize> {
    let engine = Engine::bootstrap(source)?;
    let targets = load_targets(config_path)?;
    Ok(validate_config(&engine.registry, &targets)?)
}

/// `vigil probe`: run one check once against one target
pub async fn probe(
    source: &dyn ProviderSource,
    check_key: &str,
    target: &str,
    args: CheckArgs,
) -> Result<CheckResult> {
    let engine = Engine::bootstrap(source)?;

    let Some(descriptor) = engine.registry.lookup(check_key) else {
        bail!(
            "unknown check {check_key:?} (registered: {})",
            engine.registry.keys().join(", ")
        );
    };
    descriptor
        .validate_args(&args)
        .with_context(|| format!("Invalid arguments for {}", descriptor.display_name()))?;

    let check = descriptor.instantiate();
    let result = check.run(target, &args).await;

    engine.shutdown();
    Ok(result)
}

/// Load the monitored targets; wraps the loader error with the path
pub fn load_targets(config_path: &Path) -> Result<Vec<TargetConfig>> {
    load_config(config_path)
        .with_context(|| format!("Failed to load config {}", config_path.display()))
}
