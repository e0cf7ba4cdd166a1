// Job Materializer - turns validated configuration into scheduled jobs

use crate::application::job::Job;
use crate::application::registry::Registry;
use crate::domain::TargetConfig;
use crate::error::{EngineError, Result};
use crate::port::TimeProvider;
use std::sync::Arc;
use tracing::{error, info};

/// Pre-flight validation of every configured check
///
/// Resolves each check key and runs the check's own argument validator. The
/// first problem anywhere in the configuration is returned; nothing is built.
/// Returns the number of validated (target, check) pairs.
pub fn validate_config(registry: &Registry, targets: &[TargetConfig]) -> Result<usize> {
    info!("Validate config...");

    let mut validated = 0;
    for target in targets {
        target.validate()?;

        for check_config in &target.checks {
            let descriptor = registry.lookup(&check_config.check_key).ok_or_else(|| {
                error!(
                    name = %check_config.check_key,
                    target = %target.target_id,
                    "Check not found"
                );
                EngineError::UnknownCheck {
                    key: check_config.check_key.clone(),
                    target: target.target_id.clone(),
                }
            })?;

            descriptor
                .validate_args(&check_config.args)
                .map_err(|source| {
                    error!(
                        name = %descriptor.display_name(),
                        target = %target.target_id,
                        error = %source,
                        "Check args validation failed"
                    );
                    EngineError::InvalidArgs {
                        key: check_config.check_key.clone(),
                        target: target.target_id.clone(),
                        source,
                    }
                })?;

            validated += 1;
        }
    }

    info!(checks = validated, "Config validated");
    Ok(validated)
}

/// Validate the whole configuration, then build one job per (target, check) pair
///
/// Jobs are returned in configuration order and are all due on the first tick.
pub fn materialize_jobs(
    registry: &Registry,
    targets: &[TargetConfig],
    time_provider: &dyn TimeProvider,
) -> Result<Vec<Job>> {
    validate_config(registry, targets)?;

    let now = time_provider.now();
    let mut jobs = Vec::new();
    for target in targets {
        let shared = Arc::new(target.clone());

        for check_config in &target.checks {
            let descriptor =
                registry
                    .lookup(&check_config.check_key)
                    .ok_or_else(|| EngineError::UnknownCheck {
                        key: check_config.check_key.clone(),
                        target: target.target_id.clone(),
                    })?;

            info!(
                name = %descriptor.display_name(),
                target = %target.target_id,
                args = ?check_config.args,
                "Adding job"
            );
            jobs.push(Job::new(
                Arc::clone(&shared),
                check_config.clone(),
                descriptor.clone(),
                now,
            ));
        }
    }

    Ok(jobs)
}
