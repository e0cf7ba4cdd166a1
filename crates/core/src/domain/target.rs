// Monitored targets and the checks configured against them

use crate::domain::error::{DomainError, Result};
use std::collections::BTreeMap;
use std::time::Duration;

/// Free-form check arguments, keyed by argument name
pub type CheckArgs = BTreeMap<String, String>;

/// One configured check against a target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckConfig {
    /// Key of a registered check
    pub check_key: String,
    /// Per-check interval override; zero means "not set"
    pub interval: Option<Duration>,
    pub args: CheckArgs,
}

impl CheckConfig {
    pub fn new(check_key: impl Into<String>) -> Self {
        Self {
            check_key: check_key.into(),
            interval: None,
            args: CheckArgs::new(),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }
}

/// A monitored domain or endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetConfig {
    pub target_id: String,
    /// Interval used by checks that do not set their own
    pub default_interval: Option<Duration>,
    /// Checks in configuration order
    pub checks: Vec<CheckConfig>,
}

impl TargetConfig {
    pub fn new(target_id: impl Into<String>) -> Self {
        Self {
            target_id: target_id.into(),
            default_interval: None,
            checks: Vec::new(),
        }
    }

    pub fn with_default_interval(mut self, interval: Duration) -> Self {
        self.default_interval = Some(interval);
        self
    }

    pub fn with_check(mut self, check: CheckConfig) -> Self {
        self.checks.push(check);
        self
    }

    /// Structural checks that do not need the registry
    pub fn validate(&self) -> Result<()> {
        if self.target_id.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "target id cannot be empty".to_string(),
            ));
        }
        if let Some(check) = self.checks.iter().find(|c| c.check_key.trim().is_empty()) {
            return Err(DomainError::ValidationError(format!(
                "check key cannot be empty (target {}, args {:?})",
                self.target_id, check.args
            )));
        }
        Ok(())
    }
}
