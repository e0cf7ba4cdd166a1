// Check Port
// Contract every pluggable check satisfies, plus the descriptor the registry stores

use crate::domain::{CheckArgs, CheckResult};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// A runnable probe.
///
/// Implementations may keep internal state across invocations (the HTTP check
/// keeps a failure streak). The engine creates one instance per job, so that
/// state never leaks between targets. `run` is expected to bound its own I/O;
/// the scheduler waits for it unconditionally.
#[async_trait]
pub trait Check: Send + Sync {
    async fn run(&self, target: &str, args: &CheckArgs) -> CheckResult;
}

/// Rejection reported by a check's argument validator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ArgsError(String);

impl ArgsError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Builds a fresh check instance
pub type CheckFactory = Arc<dyn Fn() -> Box<dyn Check> + Send + Sync>;

/// Validates configured arguments before any job runs
pub type ArgsValidator = Arc<dyn Fn(&CheckArgs) -> Result<(), ArgsError> + Send + Sync>;

/// Registered check: identity plus the capabilities to instantiate and validate it
#[derive(Clone)]
pub struct CheckDescriptor {
    key: String,
    display_name: String,
    factory: CheckFactory,
    validator: Option<ArgsValidator>,
}

impl CheckDescriptor {
    /// Create a descriptor whose instances are produced by `factory`
    ///
    /// # Example
    /// ```text
    /// let descriptor = CheckDescriptor::new("http", "Http Check", HttpCheck::new)
    ///     .with_validator(validate_http_args);
    /// ```
    pub fn new<F, C>(key: impl Into<String>, display_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: Check + 'static,
    {
        Self {
            key: key.into(),
            display_name: display_name.into(),
            factory: Arc::new(move || Box::new(factory()) as Box<dyn Check>),
            validator: None,
        }
    }

    pub fn with_validator<V>(mut self, validator: V) -> Self
    where
        V: Fn(&CheckArgs) -> Result<(), ArgsError> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn has_validator(&self) -> bool {
        self.validator.is_some()
    }

    /// Run the declared validator; checks without one accept any arguments
    pub fn validate_args(&self, args: &CheckArgs) -> Result<(), ArgsError> {
        match &self.validator {
            Some(validator) => validator(args),
            None => Ok(()),
        }
    }

    /// Create a new, independent check instance
    pub fn instantiate(&self) -> Box<dyn Check> {
        (self.factory)()
    }
}

impl fmt::Debug for CheckDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckDescriptor")
            .field("key", &self.key)
            .field("display_name", &self.display_name)
            .field("has_validator", &self.validator.is_some())
            .finish()
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::Severity;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Shared record of `(check label, target)` invocations, in call order
    #[derive(Clone, Default)]
    pub struct CallLog {
        calls: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl CallLog {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn record(&self, label: &str, target: &str) {
            self.calls
                .lock()
                .unwrap()
                .push((label.to_string(), target.to_string()));
        }

        pub fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }

        pub fn count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    /// Check that replays a fixed script of results, then repeats the last one
    pub struct ScriptedCheck {
        label: String,
        script: Mutex<VecDeque<CheckResult>>,
        last: Mutex<CheckResult>,
        log: CallLog,
    }

    impl ScriptedCheck {
        pub fn new(label: impl Into<String>, script: Vec<CheckResult>, log: CallLog) -> Self {
            Self {
                label: label.into(),
                script: Mutex::new(script.into()),
                last: Mutex::new(CheckResult::ok()),
                log,
            }
        }

        pub fn passing(label: impl Into<String>, log: CallLog) -> Self {
            Self::new(label, Vec::new(), log)
        }

        pub fn failing(label: impl Into<String>, severity: Severity, log: CallLog) -> Self {
            Self::new(
                label,
                vec![CheckResult::failure(severity, "scripted failure")],
                log,
            )
        }
    }

    #[async_trait]
    impl Check for ScriptedCheck {
        async fn run(&self, target: &str, _args: &CheckArgs) -> CheckResult {
            self.log.record(&self.label, target);

            let next = self.script.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            if let Some(result) = next {
                *last = result;
            }
            last.clone()
        }
    }

    /// Descriptor whose instances always pass and record calls into `log`
    pub fn passing_descriptor(key: &str, log: CallLog) -> CheckDescriptor {
        let label = key.to_string();
        CheckDescriptor::new(key, format!("{key} check"), move || {
            ScriptedCheck::passing(label.clone(), log.clone())
        })
    }

    /// Descriptor whose instances always fail with `severity`
    pub fn failing_descriptor(key: &str, severity: Severity, log: CallLog) -> CheckDescriptor {
        let label = key.to_string();
        CheckDescriptor::new(key, format!("{key} check"), move || {
            ScriptedCheck::failing(label.clone(), severity, log.clone())
        })
    }
}
