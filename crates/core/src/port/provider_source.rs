// Provider Source Port
// Discovery of provider units; how their code is materialized is up to the adapter

use crate::port::provider::{Provider, ProviderFactory};
use std::sync::Arc;
use thiserror::Error;

/// Provider discovery errors. Any of these aborts startup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("cannot enumerate providers in {location}: {reason}")]
    Discovery { location: String, reason: String },

    #[error("cannot materialize provider at {location}: {reason}")]
    Materialize { location: String, reason: String },

    #[error("provider at {location} must declare its name as a string")]
    InvalidName { location: String },

    #[error("provider at {location} does not expose the setup/shutdown lifecycle: {reason}")]
    InvalidShape { location: String, reason: String },
}

/// Ordered source of providers
///
/// The returned order is the load order, and therefore decides which provider
/// wins a check key conflict.
pub trait ProviderSource: Send + Sync {
    /// Human readable location, used in logs
    fn describe(&self) -> String;

    fn discover(&self) -> Result<Vec<Box<dyn Provider>>, LoadError>;
}

/// Fixed, compiled-in list of providers
#[derive(Clone, Default)]
pub struct StaticProviderSource {
    factories: Vec<ProviderFactory>,
}

impl StaticProviderSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<F, P>(mut self, factory: F) -> Self
    where
        F: Fn() -> P + Send + Sync + 'static,
        P: Provider + 'static,
    {
        self.factories
            .push(Arc::new(move || Box::new(factory()) as Box<dyn Provider>));
        self
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl ProviderSource for StaticProviderSource {
    fn describe(&self) -> String {
        format!("built-in ({} providers)", self.factories.len())
    }

    fn discover(&self) -> Result<Vec<Box<dyn Provider>>, LoadError> {
        Ok(self.factories.iter().map(|factory| factory()).collect())
    }
}

/// Source that always fails; lets tests exercise the startup abort path
pub struct FailingProviderSource {
    error: LoadError,
}

impl FailingProviderSource {
    pub fn new(error: LoadError) -> Self {
        Self { error }
    }
}

impl ProviderSource for FailingProviderSource {
    fn describe(&self) -> String {
        "failing source".to_string()
    }

    fn discover(&self) -> Result<Vec<Box<dyn Provider>>, LoadError> {
        Err(self.error.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::provider::mocks::StubProvider;

    #[test]
    fn test_static_source_preserves_order() {
        let source = StaticProviderSource::new()
            .with(|| StubProvider::new("first", vec![]))
            .with(|| StubProvider::new("second", vec![]))
            .with(|| StubProvider::new("third", vec![]));

        let names: Vec<String> = source
            .discover()
            .unwrap()
            .iter()
            .map(|p| p.name().to_string())
            .collect();

        assert_eq!(names, vec!["first", "second", "third"]);
        assert_eq!(source.len(), 3);
    }

    #[test]
    fn test_failing_source_reports_error() {
        let source = FailingProviderSource::new(LoadError::InvalidName {
            location: "providers/broken".to_string(),
        });

        let err = source.discover().err().unwrap();
        assert!(err.to_string().contains("providers/broken"));
    }
}
