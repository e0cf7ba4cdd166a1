// Central Error Type for the Engine

use crate::port::{ArgsError, LoadError, ProviderError};
use thiserror::Error;

/// Engine-level error type. Every variant is fatal to startup.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Provider load error: {0}")]
    Load(#[from] LoadError),

    #[error("Provider {name} {source}")]
    ProviderSetup {
        name: String,
        #[source]
        source: ProviderError,
    },

    #[error("Check not found: {key} (target {target})")]
    UnknownCheck { key: String, target: String },

    #[error("Invalid args for check {key} (target {target}): {source}")]
    InvalidArgs {
        key: String,
        target: String,
        #[source]
        source: ArgsError,
    },
}

/// Result type alias using EngineError
pub type Result<T> = std::result::Result<T, EngineError>;
