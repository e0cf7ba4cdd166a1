// Vigil Core - Check registry, provider lifecycle and scheduling engine
// NO infrastructure dependencies: providers, config files and sinks are adapters

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{EngineError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
