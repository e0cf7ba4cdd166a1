// Vigil Infrastructure - Filesystem Adapters
// Implements: configuration loading, ProviderSource over a providers directory

pub mod config;
pub mod provider_dir;

pub use config::{load_config, parse_config, ConfigError};
pub use provider_dir::{DirectoryProviderSource, ProviderCatalog, ProviderManifest, MANIFEST_FILE};
