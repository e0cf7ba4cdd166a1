// Standard provider - registers the built-in http, ssl and dns checks

use crate::dns::dns_descriptor;
use crate::http::http_descriptor;
use crate::ssl::ssl_descriptor;
use tracing::info;
use vigil_core::port::{Provider, ProviderError, SetupContext, ShutdownContext};

/// Catalog kind under which the standard provider is published
pub const STD_PROVIDER_KIND: &str = "std";
pub const STD_PROVIDER_NAME: &str = "Vigil Standard Provider";

#[derive(Debug, Clone)]
pub struct StdProvider {
    name: String,
}

impl StdProvider {
    pub fn new() -> Self {
        Self::named(STD_PROVIDER_NAME)
    }

    /// Same checks under a manifest-declared name
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for StdProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider for StdProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn setup(&self, ctx: &mut SetupContext<'_>) -> Result<(), ProviderError> {
        ctx.add_check(http_descriptor());
        ctx.add_check(ssl_descriptor());
        ctx.add_check(dns_descriptor());
        Ok(())
    }

    fn shutdown(&self, ctx: &ShutdownContext<'_>) -> Result<(), ProviderError> {
        info!(name = %self.name, id = %ctx.provider_id(), "Standard provider stopped");
        Ok(())
    }
}
