// Vigil Standard Checks
// Implements: the "std" provider with http, ssl and dns checks

pub mod args;
pub mod dns;
pub mod expiry;
pub mod http;
pub mod provider;
pub mod ssl;
pub mod streak;
pub mod whois;

pub use dns::DomainCheck;
pub use http::HttpCheck;
pub use provider::{StdProvider, STD_PROVIDER_KIND};
pub use ssl::SslCheck;
