// SSL check - TLS certificate expiry of a target host

use crate::args::host_of;
use crate::expiry::{validate_expiry_args, ExpiryPolicy};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::rustls::crypto::ring;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;
use tracing::debug;
use vigil_core::domain::{CheckArgs, CheckResult, Severity};
use vigil_core::port::{Check, CheckDescriptor, SystemTimeProvider, TimeProvider};

pub const SSL_CHECK_KEY: &str = "ssl";
pub const SSL_CHECK_NAME: &str = "Ssl Check";

const HTTPS_PORT: u16 = 443;
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CertificateError {
    /// TCP connect or TLS handshake failed
    #[error("{0}")]
    Connect(String),

    #[error("No certificates found")]
    Missing,

    #[error("cannot parse peer certificate: {0}")]
    Parse(String),
}

/// Reads the `notAfter` of the certificate a host presents
#[async_trait]
pub trait CertificateProbe: Send + Sync {
    async fn expires_at(&self, host: &str) -> Result<DateTime<Utc>, CertificateError>;
}

/// Probe that performs a verified TLS handshake on port 443 and nothing else
///
/// The connection is closed right after the handshake; no HTTP request is sent.
#[derive(Debug, Clone)]
pub struct TlsCertificateProbe {
    port: u16,
    timeout: Duration,
}

impl Default for TlsCertificateProbe {
    fn default() -> Self {
        Self {
            port: HTTPS_PORT,
            timeout: HANDSHAKE_TIMEOUT,
        }
    }
}

impl TlsCertificateProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn connector() -> Result<TlsConnector, CertificateError> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        let config = ClientConfig::builder_with_provider(Arc::new(ring::default_provider()))
            .with_safe_default_protocol_versions()
            .map_err(|e| CertificateError::Connect(e.to_string()))?
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(TlsConnector::from(Arc::new(config)))
    }
}

#[async_trait]
impl CertificateProbe for TlsCertificateProbe {
    async fn expires_at(&self, host: &str) -> Result<DateTime<Utc>, CertificateError> {
        let connector = Self::connector()?;
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| CertificateError::Connect(format!("{host}: {e}")))?;

        let handshake = async {
            let tcp = TcpStream::connect((host, self.port)).await?;
            connector.connect(server_name, tcp).await
        };

        let stream = timeout(self.timeout, handshake)
            .await
            .map_err(|_| CertificateError::Connect(format!("{host}: handshake timed out")))?
            .map_err(|e| CertificateError::Connect(e.to_string()))?;

        let (_, session) = stream.get_ref();
        let chain = session.peer_certificates().unwrap_or_default();
        earliest_not_after(chain.iter().map(|cert| &cert[..]))
    }
}

/// Earliest `notAfter` across a presented chain
///
/// A chain is only as valid as its shortest-lived certificate, intermediates
/// included.
pub fn earliest_not_after<'a>(
    chain: impl IntoIterator<Item = &'a [u8]>,
) -> Result<DateTime<Utc>, CertificateError> {
    let mut earliest: Option<DateTime<Utc>> = None;
    for der in chain {
        let expires_at = not_after(der)?;
        earliest = Some(earliest.map_or(expires_at, |e| e.min(expires_at)));
    }
    earliest.ok_or(CertificateError::Missing)
}

/// Certificate expiry check
pub struct SslCheck {
    probe: Arc<dyn CertificateProbe>,
    clock: Arc<dyn TimeProvider>,
}

impl SslCheck {
    pub fn new() -> Self {
        Self::with_probe(Arc::new(TlsCertificateProbe::new()), Arc::new(SystemTimeProvider))
    }

    pub fn with_probe(probe: Arc<dyn CertificateProbe>, clock: Arc<dyn TimeProvider>) -> Self {
        Self { probe, clock }
    }
}

impl Default for SslCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Check for SslCheck {
    async fn run(&self, target: &str, args: &CheckArgs) -> CheckResult {
        let policy = match ExpiryPolicy::from_args(args) {
            Ok(policy) => policy,
            Err(e) => return CheckResult::failure(Severity::Fatal, e.to_string()),
        };

        let host = host_of(target);
        if host.is_empty() {
            return CheckResult::failure(Severity::Fatal, format!("no host in target {target:?}"));
        }

        match self.probe.expires_at(host).await {
            Ok(expires_at) => {
                debug!(host = %host, expires_at = %expires_at, "Peer certificate read");
                policy.classify("Certificate", expires_at, self.clock.now())
            }
            Err(e) => CheckResult::failure(Severity::Down, e.to_string()),
        }
    }
}

pub fn ssl_descriptor() -> CheckDescriptor {
    CheckDescriptor::new(SSL_CHECK_KEY, SSL_CHECK_NAME, SslCheck::new)
        .with_validator(validate_expiry_args)
}
