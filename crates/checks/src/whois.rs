// WHOIS client - registration expiry lookup over TCP port 43

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

pub const IANA_WHOIS_SERVER: &str = "whois.iana.org";
pub const WHOIS_PORT: u16 = 43;
pub const WHOIS_TIMEOUT: Duration = Duration::from_secs(10);
/// Responses are truncated past this many bytes (256 KiB)
pub const MAX_WHOIS_RESPONSE: u64 = 256 * 1024;

/// Fields that carry the expiration date, in lookup order
pub const EXPIRY_FIELDS: &[&str] = &[
    "Registry Expiry Date",
    "Registrar Registration Expiration Date",
    "Expiration Date",
    "Expiry Date",
    "paid-till",
    "expires",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WhoisError {
    /// Server unreachable, timed out or returned nothing usable
    #[error("whois lookup failed: {0}")]
    Lookup(String),

    /// Record was retrieved but carries no readable expiration
    #[error("Failed to parse expiration date: {0}")]
    Expiration(String),
}

/// Resolves the registration expiry of a domain
#[async_trait]
pub trait ExpiryLookup: Send + Sync {
    async fn expiry(&self, domain: &str) -> Result<DateTime<Utc>, WhoisError>;
}

/// WHOIS client that asks IANA for the registry server and then queries it
#[derive(Debug, Clone)]
pub struct WhoisClient {
    root_server: String,
    port: u16,
    timeout: Duration,
    max_response: u64,
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self {
            root_server: IANA_WHOIS_SERVER.to_string(),
            port: WHOIS_PORT,
            timeout: WHOIS_TIMEOUT,
            max_response: MAX_WHOIS_RESPONSE,
        }
    }
}

impl WhoisClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start lookups at another server (referrals use the same port)
    pub fn with_root_server(mut self, server: impl Into<String>, port: u16) -> Self {
        self.root_server = server.into();
        self.port = port;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_response(mut self, max_response: u64) -> Self {
        self.max_response = max_response;
        self
    }

    /// Raw WHOIS response for `domain`, following one IANA referral
    pub async fn lookup(&self, domain: &str) -> Result<String, WhoisError> {
        let root = self.query(&self.root_server, domain).await?;
        match parse_referral(&root) {
            Some(server) => {
                debug!(domain = %domain, server = %server, "Following whois referral");
                self.query(&server, domain).await
            }
            None => Ok(root),
        }
    }

    async fn query(&self, server: &str, domain: &str) -> Result<String, WhoisError> {
        let exchange = async {
            let mut stream = TcpStream::connect((server, self.port)).await?;
            stream.write_all(format!("{domain}\r\n").as_bytes()).await?;

            let mut raw = Vec::new();
            (&mut stream).take(self.max_response).read_to_end(&mut raw).await?;
            Ok::<_, std::io::Error>(raw)
        };

        let raw = timeout(self.timeout, exchange)
            .await
            .map_err(|_| WhoisError::Lookup(format!("{server}: timed out")))?
            .map_err(|e| WhoisError::Lookup(format!("{server}: {e}")))?;

        if raw.is_empty() {
            return Err(WhoisError::Lookup(format!("{server}: empty response")));
        }
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}

#[async_trait]
impl ExpiryLookup for WhoisClient {
    async fn expiry(&self, domain: &str) -> Result<DateTime<Utc>, WhoisError> {
        let raw = self.lookup(domain).await?;
        parse_expiration(&raw)
    }
}

/// Value of the first `key: value` line whose key matches `field` (case-insensitive)
fn field_value<'a>(raw: &'a str, field: &str) -> Option<&'a str> {
    raw.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        let value = value.trim();
        (key.trim().eq_ignore_ascii_case(field) && !value.is_empty()).then_some(value)
    })
}

/// WHOIS server named by an IANA `refer:` line
pub fn parse_referral(raw: &str) -> Option<String> {
    field_value(raw, "refer")
        .or_else(|| field_value(raw, "whois"))
        .map(str::to_string)
}

/// Expiration date from a WHOIS record
pub fn parse_expiration(raw: &str) -> Result<DateTime<Utc>, WhoisError> {
    let value = EXPIRY_FIELDS
        .iter()
        .find_map(|field| field_value(raw, field))
        .ok_or_else(|| WhoisError::Expiration("no expiration field in record".to_string()))?;

    parse_date(value).ok_or_else(|| WhoisError::Expiration(format!("unrecognized date {value:?}")))
}

fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    const DATE_TIMES: &[&str] = &["%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%d %H:%M:%S", "%Y.%m.%d %H:%M:%S"];
    for format in DATE_TIMES {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc());
        }
    }

    const DATES: &[&str] = &["%Y-%m-%d", "%Y.%m.%d", "%d-%b-%Y", "%d.%m.%Y"];
    for format in DATES {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, format) {
            return parsed.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tokio::net::TcpListener;

    const IANA_COM: &str = "\
% IANA WHOIS server
domain:       COM

organisation: VeriSign Global Registry Services
refer:        whois.verisign-grs.com
";

    const VERISIGN_RECORD: &str = "\
   Domain Name: EXAMPLE.COM
   Registry Domain ID: 2336799_DOMAIN_COM-VRSN
   Registrar WHOIS Server: whois.iana.org
   Updated Date: 2024-08-14T07:01:34Z
   Creation Date: 1995-08-14T04:00:00Z
   Registry Expiry Date: 2025-08-13T04:00:00Z
";

    #[test]
    fn test_referral() {
        assert_eq!(
            parse_referral(IANA_COM).as_deref(),
            Some("whois.verisign-grs.com")
        );
        assert_eq!(parse_referral("% no match"), None);
    }

    #[test]
    fn test_registry_expiry_date() {
        assert_eq!(
            parse_expiration(VERISIGN_RECORD).unwrap(),
            Utc.with_ymd_and_hms(2025, 8, 13, 4, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_other_expiry_fields() {
        assert_eq!(
            parse_expiration("paid-till: 2026-02-01T21:00:00Z\n").unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 1, 21, 0, 0).unwrap()
        );
        assert_eq!(
            parse_expiration("Expiry Date: 05-Mar-2027\n").unwrap(),
            Utc.with_ymd_and_hms(2027, 3, 5, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_expiration("expires: 2025-11-30\n").unwrap(),
            Utc.with_ymd_and_hms(2025, 11, 30, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_missing_or_unreadable_expiration() {
        assert!(matches!(
            parse_expiration("Domain Name: EXAMPLE.COM\n"),
            Err(WhoisError::Expiration(_))
        ));
        assert!(matches!(
            parse_expiration("Registry Expiry Date: someday\n"),
            Err(WhoisError::Expiration(_))
        ));
    }

    /// Serve one canned response per accepted connection, recording queries
    async fn serve(responses: Vec<&'static str>) -> (u16, tokio::task::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            let mut queries = Vec::new();
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 256];
                let n = socket.read(&mut buf).await.unwrap();
                queries.push(String::from_utf8_lossy(&buf[..n]).into_owned());
                socket.write_all(response.as_bytes()).await.unwrap();
            }
            queries
        });
        (port, handle)
    }

    #[tokio::test]
    async fn test_lookup_follows_referral() {
        let (port, server) = serve(vec!["refer: 127.0.0.1\n", VERISIGN_RECORD]).await;
        let client = WhoisClient::new().with_root_server("127.0.0.1", port);

        let expiry = client.expiry("example.com").await.unwrap();

        assert_eq!(expiry, Utc.with_ymd_and_hms(2025, 8, 13, 4, 0, 0).unwrap());
        assert_eq!(
            server.await.unwrap(),
            vec!["example.com\r\n", "example.com\r\n"]
        );
    }

    #[tokio::test]
    async fn test_record_without_referral_is_used_directly() {
        let (port, _server) = serve(vec![VERISIGN_RECORD]).await;
        let client = WhoisClient::new().with_root_server("127.0.0.1", port);

        let raw = client.lookup("example.com").await.unwrap();
        assert!(raw.contains("Registry Expiry Date"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_lookup_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = WhoisClient::new()
            .with_root_server("127.0.0.1", port)
            .with_timeout(Duration::from_millis(500));

        let err = client.expiry("example.com").await.unwrap_err();
        assert!(matches!(err, WhoisError::Lookup(_)));
    }

    #[tokio::test]
    async fn test_endless_response_is_truncated() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let chunk = [b'%'; 512];
            while socket.write_all(&chunk).await.is_ok() {}
        });

        let client = WhoisClient::new()
            .with_root_server("127.0.0.1", port)
            .with_timeout(Duration::from_secs(2))
            .with_max_response(1024);

        let raw = client.lookup("example.com").await.unwrap();
        assert_eq!(raw.len(), 1024);
    }
}
