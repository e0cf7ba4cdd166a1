// Domain check - registration expiry from WHOIS

use crate::args::host_of;
use crate::expiry::{validate_expiry_args, ExpiryPolicy};
use crate::whois::{ExpiryLookup, WhoisClient, WhoisError};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use vigil_core::domain::{CheckArgs, CheckResult, Severity};
use vigil_core::port::{Check, CheckDescriptor, SystemTimeProvider, TimeProvider};

pub const DNS_CHECK_KEY: &str = "dns";
pub const DNS_CHECK_NAME: &str = "Domain Check";

pub struct DomainCheck {
    lookup: Arc<dyn ExpiryLookup>,
    clock: Arc<dyn TimeProvider>,
}

impl DomainCheck {
    pub fn new() -> Self {
        Self::with_lookup(Arc::new(WhoisClient::new()), Arc::new(SystemTimeProvider))
    }

    pub fn with_lookup(lookup: Arc<dyn ExpiryLookup>, clock: Arc<dyn TimeProvider>) -> Self {
        Self { lookup, clock }
    }
}

impl Default for DomainCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Check for DomainCheck {
    async fn run(&self, target: &str, args: &CheckArgs) -> CheckResult {
        let policy = match ExpiryPolicy::from_args(args) {
            Ok(policy) => policy,
            Err(e) => return CheckResult::failure(Severity::Fatal, e.to_string()),
        };

        let domain = host_of(target);
        if domain.is_empty() {
            return CheckResult::failure(Severity::Fatal, format!("no domain in target {target:?}"));
        }

        match self.lookup.expiry(domain).await {
            Ok(expires_at) => {
                debug!(domain = %domain, expires_at = %expires_at, "Registration expiry read");
                policy.classify("Domain", expires_at, self.clock.now())
            }
            Err(e @ WhoisError::Lookup(_)) => CheckResult::failure(Severity::Down, e.to_string()),
            Err(e @ WhoisError::Expiration(_)) => {
                CheckResult::failure(Severity::Error, e.to_string())
            }
        }
    }
}

pub fn dns_descriptor() -> CheckDescriptor {
    CheckDescriptor::new(DNS_CHECK_KEY, DNS_CHECK_NAME, DomainCheck::new)
        .with_validator(validate_expiry_args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use vigil_core::port::time_provider::mocks::ManualClock;

    struct FixedLookup(Result<DateTime<Utc>, WhoisError>);

    #[async_trait]
    impl ExpiryLookup for FixedLookup {
        async fn expiry(&self, _domain: &str) -> Result<DateTime<Utc>, WhoisError> {
            self.0.clone()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 29, 6, 30, 0).unwrap()
    }

    fn check(outcome: Result<DateTime<Utc>, WhoisError>) -> DomainCheck {
        DomainCheck::with_lookup(
            Arc::new(FixedLookup(outcome)),
            Arc::new(ManualClock::new(now())),
        )
    }

    #[tokio::test]
    async fn test_expiry_tiers() {
        let hours = |n| now() + chrono::Duration::hours(n);

        let expired = check(Ok(hours(-1))).run("example.com", &CheckArgs::new()).await;
        assert_eq!(expired.severity, Severity::Down);
        assert!(expired.message.starts_with("Domain is not valid anymore"));

        let error = check(Ok(hours(100))).run("example.com", &CheckArgs::new()).await;
        assert_eq!(error.severity, Severity::Error);

        let warning = check(Ok(hours(500))).run("example.com", &CheckArgs::new()).await;
        assert_eq!(warning.severity, Severity::Warning);

        assert!(check(Ok(hours(1000))).run("example.com", &CheckArgs::new()).await.success);
    }

    #[tokio::test]
    async fn test_custom_windows() {
        let mut args = CheckArgs::new();
        args.insert("notify_after".to_string(), "2000h".to_string());

        let result = check(Ok(now() + chrono::Duration::hours(1000)))
            .run("example.com", &args)
            .await;
        assert_eq!(result.severity, Severity::Warning);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_down() {
        let result = check(Err(WhoisError::Lookup("timed out".into())))
            .run("example.com", &CheckArgs::new())
            .await;
        assert_eq!(result.severity, Severity::Down);
    }

    #[tokio::test]
    async fn test_unparseable_expiration_is_error() {
        let result = check(Err(WhoisError::Expiration("unrecognized date".into())))
            .run("example.com", &CheckArgs::new())
            .await;
        assert_eq!(result.severity, Severity::Error);
        assert!(result.message.starts_with("Failed to parse expiration date"));
    }

    #[test]
    fn test_descriptor() {
        let descriptor = dns_descriptor();
        assert_eq!(descriptor.key(), "dns");
        assert_eq!(descriptor.display_name(), "Domain Check");
        assert!(descriptor
            .validate_args(&[("error_after".to_string(), "1w".to_string())].into())
            .is_err());
    }
}
