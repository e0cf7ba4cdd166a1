// HTTP check - expects a status code from a target URL, tolerating short outages

use crate::args::{arg_or, duration_arg, int_arg, require_duration, require_int_in, with_scheme};
use crate::streak::FailureStreak;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use vigil_core::domain::{CheckArgs, CheckResult, Severity};
use vigil_core::port::{ArgsError, Check, CheckDescriptor};

pub const HTTP_CHECK_KEY: &str = "http";
pub const HTTP_CHECK_NAME: &str = "Http Check";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Request could not be completed (DNS, connect, TLS, timeout)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Sends a body-less request and reports the response status
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        timeout: Duration,
    ) -> Result<u16, TransportError>;
}

/// Production transport backed by reqwest
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        timeout: Duration,
    ) -> Result<u16, TransportError> {
        let request = match method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        };

        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| TransportError(e.to_string()))?;
        let status = response.status().as_u16();

        // Drain the body so the connection can be reused
        let _ = response.bytes().await;
        Ok(status)
    }
}

/// Parsed runtime arguments of the HTTP check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpArgs {
    pub method: HttpMethod,
    pub success_code: u16,
    pub retries: u32,
    pub timeout: Duration,
}

impl HttpArgs {
    pub fn parse(args: &CheckArgs) -> Result<Self, ArgsError> {
        let raw_method = arg_or(args, "method", "GET");
        let method = HttpMethod::parse(raw_method)
            .ok_or_else(|| ArgsError::new(format!("unsupported method {raw_method:?}")))?;

        Ok(Self {
            method,
            success_code: int_arg(args, "success_code", "200")?,
            retries: int_arg(args, "retries", "3")?,
            timeout: duration_arg(args, "timeout", "5s")?,
        })
    }
}

/// Argument validator registered with the check
pub fn validate_http_args(args: &CheckArgs) -> Result<(), ArgsError> {
    if let Some(method) = args.get("method") {
        if HttpMethod::parse(method).is_none() {
            return Err(ArgsError::new("method must be GET or POST"));
        }
    }
    require_int_in(args, "success_code", 100, 599)?;
    require_int_in(args, "retries", 1, 10)?;
    require_duration(args, "timeout")
}

/// Stateful HTTP check; one instance per job
pub struct HttpCheck {
    transport: Arc<dyn HttpTransport>,
    streak: FailureStreak,
}

impl HttpCheck {
    pub fn new() -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new()))
    }

    pub fn with_transport(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            transport,
            streak: FailureStreak::new(),
        }
    }

    /// Consecutive failures seen so far
    pub fn failures(&self) -> u32 {
        self.streak.count()
    }
}

impl Default for HttpCheck {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Check for HttpCheck {
    async fn run(&self, target: &str, args: &CheckArgs) -> CheckResult {
        let parsed = match HttpArgs::parse(args) {
            Ok(parsed) => parsed,
            Err(e) => {
                self.streak.record_other();
                return CheckResult::failure(Severity::Fatal, e.to_string());
            }
        };

        let url = with_scheme(target);
        debug!(url = %url, method = parsed.method.as_str(), "Sending HTTP probe");

        match self.transport.send(parsed.method, &url, parsed.timeout).await {
            Err(e) => CheckResult::failure(self.streak.record_failure(parsed.retries), e.0),
            Ok(status) if status != parsed.success_code => CheckResult::failure(
                self.streak.record_failure(parsed.retries),
                format!("status code is not as expected: {status}"),
            ),
            Ok(_) => {
                self.streak.reset();
                CheckResult::ok()
            }
        }
    }
}

/// Descriptor registered by the standard provider
pub fn http_descriptor() -> CheckDescriptor {
    CheckDescriptor::new(HTTP_CHECK_KEY, HTTP_CHECK_NAME, HttpCheck::new)
        .with_validator(validate_http_args)
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Transport replaying canned outcomes and recording requests
    pub struct ScriptedTransport {
        script: Mutex<VecDeque<Result<u16, TransportError>>>,
        requests: Mutex<Vec<(HttpMethod, String, Duration)>>,
    }

    impl ScriptedTransport {
        pub fn new(script: Vec<Result<u16, TransportError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn requests(&self) -> Vec<(HttpMethod, String, Duration)> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(
            &self,
            method: HttpMethod,
            url: &str,
            timeout: Duration,
        ) -> Result<u16, TransportError> {
            self.requests
                .lock()
                .unwrap()
                .push((method, url.to_string(), timeout));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError("script exhausted".to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::ScriptedTransport;
    use super::*;

    fn args(pairs: &[(&str, &str)]) -> CheckArgs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn refused() -> Result<u16, TransportError> {
        Err(TransportError("connection refused".to_string()))
    }

    #[tokio::test]
    async fn test_three_retries_then_error() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            refused(),
            Ok(503),
            refused(),
            refused(),
            Ok(200),
            refused(),
        ]));
        let check = HttpCheck::with_transport(transport.clone());
        let args = args(&[("retries", "3")]);

        let mut severities = Vec::new();
        for _ in 0..4 {
            let result = check.run("example.com", &args).await;
            assert!(!result.success);
            severities.push(result.severity);
        }
        assert_eq!(
            severities,
            vec![Severity::Debug, Severity::Debug, Severity::Debug, Severity::Error]
        );

        // Success resets the streak
        assert!(check.run("example.com", &args).await.success);
        assert_eq!(check.failures(), 0);
        assert_eq!(check.run("example.com", &args).await.severity, Severity::Debug);
    }

    #[tokio::test]
    async fn test_status_mismatch_message() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(404)]));
        let check = HttpCheck::with_transport(transport);

        let result = check.run("example.com", &CheckArgs::new()).await;
        assert_eq!(result.message, "status code is not as expected: 404");
        assert_eq!(result.severity, Severity::Debug);
    }

    #[tokio::test]
    async fn test_custom_success_code_and_defaults() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(204), Ok(200)]));
        let check = HttpCheck::with_transport(transport.clone());

        let custom = args(&[("success_code", "204"), ("method", "POST"), ("timeout", "2s")]);
        assert!(check.run("http://example.com/ping", &custom).await.success);
        assert!(check.run("example.com", &CheckArgs::new()).await.success);

        let requests = transport.requests();
        assert_eq!(
            requests[0],
            (
                HttpMethod::Post,
                "http://example.com/ping".to_string(),
                Duration::from_secs(2)
            )
        );
        assert_eq!(
            requests[1],
            (HttpMethod::Get, "https://example.com".to_string(), Duration::from_secs(5))
        );
    }

    #[tokio::test]
    async fn test_bad_runtime_args_are_fatal() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let check = HttpCheck::with_transport(transport.clone());

        let result = check.run("example.com", &args(&[("retries", "many")])).await;
        assert_eq!(result.severity, Severity::Fatal);
        assert!(transport.requests().is_empty());
        // Argument failures still count towards the streak
        assert_eq!(check.failures(), 1);
    }

    #[test]
    fn test_validator() {
        assert!(validate_http_args(&args(&[
            ("method", "POST"),
            ("success_code", "301"),
            ("retries", "5"),
            ("timeout", "10s")
        ]))
        .is_ok());

        let cases = [
            (("method", "PUT"), "method must be GET or POST"),
            (("success_code", "600"), "success_code must be between 100 and 599"),
            (("success_code", "ok"), "success_code must be a number"),
            (("retries", "11"), "retries must be between 1 and 10"),
            (("timeout", "fast"), "timeout must be a duration"),
        ];
        for ((key, value), expected) in cases {
            let err = validate_http_args(&args(&[(key, value)])).unwrap_err();
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn test_descriptor() {
        let descriptor = http_descriptor();
        assert_eq!(descriptor.key(), "http");
        assert_eq!(descriptor.display_name(), "Http Check");
        assert!(descriptor.has_validator());
    }
}
