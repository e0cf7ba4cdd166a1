// YAML configuration loader
//
// domains:
//   - domain: example.com
//     interval: 5m
//     checks:
//       - key: http
//         interval: 30s
//         retries: 3

use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};
use vigil_core::domain::{parse_duration, CheckArgs, CheckConfig, TargetConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("domain {domain:?}: invalid interval {value:?}: {reason}")]
    InvalidInterval {
        domain: String,
        value: String,
        reason: String,
    },

    #[error("domain {domain:?}, check {check:?}: argument {arg:?} must be a scalar")]
    NestedArg {
        domain: String,
        check: String,
        arg: String,
    },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    domains: Vec<RawDomain>,
}

#[derive(Debug, Deserialize)]
struct RawDomain {
    domain: String,
    #[serde(default)]
    interval: Option<Value>,
    #[serde(default)]
    checks: Vec<RawCheck>,
}

#[derive(Debug, Deserialize)]
struct RawCheck {
    key: String,
    #[serde(default)]
    interval: Option<Value>,
    /// Every other key is a check argument
    #[serde(flatten)]
    args: BTreeMap<String, Value>,
}

/// Read and parse the configuration file at `path`
pub fn load_config(path: &Path) -> Result<Vec<TargetConfig>> {
    info!(path = %path.display(), "Loading config...");

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let targets = parse_config(&contents)?;

    info!(
        domains = targets.len(),
        checks = targets.iter().map(|t| t.checks.len()).sum::<usize>(),
        "Config loaded"
    );
    Ok(targets)
}

/// Parse configuration text into targets, keeping document order
pub fn parse_config(contents: &str) -> Result<Vec<TargetConfig>> {
    // An empty document has no domains
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    let raw: RawConfig = serde_yaml::from_str(contents)?;
    raw.domains.into_iter().map(convert_domain).collect()
}

fn convert_domain(raw: RawDomain) -> Result<TargetConfig> {
    let mut target = TargetConfig::new(raw.domain.clone());
    if let Some(interval) = parse_interval(&raw.domain, raw.interval.as_ref())? {
        target = target.with_default_interval(interval);
    }

    for check in raw.checks {
        let mut config = CheckConfig::new(check.key.clone());
        if let Some(interval) = parse_interval(&raw.domain, check.interval.as_ref())? {
            config = config.with_interval(interval);
        }
        config.args = convert_args(&raw.domain, &check.key, check.args)?;

        debug!(domain = %raw.domain, check = %config.check_key, "Check configured");
        target = target.with_check(config);
    }

    Ok(target)
}

fn parse_interval(domain: &str, value: Option<&Value>) -> Result<Option<Duration>> {
    let invalid = |value: String, reason: &str| ConfigError::InvalidInterval {
        domain: domain.to_string(),
        value,
        reason: reason.to_string(),
    };

    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(raw)) => parse_duration(raw)
            .map(Some)
            .map_err(|e| invalid(raw.clone(), &e.to_string())),
        // Bare 0 means unset, like "0"
        Some(Value::Number(n)) if n.as_u64() == Some(0) => Ok(Some(Duration::ZERO)),
        Some(other) => Err(invalid(
            scalar_text(other).unwrap_or_else(|| format!("{other:?}")),
            "expected a duration such as \"30s\" or \"5m\"",
        )),
    }
}

fn convert_args(domain: &str, check: &str, raw: BTreeMap<String, Value>) -> Result<CheckArgs> {
    raw.into_iter()
        .map(|(arg, value)| match scalar_text(&value) {
            Some(text) => Ok((arg, text)),
            None => Err(ConfigError::NestedArg {
                domain: domain.to_string(),
                check: check.to_string(),
                arg,
            }),
        })
        .collect()
}

/// Scalars as the string a check receives; `None` for sequences and mappings
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => None,
    }
}
