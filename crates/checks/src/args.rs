// Argument helpers shared by the standard checks

use std::str::FromStr;
use std::time::Duration;
use vigil_core::domain::{parse_duration, CheckArgs};
use vigil_core::port::ArgsError;

/// Value of `key`, or `default` when the key is absent or empty
pub fn arg_or<'a>(args: &'a CheckArgs, key: &str, default: &'a str) -> &'a str {
    match args.get(key).map(String::as_str) {
        Some(value) if !value.is_empty() => value,
        _ => default,
    }
}

/// Parse a duration argument, falling back to `default` when unset
pub fn duration_arg(args: &CheckArgs, key: &str, default: &str) -> Result<Duration, ArgsError> {
    let raw = arg_or(args, key, default);
    parse_duration(raw).map_err(|e| ArgsError::new(format!("{key}: {e}")))
}

/// Parse an integer argument, falling back to `default` when unset
pub fn int_arg<T: FromStr>(args: &CheckArgs, key: &str, default: &str) -> Result<T, ArgsError> {
    let raw = arg_or(args, key, default);
    raw.parse::<T>()
        .map_err(|_| ArgsError::new(format!("{key}: invalid number {raw:?}")))
}

/// Validator helper: a present `key` must parse as a duration
pub fn require_duration(args: &CheckArgs, key: &str) -> Result<(), ArgsError> {
    match args.get(key) {
        Some(raw) if parse_duration(raw).is_err() => {
            Err(ArgsError::new(format!("{key} must be a duration")))
        }
        _ => Ok(()),
    }
}

/// Validator helper: a present `key` must be an integer within `min..=max`
pub fn require_int_in(args: &CheckArgs, key: &str, min: i64, max: i64) -> Result<(), ArgsError> {
    let Some(raw) = args.get(key) else {
        return Ok(());
    };
    let value: i64 = raw
        .parse()
        .map_err(|_| ArgsError::new(format!("{key} must be a number")))?;
    if value < min || value > max {
        return Err(ArgsError::new(format!(
            "{key} must be between {min} and {max}"
        )));
    }
    Ok(())
}

/// Prefix `https://` unless the target already names a scheme
pub fn with_scheme(target: &str) -> String {
    if target.contains("://") {
        target.to_string()
    } else {
        format!("https://{target}")
    }
}

/// Bare host name of a target: scheme, credentials, path and port removed
pub fn host_of(target: &str) -> &str {
    let rest = target
        .strip_prefix("https://")
        .or_else(|| target.strip_prefix("http://"))
        .unwrap_or(target);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host_port = authority.rsplit('@').next().unwrap_or(authority);

    if let Some(bracketed) = host_port.strip_prefix('[') {
        // IPv6 literal
        return bracketed.split(']').next().unwrap_or(bracketed);
    }
    host_port.split(':').next().unwrap_or(host_port)
}
