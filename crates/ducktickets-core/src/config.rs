//! Environment lookups used by each service's `from_env()`.

use std::str::FromStr;

use anyhow::Context;

/// Read a required variable.
pub fn required(name: &str) -> anyhow::Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be set"))
}

/// Read an optional variable, falling back to `default` when unset.
/// A set but unparseable value is an error.
pub fn or_default<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| anyhow::anyhow!("{name} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}

/// Read an optional string variable, empty string when unset.
pub fn or_empty(name: &str) -> String {
    std::env::var(name).unwrap_or_default()
}
