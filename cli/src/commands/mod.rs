//! Command implementations

pub mod init;
pub mod install;
pub mod uninstall;
pub mod upgrade;
pub mod version;

use std::time::Duration;

use anyhow::Result;

use crate::domain::ConfigError;
use crate::domain::artifact::parse_kubernetes_version;

/// Parse durations such as `20m`, `90s`, `1h` or a bare number of seconds.
///
/// # Errors
///
/// Returns a message suitable for clap when the value is not a duration.
pub fn parse_duration(value: &str) -> Result<Duration, String> {
    let value = value.trim();
    let split = value
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let n: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration '{value}'"))?;
    let secs = match unit {
        "" | "s" => n,
        "m" => n * 60,
        "h" => n * 3600,
        _ => return Err(format!("invalid duration unit in '{value}'; use s, m or h")),
    };
    Ok(Duration::from_secs(secs))
}

/// Parse the positional Kubernetes version argument.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidKubernetesVersion`] for anything that is
/// not `MAJOR.MINOR` or `[v]MAJOR.MINOR.PATCH`.
pub fn kubernetes_version(value: &str) -> Result<semver::Version> {
    parse_kubernetes_version(value)
        .ok_or_else(|| ConfigError::InvalidKubernetesVersion(value.to_string()).into())
}
