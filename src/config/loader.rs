//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::SentinelConfig;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value {value:?} for {key}: {reason}")]
    Env {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Load configuration from a TOML file. Missing sections take their defaults.
pub fn load_config(path: &Path) -> Result<SentinelConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: SentinelConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Load a dotenv file into the process environment.
///
/// Returns `false` when the file does not exist. Variables already set in
/// the environment win over the file.
pub fn load_dotenv(path: &Path) -> bool {
    if !path.exists() {
        return false;
    }
    match dotenv::from_path(path) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "Failed to read env file");
            false
        }
    }
}

/// Overlay environment variables on top of `config`.
///
/// `lookup` abstracts the environment so tests do not have to mutate the
/// process state. Empty values are treated as unset, except for the IP list,
/// webhook URL and service name, where an empty string is meaningful.
pub fn apply_env_overrides<F>(config: &mut SentinelConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(ips) = lookup("IPS") {
        config.targets.ips = ips.split_whitespace().map(str::to_string).collect();
    }
    if let Some(port) = non_empty(&lookup, "PORT") {
        config.targets.port = parse_env("PORT", port)?;
    }
    if let Some(delay) = non_empty(&lookup, "DELAY") {
        config.probe.delay_secs = parse_env("DELAY", delay)?;
    }
    if let Some(timeout) = non_empty(&lookup, "PROBE_TIMEOUT") {
        config.probe.timeout_secs = parse_env("PROBE_TIMEOUT", timeout)?;
    }
    if let Some(max_retry) = non_empty(&lookup, "MAX_RETRY") {
        config.probe.max_retry = parse_env("MAX_RETRY", max_retry)?;
    }
    if let Some(namespace) = non_empty(&lookup, "NAMESPACE") {
        config.endpoint.namespace = namespace;
    }
    if let Some(name) = lookup("SERVICE_NAME") {
        config.endpoint.service_name = name;
    }
    if let Some(kubectl) = non_empty(&lookup, "KUBECTL") {
        config.endpoint.kubectl = kubectl;
    }
    if let Some(dry_run) = non_empty(&lookup, "DRY_RUN") {
        config.endpoint.dry_run = parse_flag(&dry_run);
    }
    if let Some(timezone) = non_empty(&lookup, "TIMEZONE") {
        config.observability.timezone = timezone;
    }
    if let Some(level) = non_empty(&lookup, "LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(addr) = non_empty(&lookup, "METRICS_ADDRESS") {
        config.observability.metrics_address = Some(addr);
    }
    if let Some(url) = lookup("TEAMS_WEBHOOK_URL") {
        config.notification.webhook_url = url;
    }
    if let Some(enabled) = non_empty(&lookup, "NOTIFICATION_ENABLED") {
        config.notification.enabled = parse_flag(&enabled);
    }
    Ok(())
}

/// Build the effective configuration: env file, then TOML file (or
/// defaults), then environment overrides.
pub fn resolve_config(path: Option<&Path>, env_file: &Path) -> Result<SentinelConfig, ConfigError> {
    load_dotenv(env_file);

    let mut config = match path {
        Some(path) => load_config(path)?,
        None => SentinelConfig::default(),
    };
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.parse::<T>().map_err(|e| ConfigError::Env {
        key,
        reason: e.to_string(),
        value,
    })
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true")
}
