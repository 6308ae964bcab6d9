//! Configuration validation.
//!
//! Serde handles the syntax; this module checks meaning. Every problem is
//! collected so an operator sees the whole list at once.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;

use crate::config::schema::SentinelConfig;
use crate::health::state::MonitoredAddress;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("no IPs configured")]
    NoTargets,

    #[error("'{0}' is not an IP address")]
    InvalidIp(String),

    #[error("IP {0} is listed more than once")]
    DuplicateTarget(IpAddr),

    #[error("port must be non-zero")]
    ZeroPort,

    #[error("delay must be a finite, non-negative number of seconds (got {0})")]
    InvalidDelay(f64),

    #[error("probe timeout must be a finite, positive number of seconds (got {0})")]
    InvalidTimeout(f64),

    #[error("service name is required")]
    MissingServiceName,

    #[error("webhook URL '{0}' is not a valid http(s) URL")]
    InvalidWebhookUrl(String),

    #[error("metrics address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Validate `config` and return the monitored addresses in configured order.
pub fn validate_config(config: &SentinelConfig) -> Result<Vec<MonitoredAddress>, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut addresses = Vec::with_capacity(config.targets.ips.len());
    let mut seen = HashSet::new();

    if config.targets.ips.is_empty() {
        errors.push(ValidationError::NoTargets);
    }

    for raw in &config.targets.ips {
        match raw.parse::<IpAddr>() {
            Ok(ip) if !seen.insert(ip) => errors.push(ValidationError::DuplicateTarget(ip)),
            Ok(ip) => addresses.push(MonitoredAddress::new(ip, config.targets.port)),
            Err(_) => errors.push(ValidationError::InvalidIp(raw.clone())),
        }
    }

    if config.targets.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }

    let delay = config.probe.delay_secs;
    if !delay.is_finite() || delay < 0.0 {
        errors.push(ValidationError::InvalidDelay(delay));
    }

    let timeout = config.probe.timeout_secs;
    if !timeout.is_finite() || timeout <= 0.0 {
        errors.push(ValidationError::InvalidTimeout(timeout));
    }

    if !config.endpoint.dry_run && config.endpoint.service_name.trim().is_empty() {
        errors.push(ValidationError::MissingServiceName);
    }

    let webhook = config.notification.webhook_url.trim();
    if !webhook.is_empty() {
        let valid = url::Url::parse(webhook)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::InvalidWebhookUrl(webhook.to_string()));
        }
    }

    if let Some(addr) = &config.observability.metrics_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidMetricsAddress(addr.clone()));
        }
    }

    if errors.is_empty() {
        Ok(addresses)
    } else {
        Err(errors)
    }
}
