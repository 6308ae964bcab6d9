//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the sidecar.
//! All types derive Serde traits so the same structure can be read from a
//! TOML file and then overlaid with environment variables.

use serde::{Deserialize, Serialize};

/// Root configuration for the endpoint sentinel.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SentinelConfig {
    /// Backends to probe.
    pub targets: TargetConfig,

    /// Probe timing.
    pub probe: ProbeConfig,

    /// The Endpoints object kept in sync with healthy backends.
    pub endpoint: EndpointConfig,

    /// Logging, timezone and metrics settings.
    pub observability: ObservabilityConfig,

    /// Chat webhook notifications.
    pub notification: NotificationConfig,
}

/// Monitored backend set.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetConfig {
    /// IP literals, probed and published in this order.
    pub ips: Vec<String>,

    /// Port shared by every backend.
    pub port: u16,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            ips: Vec::new(),
            port: 9092,
        }
    }
}

/// Probe timing configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Delay between polling cycles in seconds (fractional allowed).
    pub delay_secs: f64,

    /// TCP connect timeout per probe in seconds.
    pub timeout_secs: f64,

    /// Accepted for compatibility with existing deployments. Nothing retries on it.
    pub max_retry: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            delay_secs: 0.01,
            timeout_secs: 3.0,
            max_retry: 10,
        }
    }
}

/// Target Endpoints object.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Namespace of the Endpoints object.
    pub namespace: String,

    /// Name of the Endpoints object (same as the Service name).
    pub service_name: String,

    /// kubectl binary used to apply patches.
    pub kubectl: String,

    /// Log patches instead of applying them.
    pub dry_run: bool,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            service_name: String::new(),
            kubectl: "kubectl".to_string(),
            dry_run: false,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// IANA timezone used for log timestamps (e.g., "Asia/Jakarta").
    pub timezone: String,

    /// `DEBUG` enables verbose output; anything else logs INFO/EVENT/ERROR only.
    pub log_level: String,

    /// Point /etc/localtime at the configured timezone on startup.
    pub manage_system_timezone: bool,

    /// Prometheus listener address. Metrics are disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            timezone: "Asia/Jakarta".to_string(),
            log_level: "INFO".to_string(),
            manage_system_timezone: true,
            metrics_address: None,
        }
    }
}

impl ObservabilityConfig {
    /// Whether DEBUG records should be emitted.
    pub fn is_debug(&self) -> bool {
        self.log_level.eq_ignore_ascii_case("DEBUG")
    }
}

/// Webhook notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Master switch for notifications.
    pub enabled: bool,

    /// Incoming webhook URL. Notifications are skipped when empty.
    pub webhook_url: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            webhook_url: String::new(),
        }
    }
}

impl NotificationConfig {
    /// Notifications are sent only when enabled and a webhook is configured.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.webhook_url.trim().is_empty()
    }
}
