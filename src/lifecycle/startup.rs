//! Startup helpers run once, before the monitor loop.
//!
//! # Responsibilities
//! - Point the container's system timezone at the configured zone
//! - Log the effective configuration

use std::fs;
use std::io;
use std::path::Path;

use crate::config::SentinelConfig;

/// Set the system timezone under `/`.
pub fn apply_system_timezone(name: &str) -> io::Result<bool> {
    apply_system_timezone_at(Path::new("/"), name)
}

/// Link `<root>/etc/localtime` to the zoneinfo file for `name` and write
/// `<root>/etc/timezone`.
///
/// Returns `Ok(false)` without touching anything when the zone is not
/// installed under `<root>/usr/share/zoneinfo`.
pub fn apply_system_timezone_at(root: &Path, name: &str) -> io::Result<bool> {
    let zone = root.join("usr/share/zoneinfo").join(name);
    if name.is_empty() || !zone.is_file() {
        return Ok(false);
    }

    let etc = root.join("etc");
    let localtime = etc.join("localtime");
    if localtime.symlink_metadata().is_ok() {
        fs::remove_file(&localtime)?;
    }

    #[cfg(unix)]
    std::os::unix::fs::symlink(&zone, &localtime)?;
    #[cfg(not(unix))]
    fs::copy(&zone, &localtime).map(|_| ())?;

    fs::write(etc.join("timezone"), name)?;
    Ok(true)
}

/// Log the effective configuration, one INFO line per setting.
pub fn log_config_summary(config: &SentinelConfig) {
    tracing::info!("LOG_LEVEL            : {}", config.observability.log_level);
    tracing::info!("PORT                 : {}", config.targets.port);
    tracing::info!("DELAY                : {}", config.probe.delay_secs);
    tracing::info!("MAX_RETRY            : {}", config.probe.max_retry);
    tracing::info!("SERVICE_NAME         : {}", config.endpoint.service_name);
    tracing::info!("NAMESPACE            : {}", config.endpoint.namespace);
    tracing::info!("NOTIFICATION_ENABLED : {}", config.notification.enabled);
    tracing::info!("IPS                  : {}", config.targets.ips.join(" "));
    if config.endpoint.dry_run {
        tracing::info!("DRY_RUN              : true");
    }
    tracing::debug!("TEAMS_WEBHOOK_URL    : {}", config.notification.webhook_url);
}
