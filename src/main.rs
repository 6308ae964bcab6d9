//! Endpoint Sentinel (v1)
//!
//! A sidecar that publishes only reachable backends in a Kubernetes
//! Endpoints object.
//!
//! # Architecture Overview
//!
//! ```text
//!   ┌──────────────────────────── endpoint-sentinel ────────────────────────────┐
//!   │                                                                            │
//!   │   ┌──────────┐  every DELAY   ┌──────────┐  TCP connect   ┌───────────┐   │
//!   │   │ lifecycle│───────────────▶│  health  │───────────────▶│ backends  │◀──┼── IPS:PORT
//!   │   │ signals  │   (shutdown)   │ monitor  │◀───────────────│           │   │
//!   │   └──────────┘                └────┬─────┘  ok / failed   └───────────┘   │
//!   │                                    │ registry                               │
//!   │                                    ▼                                        │
//!   │                              ┌───────────┐   changed?   ┌────────────────┐ │
//!   │                              │ reconcile │─────────────▶│ kubectl patch  │─┼─▶ Endpoints
//!   │                              └─────┬─────┘              └────────────────┘ │
//!   │                                    │ EVENT / ERROR                          │
//!   │                                    ▼                                        │
//!   │                          ┌──────────────────┐                              │
//!   │                          │  observability   │── JSON lines (stdout)        │
//!   │                          │ logging / notify │── MessageCard (webhook)      │
//!   │                          └──────────────────┘                              │
//!   └────────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use endpoint_sentinel::config::{resolve_config, validate_config, ValidationError};
use endpoint_sentinel::health::{HealthMonitor, TcpProber};
use endpoint_sentinel::lifecycle::{signals, startup, Shutdown};
use endpoint_sentinel::observability::metrics::init_metrics;
use endpoint_sentinel::observability::{init_logging, spawn_notifier, Clock, NotifyHandle, WebhookNotifier};
use endpoint_sentinel::reconcile::{store_from_config, Reconciler};

#[derive(Parser)]
#[command(name = "endpoint-sentinel")]
#[command(about = "Keeps a Kubernetes Endpoints object in sync with reachable backends", long_about = None)]
struct Args {
    /// Optional TOML config file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Dotenv file loaded before reading the environment.
    #[arg(long, default_value = "/.env")]
    env_file: PathBuf,

    /// Log patches instead of applying them.
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = resolve_config(args.config.as_deref(), &args.env_file)?;
    if args.dry_run {
        config.endpoint.dry_run = true;
    }

    // Logging comes first so every later failure reaches stdout and the webhook.
    let timezone = config.observability.timezone.clone();
    let clock = Clock::parse(&timezone);
    let (notify_queue, notify) = if config.notification.is_active() {
        let notifier = WebhookNotifier::new(config.notification.webhook_url.trim());
        let (queue, handle, _task) = spawn_notifier(notifier);
        (Some(queue), Some(handle))
    } else {
        (None, None)
    };
    init_logging(&config.observability, clock.unwrap_or_default(), notify_queue)?;

    if clock.is_none() {
        tracing::info!("Unknown timezone {}, logging in UTC", timezone);
    }

    let addresses = match validate_config(&config) {
        Ok(addresses) => addresses,
        Err(errors) => {
            for error in &errors {
                match error {
                    ValidationError::NoTargets => {
                        tracing::error!("No IPs defined in ConfigMap! Exiting...")
                    }
                    other => tracing::error!("Invalid configuration: {}", other),
                }
            }
            flush(&notify).await;
            std::process::exit(1);
        }
    };

    if config.observability.manage_system_timezone {
        match startup::apply_system_timezone(&timezone) {
            Ok(true) => tracing::debug!("System timezone set to {}", timezone),
            Ok(false) => tracing::debug!("Timezone {} not installed, system timezone unchanged", timezone),
            Err(e) => tracing::info!("Error setting timezone: {}", e),
        }
    }

    startup::log_config_summary(&config);

    if let Some(addr) = config
        .observability
        .metrics_address
        .as_deref()
        .and_then(|a| a.parse().ok())
    {
        if let Err(e) = init_metrics(addr) {
            tracing::error!("Failed to start metrics endpoint: {}", e);
        }
    }

    let delay = Duration::try_from_secs_f64(config.probe.delay_secs)?;
    let timeout = Duration::try_from_secs_f64(config.probe.timeout_secs)?;

    let monitor = HealthMonitor::new(
        addresses,
        Arc::new(TcpProber::new(timeout)),
        Reconciler::new(store_from_config(&config.endpoint)),
        delay,
    );

    let shutdown = Shutdown::new();
    let monitor_shutdown = shutdown.subscribe();
    signals::listen(shutdown);

    monitor.run(monitor_shutdown).await;

    flush(&notify).await;
    Ok(())
}

/// Give queued webhook notifications a bounded chance to go out.
async fn flush(notify: &Option<NotifyHandle>) {
    if let Some(handle) = notify {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle.flush()).await;
    }
}
