//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sentinel_backend_health` (gauge, `ip`): 1=healthy, 0=not healthy
//! - `sentinel_probes_total` (counter, `ip`, `result`): probes by outcome
//! - `sentinel_endpoint_patches_total` (counter, `op`, `result`): patch attempts
//! - `sentinel_notifications_dropped_total` (counter): cards dropped on a full queue
//!
//! Recording is a no-op until [`init_metrics`] installs the Prometheus exporter.

use std::net::{IpAddr, SocketAddr};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_probe(ip: IpAddr, healthy: bool) {
    let ip = ip.to_string();
    ::metrics::gauge!("sentinel_backend_health", "ip" => ip.clone()).set(if healthy { 1.0 } else { 0.0 });
    ::metrics::counter!("sentinel_probes_total", "ip" => ip, "result" => outcome(healthy)).increment(1);
}

pub fn record_patch(op: &'static str, success: bool) {
    ::metrics::counter!("sentinel_endpoint_patches_total", "op" => op, "result" => outcome(success))
        .increment(1);
}

pub fn record_notification_dropped() {
    ::metrics::counter!("sentinel_notifications_dropped_total").increment(1);
}

fn outcome(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}
