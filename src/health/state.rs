//! Backend health state.
//!
//! # States
//! - Unknown: no probe has completed yet
//! - Healthy: last TCP connect succeeded, backend is published
//! - NotHealthy: last TCP connect failed, backend is withheld
//!
//! There is no hysteresis: every probe result becomes the new state.

use std::fmt;
use std::net::{IpAddr, SocketAddr};

use serde::Serialize;

/// Health classification of a monitored address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum HealthStatus {
    #[default]
    Unknown,
    Healthy,
    NotHealthy,
}

impl HealthStatus {
    /// Map a binary probe verdict to a status.
    pub fn from_probe(healthy: bool) -> Self {
        if healthy {
            HealthStatus::Healthy
        } else {
            HealthStatus::NotHealthy
        }
    }

    pub fn is_healthy(self) -> bool {
        self == HealthStatus::Healthy
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            HealthStatus::Unknown => "Unknown",
            HealthStatus::Healthy => "Healthy",
            HealthStatus::NotHealthy => "NotHealthy",
        };
        f.write_str(label)
    }
}

/// One backend: an IP literal plus the port shared by the whole set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MonitoredAddress {
    pub ip: IpAddr,
    pub port: u16,
}

impl MonitoredAddress {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self { ip, port }
    }

    /// Socket address to connect to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

impl fmt::Display for MonitoredAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.socket_addr())
    }
}
