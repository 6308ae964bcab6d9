//! Current and previous health snapshots for the monitored set.

use std::collections::HashMap;
use std::net::IpAddr;

use crate::health::state::{HealthStatus, MonitoredAddress};

/// A status change observed between two cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub ip: IpAddr,
    pub from: HealthStatus,
    pub to: HealthStatus,
}

/// Health state of every monitored address.
///
/// Both snapshots always hold an entry for every configured address. The
/// address order given at construction is preserved for everything that
/// lists addresses.
#[derive(Debug, Clone)]
pub struct HealthRegistry {
    addresses: Vec<MonitoredAddress>,
    current: HashMap<IpAddr, HealthStatus>,
    previous: HashMap<IpAddr, HealthStatus>,
}

impl HealthRegistry {
    pub fn new(addresses: Vec<MonitoredAddress>) -> Self {
        let current: HashMap<IpAddr, HealthStatus> = addresses
            .iter()
            .map(|a| (a.ip, HealthStatus::Unknown))
            .collect();
        let previous = current.clone();

        Self {
            addresses,
            current,
            previous,
        }
    }

    /// Start a cycle: the current snapshot becomes the previous one.
    ///
    /// Must run once per cycle, before any `record_result`.
    pub fn begin_cycle(&mut self) {
        for addr in &self.addresses {
            let status = self.current.get(&addr.ip).copied().unwrap_or_default();
            self.previous.insert(addr.ip, status);
        }
    }

    /// Store a probe verdict. Addresses outside the configured set are ignored.
    pub fn record_result(&mut self, ip: IpAddr, healthy: bool) {
        match self.current.get_mut(&ip) {
            Some(slot) => *slot = HealthStatus::from_probe(healthy),
            None => tracing::debug!(ip = %ip, "Ignoring probe result for unmonitored address"),
        }
    }

    /// True if any address differs between the previous and current snapshot.
    pub fn has_changed(&self) -> bool {
        self.addresses
            .iter()
            .any(|a| self.current(a.ip) != self.previous(a.ip))
    }

    /// Addresses currently healthy, in configured order.
    pub fn healthy_addresses(&self) -> Vec<IpAddr> {
        self.addresses
            .iter()
            .filter(|a| self.current(a.ip).is_healthy())
            .map(|a| a.ip)
            .collect()
    }

    /// Every address whose status changed this cycle, in configured order.
    pub fn transitions(&self) -> Vec<Transition> {
        self.addresses
            .iter()
            .filter_map(|a| {
                let from = self.previous(a.ip);
                let to = self.current(a.ip);
                (from != to).then_some(Transition { ip: a.ip, from, to })
            })
            .collect()
    }

    pub fn current(&self, ip: IpAddr) -> HealthStatus {
        self.current.get(&ip).copied().unwrap_or_default()
    }

    pub fn previous(&self, ip: IpAddr) -> HealthStatus {
        self.previous.get(&ip).copied().unwrap_or_default()
    }

    pub fn addresses(&self) -> &[MonitoredAddress] {
        &self.addresses
    }
}
