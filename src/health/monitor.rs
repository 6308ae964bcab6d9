//! The polling loop.
//!
//! # Responsibilities
//! - Probe every monitored address once per cycle
//! - Record the results, then hand the registry to the reconciler
//! - Sleep between cycles until shutdown is requested

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time;

use crate::health::probe::Prober;
use crate::health::registry::HealthRegistry;
use crate::health::state::MonitoredAddress;
use crate::lifecycle::ShutdownReason;
use crate::observability::metrics;
use crate::reconcile::{ReconcileOutcome, Reconciler};

pub struct HealthMonitor {
    registry: HealthRegistry,
    prober: Arc<dyn Prober>,
    reconciler: Reconciler,
    delay: Duration,
}

impl HealthMonitor {
    pub fn new(
        addresses: Vec<MonitoredAddress>,
        prober: Arc<dyn Prober>,
        reconciler: Reconciler,
        delay: Duration,
    ) -> Self {
        Self {
            registry: HealthRegistry::new(addresses),
            prober,
            reconciler,
            delay,
        }
    }

    pub fn registry(&self) -> &HealthRegistry {
        &self.registry
    }

    /// One full cycle: probe everything, then at most one reconcile.
    ///
    /// Probes run concurrently, but results are recorded only after every
    /// probe has returned, and always in configured order.
    pub async fn run_cycle(&mut self) -> ReconcileOutcome {
        self.registry.begin_cycle();

        let addresses = self.registry.addresses().to_vec();
        let results = join_all(
            addresses
                .iter()
                .map(|addr| self.prober.probe(addr.socket_addr())),
        )
        .await;

        for (addr, healthy) in addresses.iter().zip(results) {
            metrics::record_probe(addr.ip, healthy);
            self.registry.record_result(addr.ip, healthy);
        }

        self.reconciler.reconcile(&self.registry).await
    }

    /// Run cycles until `shutdown` fires. Shutdown is only observed between
    /// cycles; an in-flight probe is never cancelled.
    ///
    /// A closed channel is not a shutdown request: the loop keeps running
    /// until the process is killed.
    pub async fn run(mut self, shutdown: broadcast::Receiver<ShutdownReason>) {
        tracing::debug!(
            targets = self.registry.addresses().len(),
            delay = ?self.delay,
            store = %self.reconciler.store().describe(),
            "Health monitor starting"
        );

        let mut shutdown = Some(shutdown);
        loop {
            self.run_cycle().await;

            tracing::debug!("Sleeping for {} seconds...", self.delay.as_secs_f64());
            let Some(rx) = shutdown.as_mut() else {
                time::sleep(self.delay).await;
                continue;
            };

            let received = tokio::select! {
                biased;
                res = rx.recv() => res,
                _ = time::sleep(self.delay) => continue,
            };
            match received {
                Ok(reason) => {
                    tracing::error!("Sleep interrupted by {}. Exiting...", reason);
                    break;
                }
                Err(RecvError::Lagged(_)) => {
                    tracing::error!("Sleep interrupted by shutdown. Exiting...");
                    break;
                }
                Err(RecvError::Closed) => {
                    tracing::error!("Shutdown channel closed, signals can no longer stop the monitor");
                    shutdown = None;
                    time::sleep(self.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::state::HealthStatus;
    use crate::lifecycle::Shutdown;
    use crate::reconcile::{EndpointPatch, EndpointStore, StoreError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::net::{IpAddr, SocketAddr};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Answers from a per-IP script; the last answer repeats.
    #[derive(Default)]
    struct ScriptedProber {
        script: Mutex<HashMap<IpAddr, Vec<bool>>>,
    }

    impl ScriptedProber {
        fn with(entries: &[(&str, &[bool])]) -> Self {
            let script = entries
                .iter()
                .map(|(ip, answers)| (ip.parse().unwrap(), answers.to_vec()))
                .collect();
            Self {
                script: Mutex::new(script),
            }
        }
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn probe(&self, addr: SocketAddr) -> bool {
            let mut script = self.script.lock().unwrap();
            match script.get_mut(&addr.ip()) {
                Some(answers) if answers.len() > 1 => answers.remove(0),
                Some(answers) => answers.first().copied().unwrap_or(false),
                None => false,
            }
        }
    }

    #[derive(Clone, Default)]
    struct CountingStore {
        applied: Arc<Mutex<Vec<EndpointPatch>>>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl EndpointStore for CountingStore {
        async fn apply(&self, patch: &EndpointPatch) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.applied.lock().unwrap().push(patch.clone());
            Ok(())
        }

        fn describe(&self) -> String {
            "counting".into()
        }
    }

    fn addresses(ips: &[&str]) -> Vec<MonitoredAddress> {
        ips.iter()
            .map(|ip| MonitoredAddress::new(ip.parse().unwrap(), 9092))
            .collect()
    }

    fn monitor(prober: ScriptedProber, store: &CountingStore, ips: &[&str]) -> HealthMonitor {
        HealthMonitor::new(
            addresses(ips),
            Arc::new(prober),
            Reconciler::new(Box::new(store.clone())),
            Duration::from_millis(10),
        )
    }

    #[tokio::test]
    async fn test_cycle_records_every_address() {
        let store = CountingStore::default();
        let prober = ScriptedProber::with(&[("10.0.0.1", &[true]), ("10.0.0.2", &[false])]);
        let mut monitor = monitor(prober, &store, &["10.0.0.1", "10.0.0.2"]);

        monitor.run_cycle().await;

        let reg = monitor.registry();
        assert_eq!(reg.current("10.0.0.1".parse().unwrap()), HealthStatus::Healthy);
        assert_eq!(reg.current("10.0.0.2".parse().unwrap()), HealthStatus::NotHealthy);
        assert_eq!(reg.previous("10.0.0.1".parse().unwrap()), HealthStatus::Unknown);
    }

    #[tokio::test]
    async fn test_flapping_backend_patches_each_flip() {
        let store = CountingStore::default();
        let prober = ScriptedProber::with(&[("10.0.0.1", &[true, false, true, true])]);
        let mut monitor = monitor(prober, &store, &["10.0.0.1"]);

        for _ in 0..4 {
            monitor.run_cycle().await;
        }

        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        assert_eq!(
            *store.applied.lock().unwrap(),
            vec![
                EndpointPatch::Replace(vec![ip]),
                EndpointPatch::Remove,
                EndpointPatch::Replace(vec![ip]),
            ]
        );
    }

    #[tokio::test]
    async fn test_run_exits_on_shutdown() {
        let store = CountingStore::default();
        let prober = ScriptedProber::with(&[("10.0.0.1", &[true])]);
        let monitor = monitor(prober, &store, &["10.0.0.1"]);

        let shutdown = Shutdown::new();
        let rx = shutdown.subscribe();
        let handle = tokio::spawn(monitor.run(rx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.trigger(ShutdownReason::Interrupt);

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("monitor should stop after shutdown")
            .unwrap();

        // Steady health: only the first cycle patched.
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_closed_shutdown_channel_keeps_running() {
        let store = CountingStore::default();
        let prober = ScriptedProber::with(&[("10.0.0.1", &[true, false])]);
        let monitor = monitor(prober, &store, &["10.0.0.1"]);

        let shutdown = Shutdown::new();
        let rx = shutdown.subscribe();
        drop(shutdown);

        let result = tokio::time::timeout(Duration::from_millis(300), monitor.run(rx)).await;
        assert!(result.is_err(), "loop returned without a shutdown request");

        // Kept cycling after the channel closed: up, then down.
        assert_eq!(
            *store.applied.lock().unwrap(),
            vec![
                EndpointPatch::Replace(vec!["10.0.0.1".parse().unwrap()]),
                EndpointPatch::Remove,
            ]
        );
    }
}
