//! Shared utilities for integration tests.

use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use endpoint_sentinel::health::MonitoredAddress;
use endpoint_sentinel::reconcile::{EndpointPatch, EndpointStore, StoreError};

/// A loopback backend that accepts and immediately drops connections.
pub struct MockBackend {
    pub addr: SocketAddr,
    task: JoinHandle<()>,
}

impl MockBackend {
    /// Bind `addr` (port 0 picks a free port).
    pub async fn start(addr: SocketAddr) -> Self {
        let listener = TcpListener::bind(addr).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let task = tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                drop(socket);
            }
        });

        Self { addr, task }
    }

    /// Stop listening; later connects are refused.
    pub async fn stop(self) {
        self.task.abort();
        let _ = self.task.await;
    }
}

/// Backends on distinct loopback IPs sharing one port.
///
/// Linux routes all of 127.0.0.0/8 to lo, so 127.0.0.x are distinct,
/// bindable addresses there.
#[allow(dead_code)]
pub async fn start_backends(hosts: &[u8]) -> (Vec<MockBackend>, u16) {
    let first = MockBackend::start(format!("127.0.0.{}:0", hosts[0]).parse().unwrap()).await;
    let port = first.addr.port();

    let mut backends = vec![first];
    for host in &hosts[1..] {
        let addr: SocketAddr = format!("127.0.0.{}:{}", host, port).parse().unwrap();
        backends.push(MockBackend::start(addr).await);
    }
    (backends, port)
}

pub fn monitored(ips: &[IpAddr], port: u16) -> Vec<MonitoredAddress> {
    ips.iter().map(|ip| MonitoredAddress::new(*ip, port)).collect()
}

/// Endpoint store that records every patch and can be told to fail.
#[derive(Clone, Default)]
pub struct RecordingStore {
    pub applied: Arc<Mutex<Vec<EndpointPatch>>>,
    pub fail: Arc<Mutex<bool>>,
}

#[allow(dead_code)]
impl RecordingStore {
    pub fn patches(&self) -> Vec<EndpointPatch> {
        self.applied.lock().unwrap().clone()
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl EndpointStore for RecordingStore {
    async fn apply(&self, patch: &EndpointPatch) -> Result<(), StoreError> {
        self.applied.lock().unwrap().push(patch.clone());
        if *self.fail.lock().unwrap() {
            return Err(StoreError::Rejected("the server could not find the requested resource".into()));
        }
        Ok(())
    }

    fn describe(&self) -> String {
        "recording store".into()
    }
}
