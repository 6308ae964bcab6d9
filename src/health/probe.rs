//! TCP reachability probe.
//!
//! # Responsibilities
//! - Connect to one backend with a bounded timeout
//! - Close the connection immediately on success
//! - Collapse every failure (refused, unreachable, timed out) into `false`

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time;

/// Something that can decide whether a backend is reachable.
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe `addr` once. No retries.
    async fn probe(&self, addr: SocketAddr) -> bool;
}

/// Plain TCP connect-and-close probe.
#[derive(Debug, Clone)]
pub struct TcpProber {
    timeout: Duration,
}

impl TcpProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TcpProber {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, addr: SocketAddr) -> bool {
        match time::timeout(self.timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => {
                drop(stream);
                true
            }
            Ok(Err(e)) => {
                tracing::debug!(addr = %addr, error = %e, "Probe failed: connection error");
                false
            }
            Err(_) => {
                tracing::debug!(addr = %addr, timeout = ?self.timeout, "Probe failed: timeout");
                false
            }
        }
    }
}
