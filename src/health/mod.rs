//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! monitor.rs (every `delay`):
//!     → registry.begin_cycle()          previous := current
//!     → probe.rs for each address       TCP connect, bounded timeout
//!     → registry.record_result()        current := Healthy | NotHealthy
//!     → reconcile                       only if something changed
//! ```
//!
//! # Design Decisions
//! - A single probe decides the state; no thresholds or retries
//! - Health state lives in one registry owned by the monitor loop
//! - Probes fan out concurrently but the cycle waits for all of them

pub mod monitor;
pub mod probe;
pub mod registry;
pub mod state;

pub use monitor::HealthMonitor;
pub use probe::{Prober, TcpProber};
pub use registry::{HealthRegistry, Transition};
pub use state::{HealthStatus, MonitoredAddress};
