//! Endpoint Sentinel Library
//!
//! Probes a fixed set of backends over TCP and keeps a Kubernetes Endpoints
//! object limited to the ones that answer.

pub mod config;
pub mod health;
pub mod lifecycle;
pub mod observability;
pub mod reconcile;

pub use config::schema::SentinelConfig;
pub use health::HealthMonitor;
pub use lifecycle::Shutdown;
pub use reconcile::Reconciler;
