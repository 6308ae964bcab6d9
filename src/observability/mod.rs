//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce tracing records:
//!     → logging.rs (one JSON line per record: timestamp, level, message)
//!     → notify.rs  (EVENT / ERROR records → webhook MessageCard)
//! Health monitor and reconciler also update:
//!     → metrics.rs (per-backend gauges, probe and patch counters)
//! ```
//!
//! # Design Decisions
//! - EVENT is a tracing INFO record under a dedicated target
//! - Notification delivery happens off the hot path, on its own task, behind
//!   a bounded queue
//! - Metrics are optional and off unless a listener address is configured

pub mod logging;
pub mod metrics;
pub mod notify;

pub use logging::{init_logging, Clock, LogLevel, EVENT_TARGET};
pub use notify::{spawn_notifier, NotifyHandle, NotifyQueue, WebhookNotifier};
