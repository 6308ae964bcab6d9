//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Resolve config → Validate → System timezone → Config summary → Monitor loop
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Monitor finishes its cycle → Loop exits → Flush notifications
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: an invalid config exits non-zero before any probing
//! - An in-flight cycle is never cancelled; shutdown is observed while sleeping

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownReason};
