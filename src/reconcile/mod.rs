//! Endpoint reconciliation subsystem.
//!
//! # Data Flow
//! ```text
//! HealthRegistry (after all probes of a cycle)
//!     → reconciler.rs (changed? build patch)
//!     → patch.rs (replace with healthy set, or remove)
//!     → store.rs (kubectl patch endpoints ... --type=json)
//!     → EVENT / ERROR log lines
//! ```
//!
//! # Design Decisions
//! - At most one apply per cycle, and none when health is unchanged
//! - Patches are computed fresh each cycle and never queued

pub mod patch;
pub mod reconciler;
pub mod store;

pub use patch::EndpointPatch;
pub use reconciler::{ReconcileOutcome, Reconciler};
pub use store::{store_from_config, DryRunStore, EndpointStore, KubectlStore, StoreError};
