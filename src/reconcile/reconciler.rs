//! Turns health snapshots into endpoint patches.
//!
//! # Responsibilities
//! - Skip cycles where no backend changed state
//! - Build a replace/remove patch from the healthy set
//! - Apply it once through the endpoint store, logging the outcome
//!
//! # Design Decisions
//! - Apply failures are logged and swallowed; the loop keeps running
//! - Nothing is retried: the registry has already moved on, so a failed
//!   patch is only re-sent when health changes again

use crate::health::registry::HealthRegistry;
use crate::log_event;
use crate::observability::metrics;
use crate::reconcile::patch::EndpointPatch;
use crate::reconcile::store::EndpointStore;

/// What a reconcile pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// No health change; nothing was applied.
    Unchanged,
    /// The patch was applied.
    Applied(EndpointPatch),
    /// The store rejected the patch.
    Failed { patch: EndpointPatch, error: String },
}

pub struct Reconciler {
    store: Box<dyn EndpointStore>,
}

impl Reconciler {
    pub fn new(store: Box<dyn EndpointStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn EndpointStore {
        self.store.as_ref()
    }

    /// Bring the endpoint store in line with `registry`, if anything changed.
    pub async fn reconcile(&self, registry: &HealthRegistry) -> ReconcileOutcome {
        if !registry.has_changed() {
            return ReconcileOutcome::Unchanged;
        }

        for t in registry.transitions() {
            tracing::debug!(ip = %t.ip, from = %t.from, to = %t.to, "Health changed");
        }

        let patch = EndpointPatch::from_healthy(registry.healthy_addresses());
        match &patch {
            EndpointPatch::Replace(_) => {
                let addresses = serde_json::to_string(&patch.addresses()).unwrap_or_default();
                log_event!("Updating Kubernetes endpoints with healthy IPs: {}", addresses);
            }
            EndpointPatch::Remove => {
                log_event!("No healthy IPs available, clearing Kubernetes endpoints.");
            }
        }

        match self.store.apply(&patch).await {
            Ok(()) => {
                metrics::record_patch(patch.op(), true);
                log_event!("Finished updating Kubernetes endpoints.");
                ReconcileOutcome::Applied(patch)
            }
            Err(e) => {
                metrics::record_patch(patch.op(), false);
                tracing::error!("Failed to patch endpoints: {}", e);
                ReconcileOutcome::Failed {
                    patch,
                    error: e.to_string(),
                }
            }
        }
    }
}
