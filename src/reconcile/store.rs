//! Endpoint store: where patches are applied.
//!
//! # Responsibilities
//! - Apply one patch to the configured Endpoints object
//! - Report success or a descriptive failure
//!
//! # Design Decisions
//! - Patches go through `kubectl patch --type=json` so the sidecar uses the
//!   pod's service account exactly like an operator would from a shell
//! - The store never retries; the reconciler decides what happens next

use std::process::ExitStatus;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

use crate::config::EndpointConfig;
use crate::reconcile::patch::EndpointPatch;

/// Errors reported by an endpoint store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The patch could not be serialized.
    #[error("failed to encode patch: {0}")]
    Encode(#[from] serde_json::Error),

    /// The patch command could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The patch command ran and exited unsuccessfully.
    #[error("command exited with {status}: {stderr}")]
    Command { status: ExitStatus, stderr: String },

    /// Rejected by some other store implementation.
    #[error("{0}")]
    Rejected(String),
}

/// The system of record for the endpoint address list.
#[async_trait]
pub trait EndpointStore: Send + Sync {
    /// Apply `patch` to the target object.
    async fn apply(&self, patch: &EndpointPatch) -> Result<(), StoreError>;

    /// Human readable target, for logs.
    fn describe(&self) -> String;
}

/// Applies patches with `kubectl patch endpoints`.
#[derive(Debug, Clone)]
pub struct KubectlStore {
    kubectl: String,
    namespace: String,
    name: String,
}

impl KubectlStore {
    pub fn new(
        kubectl: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kubectl: kubectl.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Arguments passed to kubectl for `patch`.
    pub fn args(&self, patch: &EndpointPatch) -> Result<Vec<String>, StoreError> {
        Ok(vec![
            "patch".to_string(),
            "endpoints".to_string(),
            self.name.clone(),
            "-n".to_string(),
            self.namespace.clone(),
            "--type=json".to_string(),
            "-p".to_string(),
            patch.to_json_patch()?,
        ])
    }
}

#[async_trait]
impl EndpointStore for KubectlStore {
    async fn apply(&self, patch: &EndpointPatch) -> Result<(), StoreError> {
        let args = self.args(patch)?;
        tracing::debug!(program = %self.kubectl, args = ?args, "Running patch command");

        let output = Command::new(&self.kubectl)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| StoreError::Spawn {
                program: self.kubectl.clone(),
                source,
            })?;

        if output.status.success() {
            tracing::debug!(
                stdout = %String::from_utf8_lossy(&output.stdout).trim(),
                "Patch command succeeded"
            );
            Ok(())
        } else {
            Err(StoreError::Command {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }

    fn describe(&self) -> String {
        format!("endpoints/{} in namespace {}", self.name, self.namespace)
    }
}

/// Logs patches without applying them.
#[derive(Debug, Clone)]
pub struct DryRunStore {
    namespace: String,
    name: String,
}

impl DryRunStore {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

#[async_trait]
impl EndpointStore for DryRunStore {
    async fn apply(&self, patch: &EndpointPatch) -> Result<(), StoreError> {
        tracing::info!(
            "[dry-run] would patch {}: {}",
            self.describe(),
            patch.to_json_patch()?
        );
        Ok(())
    }

    fn describe(&self) -> String {
        format!("endpoints/{} in namespace {}", self.name, self.namespace)
    }
}

/// Build the store selected by configuration.
pub fn store_from_config(config: &EndpointConfig) -> Box<dyn EndpointStore> {
    if config.dry_run {
        Box::new(DryRunStore::new(&config.namespace, &config.service_name))
    } else {
        Box::new(KubectlStore::new(
            &config.kubectl,
            &config.namespace,
            &config.service_name,
        ))
    }
}
