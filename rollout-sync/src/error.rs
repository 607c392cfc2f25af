//! Error types for rollout-sync.

use thiserror::Error;

use rollout_core::ApplicationName;

use crate::exec::ExecError;

/// All errors that can arise from cluster and ArgoCD operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A `kubectl` invocation could not be spawned or exited non-zero.
    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// `kubectl` or the ArgoCD namespace is missing.
    #[error("{0}")]
    PrerequisiteMissing(String),

    #[error("application {application} does not exist in namespace {namespace}")]
    ApplicationNotFound {
        application: ApplicationName,
        namespace: String,
    },

    #[error("timeout waiting for {application} to sync after {attempts} attempts")]
    SyncTimeout {
        application: ApplicationName,
        attempts: u32,
    },

    #[error("admin credential unavailable: {0}")]
    Credential(String),

    #[error("promotion aborted before switching the active service")]
    PromotionAborted,

    /// Reading the operator's confirmation failed.
    #[error("confirmation prompt failed: {0}")]
    Confirm(#[source] std::io::Error),
}
