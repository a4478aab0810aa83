//! Controller-specific error types.
//!
//! This module defines error types specific to the Scheduler Controller
//! that are not covered by upstream library errors. Every variant is either
//! retryable or, for `InvalidConfig`, a startup failure.

use crds::RegistryError;
use kube::Error as KubeError;
use schedule_store::StoreError;
use thiserror::Error;

/// Errors that can occur in the Scheduler Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Object store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Resource kind lookup failed
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Schedule entry could not be converted to a CronJob
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Scheduler lacks metadata the reconciler depends on
    #[error("Invalid Scheduler: {0}")]
    InvalidResource(String),

    /// Child object is controlled by a different owner
    #[error("Ownership conflict: {0}")]
    OwnershipConflict(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invocation cancelled or timed out before the status write
    #[error("Reconciliation cancelled: {0}")]
    Cancelled(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
