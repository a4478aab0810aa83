//! Store errors

use thiserror::Error;

/// Errors that can occur when reading or writing the object store
#[derive(Debug, Error)]
pub enum StoreError {
    /// Object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Create collided with an existing object
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Optimistic concurrency check failed
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store rejected the object (validation failure, missing metadata)
    #[error("Invalid object: {0}")]
    Invalid(String),

    /// Store temporarily unable to serve the request (timeouts, 5xx, throttling)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other Kubernetes API or transport failure
    #[error("Kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}
