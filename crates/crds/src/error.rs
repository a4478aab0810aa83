//! CRD crate errors

use thiserror::Error;

/// Errors raised when resolving resource kinds through the registry
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The kind was never registered
    #[error("Resource kind not registered: {0}")]
    UnknownKind(String),

    /// The owner object lacks metadata required for an owner reference
    #[error("Owner {kind} is missing {field}")]
    MissingOwnerField {
        /// Kind of the owner object
        kind: String,
        /// Missing metadata field (name or uid)
        field: &'static str,
    },
}
