//! Scheduler CRD Definitions
//!
//! Kubernetes Custom Resource Definitions and shared status types for the
//! scheduler controller, plus the registry of resource kinds it handles.

pub mod conditions;
pub mod error;
pub mod references;
pub mod registry;
pub mod scheduler;

pub use conditions::*;
pub use error::RegistryError;
pub use references::*;
pub use registry::{ResourceKind, ResourceRegistry};
pub use scheduler::*;
