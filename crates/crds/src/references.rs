//! Kubernetes object references for managed children
//!
//! Follows the Kubernetes `ObjectReference` shape (apiVersion, kind, namespace,
//! name, uid) but keeps only the fields the Scheduler status reports.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to a managed CronJob listed in `status.active`
///
/// Ordering is by name first so that a sorted `active` list is stable across
/// reconciliations.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub struct ChildReference {
    /// Name of the referenced object
    pub name: String,

    /// Namespace of the referenced object
    pub namespace: String,

    /// API version of the referenced object (e.g. "batch/v1")
    pub api_version: String,

    /// Kind of the referenced object (e.g. "CronJob")
    pub kind: String,

    /// Object uid, when the store has assigned one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

impl ChildReference {
    /// Reference to a `batch/v1` CronJob
    pub fn cron_job(namespace: impl Into<String>, name: impl Into<String>, uid: Option<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            api_version: "batch/v1".to_string(),
            kind: "CronJob".to_string(),
            uid,
        }
    }
}
