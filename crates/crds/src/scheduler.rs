//! Scheduler CRD
//!
//! A `Scheduler` lists the recurring jobs a team wants to run. The controller
//! turns every entry in `spec.schedules` into one `batch/v1` CronJob named
//! `<scheduler>-<schedule>`.

use crate::conditions::Condition;
use crate::references::ChildReference;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Label carrying the controller id on every managed CronJob
pub const APP_LABEL: &str = "app";

/// Label carrying the owning Scheduler's name
pub const PARENT_LABEL: &str = "parent";

/// Label carrying the schedule entry name
pub const SCHEDULE_LABEL: &str = "schedule";

/// Condition type reported on every Scheduler
pub const READY_CONDITION: &str = "Ready";

#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[kube(
    group = "scheduling.deesup.com",
    version = "v1",
    kind = "Scheduler",
    shortname = "sched",
    namespaced,
    status = "SchedulerStatus",
    printcolumn = r#"{"name": "Ready", "type": "string", "jsonPath": ".status.conditions[?(@.type==\"Ready\")].status"}"#,
    printcolumn = r#"{"name": "Last Schedule", "type": "date", "jsonPath": ".status.lastScheduleTime"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerSpec {
    /// Scheduled jobs to run. Names must be unique within one Scheduler.
    #[serde(default)]
    pub schedules: Vec<Schedule>,
}

/// One desired recurring job
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// Unique name within the Scheduler; combined with the Scheduler name to
    /// form the CronJob name
    pub name: String,

    /// Container image to run
    pub image: String,

    /// Cron expression passed through to the CronJob unchanged
    pub cron_expression: String,

    /// Command line arguments for the container
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<String>,

    /// Environment variables for the container
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<ScheduleEnvVar>,

    /// ConfigMaps and Secrets injected wholesale into the environment
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env_from: Vec<ScheduleEnvFrom>,
}

/// One environment variable for the job container
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEnvVar {
    /// Variable name
    pub name: String,

    /// Literal value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Value read from a ConfigMap or Secret key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_from: Option<EnvValueSource>,
}

/// Where a variable's value comes from when it is not a literal
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EnvValueSource {
    /// Key of a ConfigMap in the Scheduler's namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map_key_ref: Option<KeySelector>,

    /// Key of a Secret in the Scheduler's namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key_ref: Option<KeySelector>,
}

/// Selects one key of a ConfigMap or Secret
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeySelector {
    /// ConfigMap or Secret name
    pub name: String,
    /// Key within it
    pub key: String,
    /// Whether a missing object or key is tolerated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

/// Injects every key of a ConfigMap or Secret as variables
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEnvFrom {
    /// Prefix prepended to every injected variable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// ConfigMap to read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_map_ref: Option<SourceRef>,

    /// Secret to read
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ref: Option<SourceRef>,
}

/// Names a whole ConfigMap or Secret
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    /// Object name
    pub name: String,
    /// Whether a missing object is tolerated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

/// Observed state of a Scheduler
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    /// Generation of the spec this status was computed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Most recent time any managed CronJob was scheduled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_schedule_time: Option<chrono::DateTime<chrono::Utc>>,

    /// Managed CronJobs with a job currently running, sorted by name
    #[serde(default)]
    pub active: Vec<ChildReference>,

    /// Conditions keyed by type
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Scheduler {
    /// Name of the CronJob derived from one schedule entry
    #[must_use]
    pub fn child_name(&self, schedule: &Schedule) -> String {
        child_name(self.metadata.name.as_deref().unwrap_or_default(), &schedule.name)
    }

    /// Current `Ready` condition, if any was reported
    #[must_use]
    pub fn ready_condition(&self) -> Option<&Condition> {
        self.status
            .as_ref()
            .and_then(|s| crate::conditions::find_condition(&s.conditions, READY_CONDITION))
    }
}

/// Child key: `<scheduler>-<schedule>`
#[must_use]
pub fn child_name(scheduler: &str, schedule: &str) -> String {
    format!("{scheduler}-{schedule}")
}

/// Selector matching every CronJob a controller manages for one Scheduler
#[must_use]
pub fn owned_children_selector(controller_id: &str, scheduler: &str) -> String {
    format!("{APP_LABEL}={controller_id},{PARENT_LABEL}={scheduler}")
}
