//! Test utilities for unit testing reconcilers
//!
//! This module provides helpers for creating test data and setting up test scenarios.

use crate::reconciler::{ReconcileSettings, Reconciler};
use crds::{Schedule, Scheduler, SchedulerSpec};
use k8s_openapi::api::batch::v1::{CronJob, CronJobStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use schedule_store::MockScheduleStore;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const TEST_NAMESPACE: &str = "default";

/// Helper to create a schedule entry running busybox
pub fn test_schedule(name: &str, cron_expression: &str) -> Schedule {
    Schedule {
        name: name.to_string(),
        image: "busybox:1.36".to_string(),
        cron_expression: cron_expression.to_string(),
        ..Default::default()
    }
}

/// Helper to create a Scheduler in the test namespace with a fresh uid
pub fn test_scheduler(name: &str, schedules: Vec<Schedule>) -> Scheduler {
    Scheduler {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(TEST_NAMESPACE.to_string()),
            uid: Some(uuid::Uuid::new_v4().to_string()),
            generation: Some(1),
            ..Default::default()
        },
        spec: SchedulerSpec { schedules },
        status: None,
    }
}

/// Reconciler over a shared mock store with default settings
pub fn test_reconciler(store: &MockScheduleStore) -> Reconciler {
    test_reconciler_with(store, ReconcileSettings::default())
}

pub fn test_reconciler_with(store: &MockScheduleStore, settings: ReconcileSettings) -> Reconciler {
    Reconciler::new(
        store.clone(),
        Arc::new(crds::ResourceRegistry::with_defaults()),
        settings,
        CancellationToken::new(),
    )
}

/// CronJob status as the CronJob controller reports it.
///
/// Times are RFC 3339 strings; `running` adds one active job.
pub fn cron_job_status(last_schedule: Option<&str>, last_success: Option<&str>, running: bool) -> CronJobStatus {
    let active = if running {
        json!([{"kind": "Job", "namespace": TEST_NAMESPACE, "name": "job-1"}])
    } else {
        json!([])
    };
    serde_json::from_value(json!({
        "active": active,
        "lastScheduleTime": last_schedule,
        "lastSuccessfulTime": last_success,
    }))
    .unwrap()
}

/// A CronJob not built by the reconciler, with the given labels and an
/// optional controller owner uid
pub fn unmanaged_cron_job(name: &str, labels: &[(&str, &str)], controller_uid: Option<&str>) -> CronJob {
    CronJob {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(TEST_NAMESPACE.to_string()),
            labels: Some(
                labels
                    .iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect::<BTreeMap<_, _>>(),
            ),
            owner_references: controller_uid.map(|uid| {
                vec![OwnerReference {
                    api_version: "scheduling.deesup.com/v1".to_string(),
                    kind: "Scheduler".to_string(),
                    name: "someone-else".to_string(),
                    uid: uid.to_string(),
                    controller: Some(true),
                    block_owner_deletion: Some(true),
                }]
            }),
            ..Default::default()
        },
        spec: Some(k8s_openapi::api::batch::v1::CronJobSpec {
            schedule: "0 0 * * *".to_string(),
            ..Default::default()
        }),
        status: None,
    }
}
