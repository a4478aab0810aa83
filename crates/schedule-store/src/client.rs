//! Kubernetes-backed store
//!
//! Implements `ScheduleStoreTrait` with `kube::Api`. API status codes are
//! folded into the store's error taxonomy so callers never inspect raw
//! Kubernetes errors.

use crate::error::StoreError;
use crate::store_trait::ScheduleStoreTrait;
use crds::Scheduler;
use k8s_openapi::api::batch::v1::CronJob;
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::{Api, Client};
use serde_json::{Value, json};
use tracing::debug;

/// Store backed by a Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl std::fmt::Debug for KubeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeStore").finish_non_exhaustive()
    }
}

impl KubeStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn schedulers(&self, namespace: &str) -> Api<Scheduler> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn cron_jobs(&self, namespace: &str) -> Api<CronJob> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Maps API status codes onto `StoreError` variants
pub(crate) fn map_kube_error(err: kube::Error, object: &str) -> StoreError {
    if let kube::Error::Api(response) = &err {
        match response.code {
            404 => return StoreError::NotFound(object.to_string()),
            409 if response.reason == "AlreadyExists" => {
                return StoreError::AlreadyExists(object.to_string());
            }
            409 => return StoreError::Conflict(format!("{object}: {}", response.message)),
            422 => return StoreError::Invalid(format!("{object}: {}", response.message)),
            429 | 500..=599 => {
                return StoreError::Unavailable(format!("{object}: {}", response.message));
            }
            _ => {}
        }
    }
    StoreError::Kube(err)
}

fn object_key(namespace: Option<&str>, name: Option<&str>) -> Result<(String, String), StoreError> {
    match (namespace, name) {
        (Some(ns), Some(name)) => Ok((ns.to_string(), name.to_string())),
        _ => Err(StoreError::Invalid(
            "object is missing metadata.namespace or metadata.name".to_string(),
        )),
    }
}

/// Merge patch writing `scheduler.status`.
///
/// A merge patch leaves absent keys untouched, so cleared scalar fields go
/// out as explicit nulls. resourceVersion, when known, turns the write into
/// a compare-and-swap.
pub(crate) fn status_patch(scheduler: &Scheduler) -> Result<Value, StoreError> {
    let mut status = serde_json::to_value(&scheduler.status)?;
    if let Some(fields) = status.as_object_mut() {
        for key in ["observedGeneration", "lastScheduleTime"] {
            fields.entry(key).or_insert(Value::Null);
        }
    }
    Ok(match &scheduler.metadata.resource_version {
        Some(rv) => json!({ "metadata": { "resourceVersion": rv }, "status": status }),
        None => json!({ "status": status }),
    })
}

#[async_trait::async_trait]
impl ScheduleStoreTrait for KubeStore {
    async fn get_scheduler(&self, namespace: &str, name: &str) -> Result<Scheduler, StoreError> {
        debug!("GET Scheduler {}/{}", namespace, name);
        self.schedulers(namespace)
            .get(name)
            .await
            .map_err(|e| map_kube_error(e, &format!("Scheduler {namespace}/{name}")))
    }

    async fn update_scheduler_status(&self, scheduler: &Scheduler) -> Result<Scheduler, StoreError> {
        let (namespace, name) = object_key(
            scheduler.metadata.namespace.as_deref(),
            scheduler.metadata.name.as_deref(),
        )?;
        debug!("PATCH Scheduler {}/{} status", namespace, name);

        let patch = status_patch(scheduler)?;

        self.schedulers(&namespace)
            .patch_status(&name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| map_kube_error(e, &format!("Scheduler {namespace}/{name}")))
    }

    async fn get_cron_job(&self, namespace: &str, name: &str) -> Result<CronJob, StoreError> {
        debug!("GET CronJob {}/{}", namespace, name);
        self.cron_jobs(namespace)
            .get(name)
            .await
            .map_err(|e| map_kube_error(e, &format!("CronJob {namespace}/{name}")))
    }

    async fn list_cron_jobs(&self, namespace: &str, label_selector: &str) -> Result<Vec<CronJob>, StoreError> {
        debug!("LIST CronJobs in {} matching {}", namespace, label_selector);
        let list = self
            .cron_jobs(namespace)
            .list(&ListParams::default().labels(label_selector))
            .await
            .map_err(|e| map_kube_error(e, &format!("CronJobs in {namespace}")))?;
        Ok(list.items)
    }

    async fn create_cron_job(&self, cron_job: &CronJob) -> Result<CronJob, StoreError> {
        let (namespace, name) = object_key(
            cron_job.metadata.namespace.as_deref(),
            cron_job.metadata.name.as_deref(),
        )?;
        debug!("CREATE CronJob {}/{}", namespace, name);
        self.cron_jobs(&namespace)
            .create(&PostParams::default(), cron_job)
            .await
            .map_err(|e| map_kube_error(e, &format!("CronJob {namespace}/{name}")))
    }

    async fn update_cron_job(&self, cron_job: &CronJob) -> Result<CronJob, StoreError> {
        let (namespace, name) = object_key(
            cron_job.metadata.namespace.as_deref(),
            cron_job.metadata.name.as_deref(),
        )?;
        debug!("REPLACE CronJob {}/{}", namespace, name);
        self.cron_jobs(&namespace)
            .replace(&name, &PostParams::default(), cron_job)
            .await
            .map_err(|e| map_kube_error(e, &format!("CronJob {namespace}/{name}")))
    }

    async fn delete_cron_job(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        debug!("DELETE CronJob {}/{}", namespace, name);
        self.cron_jobs(namespace)
            .delete(name, &DeleteParams::background())
            .await
            .map(|_| ())
            .map_err(|e| map_kube_error(e, &format!("CronJob {namespace}/{name}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crds::{SchedulerSpec, SchedulerStatus};

    #[test]
    fn test_status_patch_nulls_cleared_fields() {
        let mut scheduler = Scheduler::new("nightly", SchedulerSpec::default());
        scheduler.metadata.resource_version = Some("12".to_string());
        scheduler.status = Some(SchedulerStatus::default());

        let patch = status_patch(&scheduler).unwrap();

        assert_eq!(patch["metadata"]["resourceVersion"], "12");
        assert_eq!(patch["status"]["lastScheduleTime"], Value::Null);
        assert_eq!(patch["status"]["observedGeneration"], Value::Null);
        assert_eq!(patch["status"]["active"], json!([]));
    }

    #[test]
    fn test_status_patch_without_resource_version() {
        let mut scheduler = Scheduler::new("nightly", SchedulerSpec::default());
        scheduler.status = Some(SchedulerStatus {
            observed_generation: Some(3),
            ..Default::default()
        });

        let patch = status_patch(&scheduler).unwrap();

        assert!(patch.get("metadata").is_none());
        assert_eq!(patch["status"]["observedGeneration"], 3);
    }
}
