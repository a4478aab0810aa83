//! ScheduleStoreTrait for mocking
//!
//! This trait abstracts the object store to enable mocking in unit tests.
//! `KubeStore` implements it against the Kubernetes API; tests use
//! `MockScheduleStore` behind the `test-util` feature.

use crate::error::StoreError;
use crds::Scheduler;
use k8s_openapi::api::batch::v1::CronJob;

/// Store operations consumed by the scheduler reconciler
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ScheduleStoreTrait: Send + Sync {
    // Scheduler Operations
    async fn get_scheduler(&self, namespace: &str, name: &str) -> Result<Scheduler, StoreError>;
    /// Writes `scheduler.status` through the status subresource, guarded by
    /// `scheduler.metadata.resourceVersion` when present
    async fn update_scheduler_status(&self, scheduler: &Scheduler) -> Result<Scheduler, StoreError>;

    // CronJob Operations
    async fn get_cron_job(&self, namespace: &str, name: &str) -> Result<CronJob, StoreError>;
    async fn list_cron_jobs(&self, namespace: &str, label_selector: &str) -> Result<Vec<CronJob>, StoreError>;
    async fn create_cron_job(&self, cron_job: &CronJob) -> Result<CronJob, StoreError>;
    async fn update_cron_job(&self, cron_job: &CronJob) -> Result<CronJob, StoreError>;
    async fn delete_cron_job(&self, namespace: &str, name: &str) -> Result<(), StoreError>;
}
