//! Mock store for unit testing
//!
//! This module provides an in-memory implementation of `ScheduleStoreTrait`
//! that can be used in unit tests without a running API server.
//!
//! The mock is organized by object type:
//! - `schedulers.rs` - Scheduler reads and status writes
//! - `cron_jobs.rs` - CronJob get/list/create/update/delete
//! - `selector.rs` - equality-based label selector matching
//!
//! Every successful write is recorded in a `WriteLog`, and individual
//! operations can be made to fail to exercise partial-failure paths.

mod cron_jobs;
mod schedulers;
mod selector;

use crate::error::StoreError;
use crate::store_trait::ScheduleStoreTrait;
use crds::{Scheduler, SchedulerSpec};
use k8s_openapi::api::batch::v1::{CronJob, CronJobStatus};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub use selector::matches_selector;

type ObjectKey = (String, String);

/// Successful writes observed by the mock, in call order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteLog {
    /// Names of created CronJobs
    pub created: Vec<String>,
    /// Names of updated CronJobs
    pub updated: Vec<String>,
    /// Names of deleted CronJobs
    pub deleted: Vec<String>,
    /// Names of Schedulers whose status was written
    pub status_updates: Vec<String>,
}

impl WriteLog {
    /// Total number of writes of any kind
    #[must_use]
    pub fn total(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len() + self.status_updates.len()
    }
}

#[derive(Debug, Default)]
pub(crate) struct Failures {
    pub(crate) get_scheduler: Option<String>,
    pub(crate) list_cron_jobs: Option<String>,
    pub(crate) status_conflict: bool,
    pub(crate) get_cron_job: HashSet<String>,
    pub(crate) stale_get_cron_job: HashSet<String>,
    pub(crate) get_scheduler_delay: Option<Duration>,
    pub(crate) create: HashSet<String>,
    pub(crate) update: HashSet<String>,
    pub(crate) delete: HashSet<String>,
}

/// Mock store for testing
///
/// Objects live in memory keyed by (namespace, name). Clones share state, so a
/// test can keep a handle while the reconciler owns another.
#[derive(Clone, Default)]
pub struct MockScheduleStore {
    pub(crate) schedulers: Arc<Mutex<BTreeMap<ObjectKey, Scheduler>>>,
    pub(crate) cron_jobs: Arc<Mutex<BTreeMap<ObjectKey, CronJob>>>,
    pub(crate) failures: Arc<Mutex<Failures>>,
    pub(crate) writes: Arc<Mutex<WriteLog>>,
    pub(crate) next_version: Arc<Mutex<u64>>,
}

impl std::fmt::Debug for MockScheduleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockScheduleStore")
            .field("schedulers", &self.schedulers.lock().unwrap().len())
            .field("cron_jobs", &self.cron_jobs.lock().unwrap().len())
            .finish_non_exhaustive()
    }
}

pub(crate) fn key(namespace: &str, name: &str) -> ObjectKey {
    (namespace.to_string(), name.to_string())
}

impl MockScheduleStore {
    /// Create an empty mock store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next resourceVersion
    pub(crate) fn next_version(&self) -> String {
        let mut version = self.next_version.lock().unwrap();
        *version += 1;
        version.to_string()
    }

    pub(crate) fn new_uid() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Add a Scheduler (for test setup). Missing uid, generation and
    /// resourceVersion are filled in the way an API server would.
    pub fn add_scheduler(&self, mut scheduler: Scheduler) -> Scheduler {
        let namespace = scheduler.metadata.namespace.clone().unwrap_or_else(|| "default".to_string());
        let name = scheduler.metadata.name.clone().unwrap_or_default();
        scheduler.metadata.namespace = Some(namespace.clone());
        scheduler.metadata.uid.get_or_insert_with(Self::new_uid);
        scheduler.metadata.generation.get_or_insert(1);
        scheduler.metadata.resource_version = Some(self.next_version());
        self.schedulers
            .lock()
            .unwrap()
            .insert(key(&namespace, &name), scheduler.clone());
        scheduler
    }

    /// Replace a Scheduler's spec and bump its generation (for test setup)
    pub fn set_scheduler_spec(&self, namespace: &str, name: &str, spec: SchedulerSpec) {
        let version = self.next_version();
        let mut schedulers = self.schedulers.lock().unwrap();
        if let Some(scheduler) = schedulers.get_mut(&key(namespace, name)) {
            scheduler.spec = spec;
            scheduler.metadata.generation = Some(scheduler.metadata.generation.unwrap_or(0) + 1);
            scheduler.metadata.resource_version = Some(version);
        }
    }

    /// Current copy of a Scheduler
    #[must_use]
    pub fn scheduler(&self, namespace: &str, name: &str) -> Option<Scheduler> {
        self.schedulers.lock().unwrap().get(&key(namespace, name)).cloned()
    }

    /// Remove a Scheduler without touching its children (for test setup)
    pub fn remove_scheduler(&self, namespace: &str, name: &str) {
        self.schedulers.lock().unwrap().remove(&key(namespace, name));
    }

    /// Add a CronJob (for test setup), bypassing the write log
    pub fn add_cron_job(&self, mut cron_job: CronJob) -> CronJob {
        let namespace = cron_job.metadata.namespace.clone().unwrap_or_else(|| "default".to_string());
        let name = cron_job.metadata.name.clone().unwrap_or_default();
        cron_job.metadata.namespace = Some(namespace.clone());
        cron_job.metadata.uid.get_or_insert_with(Self::new_uid);
        cron_job.metadata.resource_version = Some(self.next_version());
        self.cron_jobs
            .lock()
            .unwrap()
            .insert(key(&namespace, &name), cron_job.clone());
        cron_job
    }

    /// Current copy of a CronJob
    #[must_use]
    pub fn cron_job(&self, namespace: &str, name: &str) -> Option<CronJob> {
        self.cron_jobs.lock().unwrap().get(&key(namespace, name)).cloned()
    }

    /// Names of all CronJobs in a namespace, sorted
    #[must_use]
    pub fn cron_job_names(&self, namespace: &str) -> Vec<String> {
        self.cron_jobs
            .lock()
            .unwrap()
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Overwrite a CronJob's status, as the CronJob controller would
    pub fn set_cron_job_status(&self, namespace: &str, name: &str, status: CronJobStatus) {
        if let Some(cron_job) = self.cron_jobs.lock().unwrap().get_mut(&key(namespace, name)) {
            cron_job.status = Some(status);
        }
    }

    /// Make `get_scheduler` fail with `Unavailable`
    pub fn fail_get_scheduler(&self, message: impl Into<String>) {
        self.failures.lock().unwrap().get_scheduler = Some(message.into());
    }

    /// Make `list_cron_jobs` fail with `Unavailable`
    pub fn fail_list_cron_jobs(&self, message: impl Into<String>) {
        self.failures.lock().unwrap().list_cron_jobs = Some(message.into());
    }

    /// Make every status write fail with `Conflict`
    pub fn conflict_on_status_update(&self, enabled: bool) {
        self.failures.lock().unwrap().status_conflict = enabled;
    }

    /// Make `get_cron_job` fail with `Unavailable` for one name
    pub fn fail_get_cron_job(&self, name: impl Into<String>) {
        self.failures.lock().unwrap().get_cron_job.insert(name.into());
    }

    /// Make the next `get_cron_job` for one name report `NotFound` even
    /// though the object exists, as a lagging cache would
    pub fn stale_get_cron_job_once(&self, name: impl Into<String>) {
        self.failures.lock().unwrap().stale_get_cron_job.insert(name.into());
    }

    /// Make every `get_scheduler` wait `delay` before answering
    pub fn delay_get_scheduler(&self, delay: Duration) {
        self.failures.lock().unwrap().get_scheduler_delay = Some(delay);
    }

    /// Make `create_cron_job` reject one name with `Invalid`
    pub fn fail_create(&self, name: impl Into<String>) {
        self.failures.lock().unwrap().create.insert(name.into());
    }

    /// Make `update_cron_job` reject one name with `Invalid`
    pub fn fail_update(&self, name: impl Into<String>) {
        self.failures.lock().unwrap().update.insert(name.into());
    }

    /// Make `delete_cron_job` fail with `Unavailable` for one name
    pub fn fail_delete(&self, name: impl Into<String>) {
        self.failures.lock().unwrap().delete.insert(name.into());
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        *self.failures.lock().unwrap() = Failures::default();
    }

    /// Snapshot of the writes seen so far
    #[must_use]
    pub fn writes(&self) -> WriteLog {
        self.writes.lock().unwrap().clone()
    }

    /// Forget recorded writes
    pub fn reset_writes(&self) {
        *self.writes.lock().unwrap() = WriteLog::default();
    }
}

#[async_trait::async_trait]
impl ScheduleStoreTrait for MockScheduleStore {
    async fn get_scheduler(&self, namespace: &str, name: &str) -> Result<Scheduler, StoreError> {
        schedulers::get_scheduler(self, namespace, name).await
    }

    async fn update_scheduler_status(&self, scheduler: &Scheduler) -> Result<Scheduler, StoreError> {
        schedulers::update_scheduler_status(self, scheduler).await
    }

    async fn get_cron_job(&self, namespace: &str, name: &str) -> Result<CronJob, StoreError> {
        cron_jobs::get_cron_job(self, namespace, name).await
    }

    async fn list_cron_jobs(&self, namespace: &str, label_selector: &str) -> Result<Vec<CronJob>, StoreError> {
        cron_jobs::list_cron_jobs(self, namespace, label_selector).await
    }

    async fn create_cron_job(&self, cron_job: &CronJob) -> Result<CronJob, StoreError> {
        cron_jobs::create_cron_job(self, cron_job).await
    }

    async fn update_cron_job(&self, cron_job: &CronJob) -> Result<CronJob, StoreError> {
        cron_jobs::update_cron_job(self, cron_job).await
    }

    async fn delete_cron_job(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        cron_jobs::delete_cron_job(self, namespace, name).await
    }
}
