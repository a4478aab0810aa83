//! Child synchronizer
//!
//! Makes one CronJob per schedule entry exist with the desired owned fields.
//! Entries are independent: a failure on one is recorded and the others
//! still run. Writes for different entries run concurrently, bounded by the
//! configured write concurrency.

use super::Reconciler;
use super::builder::{apply_owned_fields, build_cron_job, controller_uid, owned_fields_match};
use crate::error::ControllerError;
use crate::reconcile_helpers::ErrorLog;
use crds::{Schedule, Scheduler};
use futures::{StreamExt, stream};
use k8s_openapi::api::batch::v1::CronJob;
use schedule_store::StoreError;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

/// What happened to one entry's CronJob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// No CronJob existed; one was created
    Created,
    /// The owned fields drifted and were rewritten
    Updated,
    /// Already matched; nothing was written
    Unchanged,
}

/// Result of synchronizing every entry of one Scheduler
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Child keys named by `spec.schedules`, including entries whose write failed
    pub desired: BTreeSet<String>,
    /// CronJobs created this pass
    pub created: Vec<String>,
    /// CronJobs updated in place this pass
    pub updated: Vec<String>,
    /// CronJobs left untouched
    pub unchanged: Vec<String>,
    /// Per-entry failures
    pub errors: ErrorLog,
}

impl Reconciler {
    /// Create or update the CronJob of every schedule entry.
    ///
    /// A repeated entry name is an error; only its first occurrence is
    /// synchronized. Its key still lands in `desired`, so the collector
    /// never deletes a CronJob that `spec.schedules` still names.
    pub(crate) async fn sync_schedules(&self, scheduler: &Scheduler) -> SyncReport {
        let mut report = SyncReport::default();
        let namespace = scheduler.metadata.namespace.as_deref().unwrap_or_default();
        let mut seen = HashSet::new();
        let mut entries = Vec::new();

        for schedule in &scheduler.spec.schedules {
            let child = scheduler.child_name(schedule);
            report.desired.insert(child.clone());
            if seen.insert(schedule.name.as_str()) {
                entries.push((child, schedule.clone()));
            } else {
                report.errors.record(
                    &format!("Schedule {}", schedule.name),
                    "duplicate schedule name, only the first entry is applied",
                );
            }
        }

        // Entries are owned so the buffered futures borrow nothing from the
        // closure argument; kube_runtime needs them Send for any lifetime.
        let results: Vec<(String, Result<SyncAction, ControllerError>)> = stream::iter(entries)
            .map(|(child, schedule): (String, Schedule)| async move {
                let result = self.sync_entry(scheduler, &schedule).await;
                (child, result)
            })
            .buffered(self.settings.write_concurrency)
            .collect()
            .await;

        for (child, result) in results {
            match result {
                Ok(SyncAction::Created) => report.created.push(child),
                Ok(SyncAction::Updated) => report.updated.push(child),
                Ok(SyncAction::Unchanged) => report.unchanged.push(child),
                Err(e) => {
                    warn!("Failed to sync CronJob {}/{}: {}", namespace, child, e);
                    report.errors.record(&format!("CronJob {namespace}/{child}"), e);
                }
            }
        }
        report
    }

    async fn sync_entry(&self, scheduler: &Scheduler, schedule: &Schedule) -> Result<SyncAction, ControllerError> {
        let desired = build_cron_job(&self.registry, &self.settings.controller_id, scheduler, schedule)?;
        let namespace = desired.metadata.namespace.as_deref().unwrap_or_default();
        let name = desired.metadata.name.as_deref().unwrap_or_default();

        match self.store.get_cron_job(namespace, name).await {
            Ok(existing) => self.converge_existing(&desired, &existing).await,
            Err(StoreError::NotFound(_)) => match self.store.create_cron_job(&desired).await {
                Ok(_) => {
                    info!("Created CronJob {}/{} ({})", namespace, name, schedule.cron_expression);
                    Ok(SyncAction::Created)
                }
                Err(StoreError::AlreadyExists(_)) => {
                    // Lost a create race; converge whatever won it.
                    debug!("CronJob {}/{} appeared concurrently, updating instead", namespace, name);
                    let existing = self.store.get_cron_job(namespace, name).await?;
                    self.converge_existing(&desired, &existing).await
                }
                Err(e) => Err(e.into()),
            },
            Err(e) => Err(e.into()),
        }
    }

    async fn converge_existing(&self, desired: &CronJob, existing: &CronJob) -> Result<SyncAction, ControllerError> {
        let namespace = desired.metadata.namespace.as_deref().unwrap_or_default();
        let name = desired.metadata.name.as_deref().unwrap_or_default();

        let owner_uid = controller_uid(desired);
        if let Some(foreign) = controller_uid(existing).filter(|uid| Some(*uid) != owner_uid) {
            return Err(ControllerError::OwnershipConflict(format!(
                "CronJob {namespace}/{name} is controlled by another owner (uid {foreign})"
            )));
        }

        if owned_fields_match(desired, existing) {
            debug!("CronJob {}/{} already up to date", namespace, name);
            return Ok(SyncAction::Unchanged);
        }

        self.store.update_cron_job(&apply_owned_fields(existing, desired)).await?;
        info!("Updated CronJob {}/{}", namespace, name);
        Ok(SyncAction::Updated)
    }
}
