//! Orphan collection
//!
//! Deletes CronJobs this Scheduler owns that no schedule entry produces
//! anymore. Candidates are selected by the ownership labels and then
//! filtered by controller owner uid, so a CronJob that merely carries
//! matching labels is never touched.

use super::Reconciler;
use super::builder::controller_uid;
use crate::reconcile_helpers::ErrorLog;
use crds::{Scheduler, owned_children_selector};
use futures::{StreamExt, stream};
use k8s_openapi::api::batch::v1::CronJob;
use schedule_store::StoreError;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info, warn};

/// Result of one orphan collection
#[derive(Debug, Default)]
pub struct CleanupReport {
    /// Owned CronJobs still present after deletion, or `None` when they
    /// could not be listed
    pub survivors: Option<Vec<CronJob>>,
    /// Names of CronJobs removed in this pass
    pub deleted: Vec<String>,
    /// List and delete failures
    pub errors: ErrorLog,
}

impl Reconciler {
    /// Delete owned CronJobs whose key is not in `desired`.
    ///
    /// A CronJob already gone when deleted counts as removed. A failed
    /// delete is recorded and the CronJob stays in the survivor set.
    pub(crate) async fn collect_orphans(&self, scheduler: &Scheduler, desired: &BTreeSet<String>) -> CleanupReport {
        let mut report = CleanupReport::default();
        let namespace = scheduler.metadata.namespace.as_deref().unwrap_or_default();
        let parent = scheduler.metadata.name.as_deref().unwrap_or_default();
        let selector = owned_children_selector(&self.settings.controller_id, parent);

        let listed = match self.store.list_cron_jobs(namespace, &selector).await {
            Ok(listed) => listed,
            Err(e) => {
                warn!("Failed to list CronJobs of Scheduler {}/{}: {}", namespace, parent, e);
                report.errors.record(&format!("CronJobs of {namespace}/{parent}"), e);
                return report;
            }
        };

        let parent_uid = scheduler.metadata.uid.as_deref();
        let (owned, foreign): (Vec<CronJob>, Vec<CronJob>) = listed
            .into_iter()
            .partition(|cj| parent_uid.is_some() && controller_uid(cj) == parent_uid);
        for cj in &foreign {
            debug!(
                "Ignoring CronJob {}/{}: labels match but it is not controlled by this Scheduler",
                namespace,
                cj.metadata.name.as_deref().unwrap_or_default()
            );
        }

        let orphans: Vec<String> = owned
            .iter()
            .filter_map(|cj| cj.metadata.name.clone())
            .filter(|name| !desired.contains(name))
            .collect();

        let results: Vec<(String, Result<(), StoreError>)> = stream::iter(orphans)
            .map(|name| async move {
                let result = match self.store.delete_cron_job(namespace, &name).await {
                    Err(StoreError::NotFound(_)) => Ok(()),
                    other => other,
                };
                (name, result)
            })
            .buffered(self.settings.write_concurrency)
            .collect()
            .await;

        let mut removed = HashSet::new();
        for (name, result) in results {
            match result {
                Ok(()) => {
                    info!("Deleted orphaned CronJob {}/{}", namespace, name);
                    removed.insert(name.clone());
                    report.deleted.push(name);
                }
                Err(e) => {
                    warn!("Failed to delete CronJob {}/{}: {}", namespace, name, e);
                    report.errors.record(&format!("CronJob {namespace}/{name}"), e);
                }
            }
        }

        report.survivors = Some(
            owned
                .into_iter()
                .filter(|cj| !cj.metadata.name.as_ref().is_some_and(|n| removed.contains(n)))
                .collect(),
        );
        report
    }
}
