//! Reconciliation logic for Scheduler resources.
//!
//! One pass per Scheduler, in four stages:
//! - `sync`: create or update one CronJob per schedule entry
//! - `cleanup`: delete owned CronJobs no entry asks for anymore
//! - `status`: derive the Scheduler status from the surviving CronJobs
//! - status write, only when the derived status differs from the stored one
//!
//! Per-entry failures never abort a pass; they are collected and reported
//! through the `Ready` condition, and the pass is retried later.

pub mod builder;
pub mod cleanup;
pub mod status;
pub mod sync;

#[cfg(test)]
mod builder_test;
#[cfg(test)]
mod status_test;

use crate::backoff::BackoffTracker;
use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::reconcile_helpers::{ErrorLog, status_needs_update};
use chrono::Utc;
use crds::ResourceRegistry;
use kube_runtime::controller::Action;
use schedule_store::{ScheduleStoreTrait, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Settings a reconciliation pass depends on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileSettings {
    /// Value of the `app` label on every managed CronJob
    pub controller_id: String,
    /// Requeue delay after a pass that recorded errors
    pub requeue_after: Duration,
    /// Upper bound on one pass
    pub reconcile_timeout: Duration,
    /// Concurrent CronJob writes within one pass
    pub write_concurrency: usize,
}

impl From<&ControllerConfig> for ReconcileSettings {
    fn from(config: &ControllerConfig) -> Self {
        Self {
            controller_id: config.controller_id.clone(),
            requeue_after: config.requeue_after,
            reconcile_timeout: config.reconcile_timeout,
            write_concurrency: config.write_concurrency.max(1),
        }
    }
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        Self::from(&ControllerConfig::default())
    }
}

/// Result of one completed pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The Scheduler no longer exists; its CronJobs are left to the
    /// garbage collector through their owner references
    Deleted,
    /// Every entry converged
    Converged,
    /// The pass completed with recorded errors
    RetryAfter(Duration),
}

impl ReconcileOutcome {
    /// What the controller runtime should do next
    #[must_use]
    pub fn into_action(self) -> Action {
        match self {
            Self::Deleted | Self::Converged => Action::await_change(),
            Self::RetryAfter(delay) => Action::requeue(delay),
        }
    }
}

/// Reconciles Scheduler resources into CronJobs.
pub struct Reconciler {
    pub(crate) store: Box<dyn ScheduleStoreTrait>,
    pub(crate) registry: Arc<ResourceRegistry>,
    pub(crate) settings: ReconcileSettings,
    shutdown: CancellationToken,
    backoff: BackoffTracker,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("settings", &self.settings)
            .field("registry", &self.registry)
            .field("shutdown", &self.shutdown.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Creates a reconciler over `store`; `shutdown` cancels in-flight passes
    pub fn new(
        store: impl ScheduleStoreTrait + 'static,
        registry: Arc<ResourceRegistry>,
        settings: ReconcileSettings,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            store: Box::new(store),
            registry,
            settings,
            shutdown,
            backoff: BackoffTracker::default(),
        }
    }

    /// Next requeue delay for a Scheduler whose pass failed outright
    pub fn backoff_for(&self, resource_key: &str) -> Duration {
        self.backoff.next_for(resource_key)
    }

    /// Forget the failure history of a Scheduler
    pub fn reset_backoff(&self, resource_key: &str) {
        self.backoff.reset(resource_key);
    }

    /// Runs one pass for `namespace/name`, cancelled on controller shutdown
    pub async fn reconcile_scheduler(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<ReconcileOutcome, ControllerError> {
        let cancel = self.shutdown.child_token();
        self.reconcile(namespace, name, &cancel).await
    }

    /// Runs one pass, bounded by the reconcile timeout and `cancel`.
    ///
    /// Cancellation observed before the status write returns
    /// `ControllerError::Cancelled` without writing status. CronJob writes
    /// already made stay in place; the next pass converges from there.
    pub async fn reconcile(
        &self,
        namespace: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<ReconcileOutcome, ControllerError> {
        let timeout = self.settings.reconcile_timeout;
        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(ControllerError::Cancelled(format!(
                "Scheduler {namespace}/{name}: shutdown requested"
            ))),
            result = tokio::time::timeout(timeout, self.run_pass(namespace, name, cancel)) => {
                result.map_err(|_| ControllerError::Cancelled(format!(
                    "Scheduler {namespace}/{name}: pass exceeded {}s", timeout.as_secs()
                )))?
            }
        }
    }

    async fn run_pass(
        &self,
        namespace: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<ReconcileOutcome, ControllerError> {
        let scheduler = match self.store.get_scheduler(namespace, name).await {
            Ok(scheduler) => scheduler,
            Err(StoreError::NotFound(_)) => {
                info!("Scheduler {}/{} not found, nothing to reconcile", namespace, name);
                return Ok(ReconcileOutcome::Deleted);
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "Reconciling Scheduler {}/{} ({} schedule(s), generation {:?})",
            namespace,
            name,
            scheduler.spec.schedules.len(),
            scheduler.metadata.generation
        );

        let sync = self.sync_schedules(&scheduler).await;
        let cleanup = self.collect_orphans(&scheduler, &sync.desired).await;

        let mut errors = ErrorLog::new();
        errors.extend(sync.errors);
        errors.extend(cleanup.errors);

        let status = status::aggregate_status(&scheduler, cleanup.survivors.as_deref(), &errors, Utc::now());

        if cancel.is_cancelled() {
            return Err(ControllerError::Cancelled(format!(
                "Scheduler {namespace}/{name}: shutdown requested before status write"
            )));
        }

        if status_needs_update(scheduler.status.as_ref(), &status) {
            let mut updated = scheduler.clone();
            updated.status = Some(status);
            self.store.update_scheduler_status(&updated).await?;
            info!("Updated status of Scheduler {}/{}", namespace, name);
        } else {
            debug!("Scheduler {}/{} already has correct status, skipping update", namespace, name);
        }

        info!(
            "Scheduler {}/{}: {} created, {} updated, {} unchanged, {} deleted",
            namespace,
            name,
            sync.created.len(),
            sync.updated.len(),
            sync.unchanged.len(),
            cleanup.deleted.len()
        );

        if errors.is_empty() {
            Ok(ReconcileOutcome::Converged)
        } else {
            warn!("Scheduler {}/{}: {}", namespace, name, errors.summary());
            for error in errors.iter() {
                debug!("Scheduler {}/{} error: {}", namespace, name, error);
            }
            Ok(ReconcileOutcome::RetryAfter(self.settings.requeue_after))
        }
    }
}
