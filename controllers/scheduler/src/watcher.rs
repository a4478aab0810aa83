//! Kubernetes resource watchers.
//!
//! Watches Scheduler resources and the CronJobs they own, and triggers
//! reconciliation using kube_runtime::Controller. A change to an owned
//! CronJob (status update, manual edit, deletion) re-queues its parent
//! through the controller owner reference.

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crds::{APP_LABEL, Scheduler};
use futures::StreamExt;
use k8s_openapi::api::batch::v1::CronJob;
use kube::{Api, ResourceExt};
use kube_runtime::{Controller, controller::{Action, Config as RuntimeConfig}, watcher};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

fn resource_key(obj: &Scheduler) -> String {
    format!("{}/{}", obj.namespace().unwrap_or_default(), obj.name_any())
}

/// Watches Scheduler resources for changes.
pub struct Watcher {
    reconciler: Arc<Reconciler>,
    scheduler_api: Api<Scheduler>,
    cron_job_api: Api<CronJob>,
    config: ControllerConfig,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("reconciler", &self.reconciler)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Watcher {
    /// Creates a new watcher instance.
    pub fn new(
        reconciler: Arc<Reconciler>,
        scheduler_api: Api<Scheduler>,
        cron_job_api: Api<CronJob>,
        config: ControllerConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            reconciler,
            scheduler_api,
            cron_job_api,
            config,
            shutdown,
        }
    }

    /// Runs the Scheduler controller until shutdown is requested.
    ///
    /// Reconnection after watch errors is handled by the runtime. Failed
    /// passes requeue with a per-Scheduler Fibonacci backoff; a successful
    /// pass resets it.
    pub async fn watch_schedulers(self) -> Result<(), ControllerError> {
        info!("Starting Scheduler watcher");

        let error_policy = |obj: Arc<Scheduler>, error: &ControllerError, ctx: Arc<Reconciler>| {
            let key = resource_key(&obj);
            let delay = ctx.backoff_for(&key);
            error!("Reconciliation error for Scheduler {}: {} (retrying in {:?})", key, error, delay);
            Action::requeue(delay)
        };

        let reconcile = |obj: Arc<Scheduler>, ctx: Arc<Reconciler>| async move {
            let key = resource_key(&obj);
            debug!("Reconciling Scheduler {}", key);
            let outcome = ctx
                .reconcile_scheduler(&obj.namespace().unwrap_or_default(), &obj.name_any())
                .await?;
            ctx.reset_backoff(&key);
            Ok::<Action, ControllerError>(outcome.into_action())
        };

        // Only CronJobs stamped with this controller's id can be children
        let owned_selector = format!("{APP_LABEL}={}", self.config.controller_id);
        let runtime_config = RuntimeConfig::default()
            .debounce(self.config.debounce)
            .concurrency(self.config.concurrency);
        let shutdown = self.shutdown.clone();

        Controller::new(self.scheduler_api, watcher::Config::default())
            .owns(self.cron_job_api, watcher::Config::default().labels(&owned_selector))
            .with_config(runtime_config)
            .graceful_shutdown_on(async move { shutdown.cancelled().await })
            .run(reconcile, error_policy, self.reconciler)
            .for_each(|res| async move {
                match res {
                    Ok((obj_ref, _action)) => debug!("Reconciled {}", obj_ref),
                    Err(e) => warn!("Scheduler controller error: {}", e),
                }
            })
            .await;

        info!("Scheduler watcher stopped");
        Ok(())
    }
}
