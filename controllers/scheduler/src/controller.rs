//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the Kubernetes
//! client, the object store, the resource registry and the reconciler
//! together, and runs the Scheduler watcher in a background task.

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use crate::reconciler::{ReconcileSettings, Reconciler};
use crate::watcher::Watcher;
use crds::{ResourceRegistry, Scheduler};
use k8s_openapi::api::batch::v1::CronJob;
use kube::{Api, Client};
use schedule_store::KubeStore;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Main controller for Scheduler resource management.
#[derive(Debug)]
pub struct Controller {
    scheduler_watcher: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance and starts watching.
    ///
    /// Cancelling `shutdown` stops the watcher and aborts in-flight passes
    /// before their status write.
    pub async fn new(config: ControllerConfig, shutdown: CancellationToken) -> Result<Self, ControllerError> {
        info!("Initializing Scheduler Controller");

        let kube_client = Client::try_default().await?;

        let registry = Arc::new(ResourceRegistry::with_defaults());
        info!("Registered {} resource kinds", registry.len());

        let (scheduler_api, cron_job_api): (Api<Scheduler>, Api<CronJob>) = match config.namespace.as_deref() {
            Some(ns) => (Api::namespaced(kube_client.clone(), ns), Api::namespaced(kube_client.clone(), ns)),
            None => (Api::all(kube_client.clone()), Api::all(kube_client.clone())),
        };

        let reconciler = Arc::new(Reconciler::new(
            KubeStore::new(kube_client),
            registry,
            ReconcileSettings::from(&config),
            shutdown.clone(),
        ));

        let watcher = Watcher::new(reconciler, scheduler_api, cron_job_api, config, shutdown);
        let scheduler_watcher = tokio::spawn(async move { watcher.watch_schedulers().await });

        Ok(Self { scheduler_watcher })
    }

    /// Runs the controller until the watcher exits.
    pub async fn run(self) -> Result<(), ControllerError> {
        info!("Scheduler Controller running");

        self.scheduler_watcher
            .await
            .map_err(|e| ControllerError::Watch(format!("Scheduler watcher panicked: {}", e)))?
            .map_err(|e| ControllerError::Watch(format!("Scheduler watcher error: {}", e)))?;

        info!("Scheduler Controller stopped");
        Ok(())
    }
}
