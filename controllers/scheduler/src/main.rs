//! Scheduler Controller
//!
//! Keeps one `batch/v1` CronJob per entry of every `Scheduler` resource:
//! - creates CronJobs for new entries and updates them when an entry changes
//! - deletes CronJobs whose entry was removed
//! - reports running jobs, the last schedule time and a `Ready` condition
//!   on the Scheduler status
//!
//! Configuration comes from environment variables (see `config`).

mod backoff;
mod config;
mod controller;
mod error;
mod reconcile_helpers;
#[cfg(test)]
mod reconcile_helpers_test;
mod reconciler;
#[cfg(test)]
mod test_utils;
mod watcher;

use anyhow::Context;
use config::ControllerConfig;
use controller::Controller;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // kube's rustls client needs a process-wide crypto provider
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("rustls crypto provider already installed");
    }

    info!("Starting Scheduler Controller");

    let config = ControllerConfig::from_env().context("invalid controller configuration")?;

    info!("Configuration:");
    info!("  Namespace: {}", config.namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Controller ID: {}", config.controller_id);
    info!("  Requeue after: {:?}", config.requeue_after);
    info!("  Reconcile timeout: {:?}", config.reconcile_timeout);
    info!("  Concurrency: {} reconciles, {} writes", config.concurrency, config.write_concurrency);

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.cancel();
        }
    });

    let controller = Controller::new(config, shutdown).await.context("failed to start controller")?;
    controller.run().await?;

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        () = terminate => info!("Received terminate signal, initiating graceful shutdown"),
    }
}
