//! Controller configuration
//!
//! All settings come from environment variables and are read once at startup.

use crate::error::ControllerError;
use std::time::Duration;

/// Default value of the `app` label on managed CronJobs
pub const DEFAULT_CONTROLLER_ID: &str = "scheduler-controller";

/// Delay before re-running a pass that recorded errors
pub const DEFAULT_REQUEUE_AFTER: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Namespace to watch; all namespaces when `None`
    pub namespace: Option<String>,
    /// Value of the `app` label stamped on every managed CronJob
    pub controller_id: String,
    /// Requeue delay after a pass with recorded errors
    pub requeue_after: Duration,
    /// Upper bound for one reconciliation pass
    pub reconcile_timeout: Duration,
    /// Parallel reconciliations across different Schedulers
    pub concurrency: u16,
    /// Quiet period after the last event before reconciling
    pub debounce: Duration,
    /// Parallel CronJob writes within one pass
    pub write_concurrency: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            controller_id: DEFAULT_CONTROLLER_ID.to_string(),
            requeue_after: DEFAULT_REQUEUE_AFTER,
            reconcile_timeout: Duration::from_secs(60),
            concurrency: 3,
            debounce: Duration::from_secs(5),
            write_concurrency: 4,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            namespace: non_empty("WATCH_NAMESPACE"),
            controller_id: non_empty("CONTROLLER_ID").unwrap_or(defaults.controller_id),
            requeue_after: parse_seconds(non_empty("REQUEUE_AFTER_SECONDS"), "REQUEUE_AFTER_SECONDS")?
                .unwrap_or(defaults.requeue_after),
            reconcile_timeout: parse_seconds(non_empty("RECONCILE_TIMEOUT_SECONDS"), "RECONCILE_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.reconcile_timeout),
            concurrency: parse_number(non_empty("CONTROLLER_CONCURRENCY"), "CONTROLLER_CONCURRENCY")?
                .unwrap_or(defaults.concurrency),
            debounce: parse_seconds(non_empty("DEBOUNCE_SECONDS"), "DEBOUNCE_SECONDS")?
                .unwrap_or(defaults.debounce),
            write_concurrency: parse_number(non_empty("WRITE_CONCURRENCY"), "WRITE_CONCURRENCY")?
                .unwrap_or(defaults.write_concurrency),
        };

        if config.write_concurrency == 0 {
            return Err(ControllerError::InvalidConfig(
                "WRITE_CONCURRENCY must be at least 1".to_string(),
            ));
        }
        if config.reconcile_timeout.is_zero() {
            return Err(ControllerError::InvalidConfig(
                "RECONCILE_TIMEOUT_SECONDS must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(value: Option<String>, key: &str) -> Result<Option<T>, ControllerError> {
    value
        .map(|v| {
            v.trim().parse::<T>().map_err(|_| {
                ControllerError::InvalidConfig(format!("{key} must be a non-negative integer, got '{v}'"))
            })
        })
        .transpose()
}

fn parse_seconds(value: Option<String>, key: &str) -> Result<Option<Duration>, ControllerError> {
    Ok(parse_number::<u64>(value, key)?.map(Duration::from_secs))
}
