//! Status aggregation
//!
//! Derives a Scheduler's status from its surviving CronJobs and the errors
//! recorded during the pass. Pure: the same inputs always give the same
//! status, apart from the transition time of a condition whose status flips.

use crate::reconcile_helpers::{ErrorLog, time_to_utc};
use chrono::{DateTime, Utc};
use crds::{ChildReference, Condition, ConditionStatus, READY_CONDITION, Scheduler, SchedulerStatus, set_condition};
use k8s_openapi::api::batch::v1::CronJob;

pub const REASON_SUCCESS: &str = "ReconcileSuccess";
pub const REASON_ERROR: &str = "ReconcileError";

/// Observed state of one CronJob's most recent execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionState {
    /// Never scheduled
    NeverRun,
    /// A job is active right now
    Running,
    /// Last scheduled run completed successfully
    Succeeded,
    /// Scheduled, but no success at or after the last schedule time
    Failed,
}

/// Classifies a CronJob from its reported status.
///
/// Only `Running` counts as active: a CronJob that has never run has no
/// job in flight, so it is neither completed nor failed and still not active.
#[must_use]
pub fn execution_state(cron_job: &CronJob) -> ExecutionState {
    let Some(status) = cron_job.status.as_ref() else {
        return ExecutionState::NeverRun;
    };
    if status.active.as_ref().is_some_and(|a| !a.is_empty()) {
        return ExecutionState::Running;
    }
    let Some(scheduled) = status.last_schedule_time.as_ref().and_then(time_to_utc) else {
        return ExecutionState::NeverRun;
    };
    match status.last_successful_time.as_ref().and_then(time_to_utc) {
        Some(succeeded) if succeeded >= scheduled => ExecutionState::Succeeded,
        _ => ExecutionState::Failed,
    }
}

/// When the CronJob was last scheduled, if ever
#[must_use]
pub fn last_schedule_time(cron_job: &CronJob) -> Option<DateTime<Utc>> {
    cron_job
        .status
        .as_ref()
        .and_then(|s| s.last_schedule_time.as_ref())
        .and_then(time_to_utc)
}

/// Computes the status to store on `scheduler`.
///
/// `children` is `None` when the CronJobs could not be listed; the previous
/// `active` list and `lastScheduleTime` are then carried over unchanged.
#[must_use]
pub fn aggregate_status(
    scheduler: &Scheduler,
    children: Option<&[CronJob]>,
    errors: &ErrorLog,
    now: DateTime<Utc>,
) -> SchedulerStatus {
    let previous = scheduler.status.clone().unwrap_or_default();
    let namespace = scheduler.metadata.namespace.as_deref().unwrap_or_default();

    let (active, last_schedule) = match children {
        Some(children) => {
            let mut active: Vec<ChildReference> = children
                .iter()
                .filter(|cj| execution_state(cj) == ExecutionState::Running)
                .map(|cj| {
                    ChildReference::cron_job(
                        namespace,
                        cj.metadata.name.clone().unwrap_or_default(),
                        cj.metadata.uid.clone(),
                    )
                })
                .collect();
            active.sort();
            (active, children.iter().filter_map(last_schedule_time).max())
        }
        None => (previous.active, previous.last_schedule_time),
    };

    let ready = if errors.is_empty() {
        Condition::new(
            READY_CONDITION,
            ConditionStatus::True,
            REASON_SUCCESS,
            format!("All {} schedule(s) reconciled", scheduler.spec.schedules.len()),
            now,
        )
    } else {
        Condition::new(READY_CONDITION, ConditionStatus::False, REASON_ERROR, errors.summary(), now)
    };

    let mut conditions = previous.conditions;
    set_condition(&mut conditions, ready.with_observed_generation(scheduler.metadata.generation));

    SchedulerStatus {
        observed_generation: scheduler.metadata.generation,
        last_schedule_time: last_schedule,
        active,
        conditions,
    }
}
