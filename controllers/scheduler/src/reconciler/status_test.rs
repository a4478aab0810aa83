//! Unit tests for status aggregation

#[cfg(test)]
mod tests {
    use super::super::status::*;
    use crate::reconcile_helpers::ErrorLog;
    use crate::test_utils::*;
    use chrono::{DateTime, TimeZone, Utc};
    use crds::{ChildReference, ConditionStatus, SchedulerStatus};
    use k8s_openapi::api::batch::v1::CronJob;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap()
    }

    fn child(name: &str, status: Option<k8s_openapi::api::batch::v1::CronJobStatus>) -> CronJob {
        let mut cron_job = unmanaged_cron_job(name, &[], None);
        cron_job.metadata.uid = Some(format!("{name}-uid"));
        cron_job.status = status;
        cron_job
    }

    #[test]
    fn test_execution_states() {
        assert_eq!(execution_state(&child("a", None)), ExecutionState::NeverRun);
        assert_eq!(
            execution_state(&child("a", Some(cron_job_status(None, None, false)))),
            ExecutionState::NeverRun
        );
        assert_eq!(
            execution_state(&child(
                "a",
                Some(cron_job_status(Some("2024-05-01T10:00:00Z"), None, true))
            )),
            ExecutionState::Running
        );
        assert_eq!(
            execution_state(&child(
                "a",
                Some(cron_job_status(Some("2024-05-01T10:00:00Z"), Some("2024-05-01T10:02:00Z"), false))
            )),
            ExecutionState::Succeeded
        );
        assert_eq!(
            execution_state(&child(
                "a",
                Some(cron_job_status(Some("2024-05-01T10:00:00Z"), Some("2024-04-30T10:02:00Z"), false))
            )),
            ExecutionState::Failed
        );
        assert_eq!(
            execution_state(&child(
                "a",
                Some(cron_job_status(Some("2024-05-01T10:00:00Z"), None, false))
            )),
            ExecutionState::Failed
        );
    }

    #[test]
    fn test_active_lists_running_children_sorted() {
        let scheduler = test_scheduler("nightly", vec![]);
        let children = vec![
            child("nightly-c", Some(cron_job_status(Some("2024-05-01T10:00:00Z"), None, true))),
            child("nightly-b", None),
            child("nightly-a", Some(cron_job_status(Some("2024-05-01T09:00:00Z"), None, true))),
        ];

        let status = aggregate_status(&scheduler, Some(children.as_slice()), &ErrorLog::new(), now());

        assert_eq!(
            status.active,
            vec![
                ChildReference::cron_job(TEST_NAMESPACE, "nightly-a", Some("nightly-a-uid".to_string())),
                ChildReference::cron_job(TEST_NAMESPACE, "nightly-c", Some("nightly-c-uid".to_string())),
            ]
        );
    }

    #[test]
    fn test_last_schedule_time_is_latest_child() {
        let scheduler = test_scheduler("nightly", vec![]);
        let children = vec![
            child("nightly-a", Some(cron_job_status(Some("2024-05-01T09:00:00Z"), None, false))),
            child("nightly-b", Some(cron_job_status(Some("2024-05-01T11:00:00Z"), None, false))),
            child("nightly-c", None),
        ];

        let status = aggregate_status(&scheduler, Some(children.as_slice()), &ErrorLog::new(), now());

        assert_eq!(
            status.last_schedule_time,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_never_run_children_have_no_schedule_time() {
        let scheduler = test_scheduler("nightly", vec![]);
        let children = vec![child("nightly-a", None)];

        let status = aggregate_status(&scheduler, Some(children.as_slice()), &ErrorLog::new(), now());

        assert_eq!(status.last_schedule_time, None);
        assert!(status.active.is_empty());
    }

    #[test]
    fn test_ready_true_without_errors() {
        let scheduler = test_scheduler("nightly", vec![test_schedule("a", "0 1 * * *")]);

        let status = aggregate_status(&scheduler, Some(&[][..]), &ErrorLog::new(), now());

        assert_eq!(status.observed_generation, Some(1));
        assert_eq!(status.conditions.len(), 1);
        let ready = &status.conditions[0];
        assert_eq!(ready.type_, "Ready");
        assert_eq!(ready.status, ConditionStatus::True);
        assert_eq!(ready.reason, REASON_SUCCESS);
        assert_eq!(ready.message, "All 1 schedule(s) reconciled");
        assert_eq!(ready.observed_generation, Some(1));
    }

    #[test]
    fn test_ready_false_with_errors() {
        let scheduler = test_scheduler("nightly", vec![test_schedule("a", "0 1 * * *")]);
        let mut errors = ErrorLog::new();
        errors.record("CronJob default/nightly-a", "Invalid object: rejected");

        let status = aggregate_status(&scheduler, Some(&[][..]), &errors, now());

        let ready = &status.conditions[0];
        assert_eq!(ready.status, ConditionStatus::False);
        assert_eq!(ready.reason, REASON_ERROR);
        assert!(ready.message.starts_with("1 error(s) during reconciliation"));
    }

    #[test]
    fn test_unlisted_children_carry_previous_values() {
        let mut scheduler = test_scheduler("nightly", vec![]);
        let previous_time = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let previous_active = vec![ChildReference::cron_job(TEST_NAMESPACE, "nightly-a", None)];
        scheduler.status = Some(SchedulerStatus {
            observed_generation: Some(1),
            last_schedule_time: Some(previous_time),
            active: previous_active.clone(),
            conditions: vec![],
        });
        let mut errors = ErrorLog::new();
        errors.record("CronJobs of default/nightly", "Store unavailable: timeout");

        let status = aggregate_status(&scheduler, None, &errors, now());

        assert_eq!(status.active, previous_active);
        assert_eq!(status.last_schedule_time, Some(previous_time));
        assert_eq!(status.conditions[0].status, ConditionStatus::False);
    }

    #[test]
    fn test_transition_time_kept_when_status_unchanged() {
        let mut scheduler = test_scheduler("nightly", vec![]);
        let first = aggregate_status(&scheduler, Some(&[][..]), &ErrorLog::new(), now());
        scheduler.status = Some(first.clone());

        let later = now() + chrono::Duration::hours(1);
        let second = aggregate_status(&scheduler, Some(&[][..]), &ErrorLog::new(), later);

        assert_eq!(first, second);
    }
}
