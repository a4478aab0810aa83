//! Unit tests for reconcile_helpers module

#[cfg(test)]
mod tests {
    use crate::reconcile_helpers::*;
    use chrono::{TimeZone, Utc};
    use crds::{Condition, ConditionStatus, SchedulerStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

    fn ready_status(message: &str) -> SchedulerStatus {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        SchedulerStatus {
            observed_generation: Some(1),
            last_schedule_time: None,
            active: vec![],
            conditions: vec![Condition::new(
                "Ready",
                ConditionStatus::True,
                "ReconcileSuccess",
                message,
                now,
            )],
        }
    }

    #[test]
    fn test_empty_log_has_no_summary() {
        let log = ErrorLog::new();
        assert!(log.is_empty());
        assert_eq!(log.summary(), "");
        assert_eq!(log.first(), None);
    }

    #[test]
    fn test_summary_single_error() {
        let mut log = ErrorLog::new();
        log.record("CronJob default/nightly-a", "Invalid object: bad image");
        assert_eq!(
            log.summary(),
            "1 error(s) during reconciliation: CronJob default/nightly-a: Invalid object: bad image"
        );
    }

    #[test]
    fn test_summary_counts_remaining_errors() {
        let mut log = ErrorLog::new();
        log.record("a", "first");
        log.record("b", "second");
        log.record("c", "third");
        assert_eq!(log.len(), 3);
        assert_eq!(log.summary(), "3 error(s) during reconciliation: a: first (and 2 more)");
    }

    #[test]
    fn test_extend_keeps_order() {
        let mut sync = ErrorLog::new();
        sync.record("sync", "one");
        let mut cleanup = ErrorLog::new();
        cleanup.record("cleanup", "two");

        sync.extend(cleanup);

        let all: Vec<&str> = sync.iter().collect();
        assert_eq!(all, vec!["sync: one", "cleanup: two"]);
    }

    #[test]
    fn test_status_needs_update_no_status() {
        assert!(status_needs_update(None, &SchedulerStatus::default()));
    }

    #[test]
    fn test_status_needs_update_all_match() {
        let status = ready_status("All 2 schedule(s) reconciled");
        assert!(!status_needs_update(Some(&status), &status.clone()));
    }

    #[test]
    fn test_status_needs_update_message_changed() {
        let current = ready_status("All 2 schedule(s) reconciled");
        let desired = ready_status("All 3 schedule(s) reconciled");
        assert!(status_needs_update(Some(&current), &desired));
    }

    #[test]
    fn test_time_to_utc() {
        let time: Time = serde_json::from_value(serde_json::json!("2024-05-01T12:30:00Z")).unwrap();
        assert_eq!(
            time_to_utc(&time),
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap())
        );
    }
}
