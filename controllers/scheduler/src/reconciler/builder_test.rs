//! Unit tests for CronJob construction and owned-field comparison

#[cfg(test)]
mod tests {
    use super::super::builder::*;
    use crate::error::ControllerError;
    use crate::test_utils::*;
    use crds::{EnvValueSource, KeySelector, ResourceRegistry, ScheduleEnvFrom, ScheduleEnvVar, SourceRef};
    use std::collections::BTreeMap;

    fn build(scheduler: &crds::Scheduler, index: usize) -> k8s_openapi::api::batch::v1::CronJob {
        build_cron_job(
            &ResourceRegistry::with_defaults(),
            "scheduler-controller",
            scheduler,
            &scheduler.spec.schedules[index],
        )
        .unwrap()
    }

    #[test]
    fn test_build_sets_identity_labels_and_owner() {
        let scheduler = test_scheduler("nightly", vec![test_schedule("reports", "0 2 * * *")]);
        let cron_job = build(&scheduler, 0);

        assert_eq!(cron_job.metadata.name.as_deref(), Some("nightly-reports"));
        assert_eq!(cron_job.metadata.namespace.as_deref(), Some(TEST_NAMESPACE));
        assert_eq!(
            cron_job.metadata.labels,
            Some(BTreeMap::from([
                ("app".to_string(), "scheduler-controller".to_string()),
                ("parent".to_string(), "nightly".to_string()),
                ("schedule".to_string(), "reports".to_string()),
            ]))
        );
        assert_eq!(controller_uid(&cron_job), scheduler.metadata.uid.as_deref());
        let owner = &cron_job.metadata.owner_references.as_ref().unwrap()[0];
        assert_eq!(owner.kind, "Scheduler");
        assert_eq!(owner.block_owner_deletion, Some(true));
    }

    #[test]
    fn test_build_job_template() {
        let mut schedule = test_schedule("reports", "*/5 * * * *");
        schedule.params = vec!["--full".to_string()];
        let scheduler = test_scheduler("nightly", vec![schedule]);
        let cron_job = build(&scheduler, 0);

        let spec = cron_job.spec.unwrap();
        assert_eq!(spec.schedule, "*/5 * * * *");
        let pod = spec.job_template.spec.unwrap().template.spec.unwrap();
        assert_eq!(pod.restart_policy.as_deref(), Some(RESTART_POLICY));
        assert_eq!(pod.containers.len(), 1);
        let container = &pod.containers[0];
        assert_eq!(container.name, CONTAINER_NAME);
        assert_eq!(container.image.as_deref(), Some("busybox:1.36"));
        assert_eq!(container.args, Some(vec!["--full".to_string()]));
        assert_eq!(container.env, None);
        assert_eq!(container.env_from, None);
    }

    #[test]
    fn test_build_maps_env_sources() {
        let mut schedule = test_schedule("reports", "0 2 * * *");
        schedule.env = vec![
            ScheduleEnvVar {
                name: "MODE".to_string(),
                value: Some("full".to_string()),
                value_from: None,
            },
            ScheduleEnvVar {
                name: "TOKEN".to_string(),
                value: None,
                value_from: Some(EnvValueSource {
                    config_map_key_ref: None,
                    secret_key_ref: Some(KeySelector {
                        name: "creds".to_string(),
                        key: "token".to_string(),
                        optional: None,
                    }),
                }),
            },
        ];
        schedule.env_from = vec![ScheduleEnvFrom {
            prefix: Some("DB_".to_string()),
            config_map_ref: Some(SourceRef {
                name: "db".to_string(),
                optional: Some(true),
            }),
            secret_ref: None,
        }];
        let scheduler = test_scheduler("nightly", vec![schedule]);
        let cron_job = build(&scheduler, 0);

        let pod = cron_job.spec.unwrap().job_template.spec.unwrap().template.spec.unwrap();
        let container = &pod.containers[0];
        let env = container.env.as_ref().unwrap();
        assert_eq!(env[0].name, "MODE");
        assert_eq!(env[0].value.as_deref(), Some("full"));
        let secret = env[1].value_from.as_ref().unwrap().secret_key_ref.as_ref().unwrap();
        assert_eq!(secret.key, "token");

        let env_from = &container.env_from.as_ref().unwrap()[0];
        assert_eq!(env_from.prefix.as_deref(), Some("DB_"));
        assert_eq!(env_from.config_map_ref.as_ref().unwrap().optional, Some(true));
    }

    #[test]
    fn test_build_requires_uid() {
        let mut scheduler = test_scheduler("nightly", vec![test_schedule("reports", "0 2 * * *")]);
        scheduler.metadata.uid = None;
        let result = build_cron_job(
            &ResourceRegistry::with_defaults(),
            "scheduler-controller",
            &scheduler,
            &scheduler.spec.schedules[0],
        );
        assert!(matches!(result, Err(ControllerError::Registry(_))));
    }

    #[test]
    fn test_build_requires_namespace() {
        let mut scheduler = test_scheduler("nightly", vec![test_schedule("reports", "0 2 * * *")]);
        scheduler.metadata.namespace = None;
        let result = build_cron_job(
            &ResourceRegistry::with_defaults(),
            "scheduler-controller",
            &scheduler,
            &scheduler.spec.schedules[0],
        );
        assert!(matches!(result, Err(ControllerError::InvalidResource(_))));
    }

    #[test]
    fn test_server_defaults_do_not_count_as_drift() {
        let scheduler = test_scheduler("nightly", vec![test_schedule("reports", "0 2 * * *")]);
        let desired = build(&scheduler, 0);

        let mut existing = desired.clone();
        existing.metadata.uid = Some("cj-uid".to_string());
        existing.metadata.resource_version = Some("42".to_string());
        existing.metadata.annotations = Some(BTreeMap::from([("note".to_string(), "kept".to_string())]));
        let spec = existing.spec.as_mut().unwrap();
        spec.concurrency_policy = Some("Allow".to_string());
        spec.successful_jobs_history_limit = Some(3);
        let pod = spec.job_template.spec.as_mut().unwrap().template.spec.as_mut().unwrap();
        pod.dns_policy = Some("ClusterFirst".to_string());
        pod.containers[0].image_pull_policy = Some("IfNotPresent".to_string());
        pod.containers[0].args = Some(vec![]);

        assert!(owned_fields_match(&desired, &existing));
    }

    #[test]
    fn test_drift_in_owned_fields_is_detected() {
        let scheduler = test_scheduler("nightly", vec![test_schedule("reports", "0 2 * * *")]);
        let desired = build(&scheduler, 0);

        let mut changed_schedule = desired.clone();
        changed_schedule.spec.as_mut().unwrap().schedule = "0 3 * * *".to_string();
        assert!(!owned_fields_match(&desired, &changed_schedule));

        let mut changed_label = desired.clone();
        changed_label
            .metadata
            .labels
            .as_mut()
            .unwrap()
            .insert("parent".to_string(), "other".to_string());
        assert!(!owned_fields_match(&desired, &changed_label));

        let mut no_owner = desired.clone();
        no_owner.metadata.owner_references = None;
        assert!(!owned_fields_match(&desired, &no_owner));
    }

    #[test]
    fn test_apply_preserves_unowned_metadata() {
        let scheduler = test_scheduler("nightly", vec![test_schedule("reports", "0 2 * * *")]);
        let desired = build(&scheduler, 0);

        let mut existing = unmanaged_cron_job("nightly-reports", &[("team", "data")], None);
        existing.metadata.resource_version = Some("7".to_string());
        existing.metadata.annotations = Some(BTreeMap::from([("note".to_string(), "kept".to_string())]));
        existing.spec.as_mut().unwrap().suspend = Some(true);

        let updated = apply_owned_fields(&existing, &desired);

        assert!(owned_fields_match(&desired, &updated));
        let labels = updated.metadata.labels.as_ref().unwrap();
        assert_eq!(labels.get("team").map(String::as_str), Some("data"));
        assert_eq!(labels.get("app").map(String::as_str), Some("scheduler-controller"));
        assert_eq!(updated.metadata.annotations, existing.metadata.annotations);
        assert_eq!(updated.metadata.resource_version.as_deref(), Some("7"));
        assert_eq!(updated.spec.as_ref().unwrap().suspend, Some(true));
        assert_eq!(updated.spec.as_ref().unwrap().schedule, "0 2 * * *");
    }
}
