//! Desired CronJob construction
//!
//! Pure translation of one schedule entry into the CronJob the controller
//! wants to exist, plus the owned-field comparison the synchronizer uses to
//! decide whether an existing CronJob needs an update.

use crate::error::ControllerError;
use crds::{APP_LABEL, PARENT_LABEL, ResourceRegistry, SCHEDULE_LABEL, Schedule, Scheduler};
use k8s_openapi::api::batch::v1::{CronJob, CronJobSpec, JobSpec, JobTemplateSpec};
use k8s_openapi::api::core::v1::{Container, EnvFromSource, EnvVar, PodSpec, PodTemplateSpec};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// Name of the single container in every managed job
pub const CONTAINER_NAME: &str = "job";

/// Restart policy of every managed job's pods
pub const RESTART_POLICY: &str = "OnFailure";

/// Labels stamped on a managed CronJob
#[must_use]
pub fn child_labels(controller_id: &str, scheduler: &str, schedule: &str) -> BTreeMap<String, String> {
    BTreeMap::from([
        (APP_LABEL.to_string(), controller_id.to_string()),
        (PARENT_LABEL.to_string(), scheduler.to_string()),
        (SCHEDULE_LABEL.to_string(), schedule.to_string()),
    ])
}

/// Builds the desired CronJob for one schedule entry.
///
/// The result carries name, namespace, ownership labels, a controller owner
/// reference to `scheduler`, the cron expression, and a job template with a
/// single container. Nothing else is set, so server-side defaults never show
/// up as differences.
pub fn build_cron_job(
    registry: &ResourceRegistry,
    controller_id: &str,
    scheduler: &Scheduler,
    schedule: &Schedule,
) -> Result<CronJob, ControllerError> {
    let parent = scheduler
        .metadata
        .name
        .as_deref()
        .ok_or_else(|| ControllerError::InvalidResource("Scheduler has no name".to_string()))?;
    let namespace = scheduler
        .metadata
        .namespace
        .as_deref()
        .ok_or_else(|| ControllerError::InvalidResource(format!("Scheduler {parent} has no namespace")))?;
    let owner = registry.controller_reference(scheduler)?;

    let container = Container {
        name: CONTAINER_NAME.to_string(),
        image: Some(schedule.image.clone()),
        args: non_empty(schedule.params.clone()),
        env: non_empty(convert::<Vec<EnvVar>>(&schedule.env)?),
        env_from: non_empty(convert::<Vec<EnvFromSource>>(&schedule.env_from)?),
        ..Default::default()
    };

    Ok(CronJob {
        metadata: ObjectMeta {
            name: Some(scheduler.child_name(schedule)),
            namespace: Some(namespace.to_string()),
            labels: Some(child_labels(controller_id, parent, &schedule.name)),
            owner_references: Some(vec![owner]),
            ..Default::default()
        },
        spec: Some(CronJobSpec {
            schedule: schedule.cron_expression.clone(),
            job_template: JobTemplateSpec {
                metadata: None,
                spec: Some(JobSpec {
                    template: PodTemplateSpec {
                        metadata: None,
                        spec: Some(PodSpec {
                            containers: vec![container],
                            restart_policy: Some(RESTART_POLICY.to_string()),
                            ..Default::default()
                        }),
                    },
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    })
}

// Schedule env types share the core/v1 wire shape.
fn convert<T: DeserializeOwned>(value: &impl Serialize) -> Result<T, serde_json::Error> {
    serde_json::from_value(serde_json::to_value(value)?)
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}

/// Uid of the object's controller owner, if it has one
#[must_use]
pub fn controller_uid(cron_job: &CronJob) -> Option<&str> {
    controller_owner(cron_job).map(|o| o.uid.as_str())
}

fn controller_owner(cron_job: &CronJob) -> Option<&OwnerReference> {
    cron_job
        .metadata
        .owner_references
        .as_deref()
        .unwrap_or_default()
        .iter()
        .find(|o| o.controller == Some(true))
}

#[derive(Debug, PartialEq)]
struct ContainerFields<'a> {
    name: &'a str,
    image: Option<&'a str>,
    args: &'a [String],
    env: &'a [EnvVar],
    env_from: &'a [EnvFromSource],
}

/// The part of a CronJob this controller owns
#[derive(Debug, PartialEq)]
struct OwnedFields<'a> {
    labels: BTreeMap<&'a str, Option<&'a str>>,
    controller_uid: Option<&'a str>,
    schedule: Option<&'a str>,
    restart_policy: Option<&'a str>,
    containers: Vec<ContainerFields<'a>>,
}

fn owned_fields(cron_job: &CronJob) -> OwnedFields<'_> {
    let labels = cron_job.metadata.labels.as_ref();
    let pod = cron_job
        .spec
        .as_ref()
        .and_then(|s| s.job_template.spec.as_ref())
        .and_then(|j| j.template.spec.as_ref());

    OwnedFields {
        labels: [APP_LABEL, PARENT_LABEL, SCHEDULE_LABEL]
            .into_iter()
            .map(|k| (k, labels.and_then(|l| l.get(k)).map(String::as_str)))
            .collect(),
        controller_uid: controller_uid(cron_job),
        schedule: cron_job.spec.as_ref().map(|s| s.schedule.as_str()),
        restart_policy: pod.and_then(|p| p.restart_policy.as_deref()),
        containers: pod
            .map(|p| p.containers.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|c| ContainerFields {
                name: &c.name,
                image: c.image.as_deref(),
                args: c.args.as_deref().unwrap_or_default(),
                env: c.env.as_deref().unwrap_or_default(),
                env_from: c.env_from.as_deref().unwrap_or_default(),
            })
            .collect(),
    }
}

/// Whether `existing` already carries every field `desired` sets.
///
/// Fields the controller does not own (server defaults, annotations,
/// history limits, status) are ignored.
#[must_use]
pub fn owned_fields_match(desired: &CronJob, existing: &CronJob) -> bool {
    owned_fields(desired) == owned_fields(existing)
}

/// Copies the owned fields of `desired` onto a clone of `existing`.
///
/// Foreign labels, annotations, non-controller owner references and
/// unowned spec fields of `existing` survive; the resourceVersion is kept so
/// the write is rejected if the object changed in the meantime.
#[must_use]
pub fn apply_owned_fields(existing: &CronJob, desired: &CronJob) -> CronJob {
    let mut updated = existing.clone();

    let labels = updated.metadata.labels.get_or_insert_with(BTreeMap::new);
    for (key, value) in desired.metadata.labels.iter().flatten() {
        labels.insert(key.clone(), value.clone());
    }

    let mut owners: Vec<OwnerReference> = existing
        .metadata
        .owner_references
        .iter()
        .flatten()
        .filter(|o| o.controller != Some(true))
        .cloned()
        .collect();
    owners.extend(controller_owner(desired).cloned());
    updated.metadata.owner_references = Some(owners);

    if let Some(wanted) = &desired.spec {
        let spec = updated.spec.get_or_insert_with(|| wanted.clone());
        spec.schedule = wanted.schedule.clone();
        spec.job_template = wanted.job_template.clone();
    }
    updated
}
