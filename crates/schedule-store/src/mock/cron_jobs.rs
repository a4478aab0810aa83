//! CronJob operations for MockScheduleStore

use super::{MockScheduleStore, key, matches_selector};
use crate::error::StoreError;
use k8s_openapi::api::batch::v1::CronJob;

fn object_key(cron_job: &CronJob) -> (String, String) {
    (
        cron_job.metadata.namespace.clone().unwrap_or_default(),
        cron_job.metadata.name.clone().unwrap_or_default(),
    )
}

pub async fn get_cron_job(store: &MockScheduleStore, namespace: &str, name: &str) -> Result<CronJob, StoreError> {
    {
        let mut failures = store.failures.lock().unwrap();
        if failures.get_cron_job.contains(name) {
            return Err(StoreError::Unavailable(format!("GET CronJob {namespace}/{name} timed out")));
        }
        if failures.stale_get_cron_job.remove(name) {
            return Err(StoreError::NotFound(format!("CronJob {namespace}/{name}")));
        }
    }
    store
        .cron_jobs
        .lock()
        .unwrap()
        .get(&key(namespace, name))
        .cloned()
        .ok_or_else(|| StoreError::NotFound(format!("CronJob {namespace}/{name}")))
}

pub async fn list_cron_jobs(store: &MockScheduleStore, namespace: &str, label_selector: &str) -> Result<Vec<CronJob>, StoreError> {
    if let Some(message) = store.failures.lock().unwrap().list_cron_jobs.clone() {
        return Err(StoreError::Unavailable(message));
    }
    Ok(store
        .cron_jobs
        .lock()
        .unwrap()
        .iter()
        .filter(|((ns, _), cj)| ns == namespace && matches_selector(cj.metadata.labels.as_ref(), label_selector))
        .map(|(_, cj)| cj.clone())
        .collect())
}

pub async fn create_cron_job(store: &MockScheduleStore, cron_job: &CronJob) -> Result<CronJob, StoreError> {
    let (namespace, name) = object_key(cron_job);
    if store.failures.lock().unwrap().create.contains(&name) {
        return Err(StoreError::Invalid(format!("CronJob {namespace}/{name}: rejected by admission")));
    }

    let version = store.next_version();
    let mut cron_jobs = store.cron_jobs.lock().unwrap();
    if cron_jobs.contains_key(&key(&namespace, &name)) {
        return Err(StoreError::AlreadyExists(format!("CronJob {namespace}/{name}")));
    }

    let mut created = cron_job.clone();
    created.metadata.uid = Some(MockScheduleStore::new_uid());
    created.metadata.resource_version = Some(version);
    cron_jobs.insert(key(&namespace, &name), created.clone());
    drop(cron_jobs);

    store.writes.lock().unwrap().created.push(name);
    Ok(created)
}

pub async fn update_cron_job(store: &MockScheduleStore, cron_job: &CronJob) -> Result<CronJob, StoreError> {
    let (namespace, name) = object_key(cron_job);
    if store.failures.lock().unwrap().update.contains(&name) {
        return Err(StoreError::Invalid(format!("CronJob {namespace}/{name}: rejected by admission")));
    }

    let version = store.next_version();
    let mut cron_jobs = store.cron_jobs.lock().unwrap();
    let stored = cron_jobs
        .get_mut(&key(&namespace, &name))
        .ok_or_else(|| StoreError::NotFound(format!("CronJob {namespace}/{name}")))?;

    if let Some(expected) = &cron_job.metadata.resource_version {
        if stored.metadata.resource_version.as_ref() != Some(expected) {
            return Err(StoreError::Conflict(format!(
                "CronJob {namespace}/{name}: resourceVersion {expected} is stale"
            )));
        }
    }

    let uid = stored.metadata.uid.clone();
    let status = stored.status.clone();
    *stored = cron_job.clone();
    stored.metadata.uid = uid;
    stored.metadata.resource_version = Some(version);
    // Replace does not touch the status subresource
    stored.status = status;
    let updated = stored.clone();
    drop(cron_jobs);

    store.writes.lock().unwrap().updated.push(name);
    Ok(updated)
}

pub async fn delete_cron_job(store: &MockScheduleStore, namespace: &str, name: &str) -> Result<(), StoreError> {
    if store.failures.lock().unwrap().delete.contains(name) {
        return Err(StoreError::Unavailable(format!("DELETE CronJob {namespace}/{name} timed out")));
    }
    let removed = store.cron_jobs.lock().unwrap().remove(&key(namespace, name));
    match removed {
        Some(_) => {
            store.writes.lock().unwrap().deleted.push(name.to_string());
            Ok(())
        }
        None => Err(StoreError::NotFound(format!("CronJob {namespace}/{name}"))),
    }
}
