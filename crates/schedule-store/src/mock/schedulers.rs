//! Scheduler operations for MockScheduleStore

use super::{MockScheduleStore, key};
use crate::error::StoreError;
use crds::Scheduler;

pub async fn get_scheduler(store: &MockScheduleStore, namespace: &str, name: &str) -> Result<Scheduler, StoreError> {
    let delay = store.failures.lock().unwrap().get_scheduler_delay;
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if let Some(message) = store.failures.lock().unwrap().get_scheduler.clone() {
        return Err(StoreError::Unavailable(message));
    }
    store
        .schedulers
        .lock()
        .unwrap()
        .get(&key(namespace, name))
        .cloned()
        .ok_or_else(|| StoreError::NotFound(format!("Scheduler {namespace}/{name}")))
}

pub async fn update_scheduler_status(store: &MockScheduleStore, scheduler: &Scheduler) -> Result<Scheduler, StoreError> {
    let namespace = scheduler.metadata.namespace.clone().unwrap_or_default();
    let name = scheduler.metadata.name.clone().unwrap_or_default();

    if store.failures.lock().unwrap().status_conflict {
        return Err(StoreError::Conflict(format!("Scheduler {namespace}/{name} was modified")));
    }

    let version = store.next_version();
    let mut schedulers = store.schedulers.lock().unwrap();
    let stored = schedulers
        .get_mut(&key(&namespace, &name))
        .ok_or_else(|| StoreError::NotFound(format!("Scheduler {namespace}/{name}")))?;

    if let Some(expected) = &scheduler.metadata.resource_version {
        if stored.metadata.resource_version.as_ref() != Some(expected) {
            return Err(StoreError::Conflict(format!(
                "Scheduler {namespace}/{name}: resourceVersion {expected} is stale"
            )));
        }
    }

    // Only the status subresource is written; spec edits in the request are ignored
    stored.status = scheduler.status.clone();
    stored.metadata.resource_version = Some(version);
    let updated = stored.clone();
    drop(schedulers);

    store.writes.lock().unwrap().status_updates.push(name);
    Ok(updated)
}
