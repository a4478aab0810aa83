//! Scheduler object store
//!
//! Narrow, idempotent access to the objects the scheduler controller reads
//! and writes: `Scheduler` resources and the `batch/v1` CronJobs derived from
//! them.
//!
//! # Example
//!
//! ```no_run
//! use schedule_store::{KubeStore, ScheduleStoreTrait};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = KubeStore::new(kube::Client::try_default().await?);
//!
//! let scheduler = store.get_scheduler("default", "nightly").await?;
//! let children = store
//!     .list_cron_jobs("default", "app=scheduler-controller,parent=nightly")
//!     .await?;
//! println!("{} owns {} CronJobs", scheduler.metadata.name.unwrap_or_default(), children.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Write semantics
//!
//! - `create_cron_job` reports `StoreError::AlreadyExists` instead of overwriting
//! - `update_cron_job` replaces the object; a stale `resourceVersion` yields `Conflict`
//! - `delete_cron_job` reports `NotFound` for objects that are already gone
//! - `update_scheduler_status` writes only the status subresource

pub mod client;
pub mod error;
#[path = "trait.rs"]
pub mod store_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::KubeStore;
pub use error::StoreError;
pub use store_trait::ScheduleStoreTrait;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockScheduleStore;
