//! Helper functions for common reconciliation patterns
//!
//! Error collection across a pass, status change detection, and timestamp
//! conversion between Kubernetes and chrono types.

use chrono::{DateTime, Utc};
use crds::SchedulerStatus;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use std::fmt::Display;

/// Errors recorded during one reconciliation pass.
///
/// A pass never stops at the first failure; every failing entry is recorded
/// here and the pass moves on. Order follows the order errors were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorLog {
    errors: Vec<String>,
}

impl ErrorLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error against the object it concerns
    pub fn record(&mut self, subject: &str, error: impl Display) {
        self.errors.push(format!("{subject}: {error}"));
    }

    /// Append another log's errors after this one's
    pub fn extend(&mut self, other: ErrorLog) {
        self.errors.extend(other.errors);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.errors.first().map(String::as_str)
    }

    /// Recorded errors, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.errors.iter().map(String::as_str)
    }

    /// `"<n> error(s) during reconciliation: <first>"`, plus `" (and <m> more)"`
    /// when more than one error was recorded
    #[must_use]
    pub fn summary(&self) -> String {
        match (self.first(), self.len()) {
            (None, _) => String::new(),
            (Some(only), 1) => format!("1 error(s) during reconciliation: {only}"),
            (Some(first), n) => format!("{n} error(s) during reconciliation: {first} (and {} more)", n - 1),
        }
    }
}

/// Whether the freshly computed status differs from what is stored.
///
/// Deep structural comparison; any difference, including a changed
/// condition message, requires a write.
#[must_use]
pub fn status_needs_update(current: Option<&SchedulerStatus>, desired: &SchedulerStatus) -> bool {
    current != Some(desired)
}

/// Converts a Kubernetes timestamp to chrono.
///
/// Goes through the RFC 3339 wire form so it does not depend on the time
/// library backing `Time`.
#[must_use]
pub fn time_to_utc(time: &Time) -> Option<DateTime<Utc>> {
    let value = serde_json::to_value(time).ok()?;
    value
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
}
