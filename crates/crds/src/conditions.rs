//! Status conditions
//!
//! Conditions form a set keyed by `type`. Re-asserting a condition with an
//! unchanged status keeps its `lastTransitionTime`; only a status flip moves it.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Tri-state condition status, serialized as `"True"`, `"False"` or `"Unknown"`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
pub enum ConditionStatus {
    /// The condition holds
    True,
    /// The condition does not hold
    False,
    /// Not yet determined
    #[default]
    Unknown,
}

impl ConditionStatus {
    /// Maps a boolean health signal onto a condition status
    #[must_use]
    pub fn from_bool(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

/// One entry of a status condition set
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition type, e.g. `Ready`
    #[serde(rename = "type")]
    pub type_: String,

    /// Current status
    pub status: ConditionStatus,

    /// Machine-readable CamelCase reason
    pub reason: String,

    /// Human-readable detail
    #[serde(default)]
    pub message: String,

    /// Last time `status` changed
    pub last_transition_time: DateTime<Utc>,

    /// Generation the condition was computed for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl Condition {
    #[must_use]
    pub fn new(
        type_: impl Into<String>,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            type_: type_.into(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: now,
            observed_generation: None,
        }
    }

    #[must_use]
    pub fn with_observed_generation(mut self, generation: Option<i64>) -> Self {
        self.observed_generation = generation;
        self
    }
}

/// Finds the condition with the given type
#[must_use]
pub fn find_condition<'a>(conditions: &'a [Condition], type_: &str) -> Option<&'a Condition> {
    conditions.iter().find(|c| c.type_ == type_)
}

/// Inserts or replaces `condition` by type.
///
/// When a condition of the same type already exists with the same status, its
/// `lastTransitionTime` is carried over. The list is kept sorted by type so
/// that equal condition sets always serialize identically.
///
/// Returns `true` if the stored set changed.
pub fn set_condition(conditions: &mut Vec<Condition>, mut condition: Condition) -> bool {
    let changed = match conditions.iter_mut().find(|c| c.type_ == condition.type_) {
        Some(existing) => {
            if existing.status == condition.status {
                condition.last_transition_time = existing.last_transition_time;
            }
            if *existing == condition {
                false
            } else {
                *existing = condition;
                true
            }
        }
        None => {
            conditions.push(condition);
            true
        }
    };
    conditions.sort_by(|a, b| a.type_.cmp(&b.type_));
    changed
}
