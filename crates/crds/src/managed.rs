//! Shared managed-resource vocabulary
//!
//! Conditions, deletion policy and the well-known metadata keys used by every
//! Garage resource kind.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Annotation holding the external identifier of a resource.
///
/// Written independently of status so it survives status loss.
pub const EXTERNAL_NAME_ANNOTATION: &str = "garage.microscaler.io/external-name";

/// Finalizer that keeps a record alive until its external object is torn down.
pub const FINALIZER: &str = "garage.microscaler.io/finalizer";

/// What happens to the external object when the resource is deleted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum DeletionPolicy {
    /// Remove the external object
    #[default]
    Delete,
    /// Leave the external object in place
    Orphan,
}

/// Condition type. At most one condition of each type is kept.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionType {
    /// Whether the external object is usable
    Ready,
    /// Whether the last reconcile cycle succeeded
    Synced,
}

/// Condition status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// Machine-readable reason for a condition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionReason {
    Available,
    Unavailable,
    Creating,
    Deleting,
    ReconcileSuccess,
    ReconcileError,
    ReferencesNotReady,
}

/// A single status condition
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub r#type: ConditionType,
    pub status: ConditionStatus,
    pub reason: ConditionReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    fn new(
        r#type: ConditionType,
        status: ConditionStatus,
        reason: ConditionReason,
        message: Option<String>,
    ) -> Self {
        Self {
            r#type,
            status,
            reason,
            message,
            last_transition_time: Utc::now(),
        }
    }

    /// External object exists and was observed.
    #[must_use]
    pub fn available() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::True, ConditionReason::Available, None)
    }

    /// External object is not (yet) usable.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, ConditionReason::Unavailable, None)
    }

    /// Create call issued.
    #[must_use]
    pub fn creating() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, ConditionReason::Creating, None)
    }

    /// Delete call issued.
    #[must_use]
    pub fn deleting() -> Self {
        Self::new(ConditionType::Ready, ConditionStatus::False, ConditionReason::Deleting, None)
    }

    /// Last cycle succeeded.
    #[must_use]
    pub fn reconcile_success() -> Self {
        Self::new(ConditionType::Synced, ConditionStatus::True, ConditionReason::ReconcileSuccess, None)
    }

    /// Last cycle failed.
    #[must_use]
    pub fn reconcile_error(message: impl Into<String>) -> Self {
        Self::new(
            ConditionType::Synced,
            ConditionStatus::False,
            ConditionReason::ReconcileError,
            Some(message.into()),
        )
    }

    /// A referenced resource has no observed identity yet.
    #[must_use]
    pub fn references_not_ready(message: impl Into<String>) -> Self {
        Self::new(
            ConditionType::Synced,
            ConditionStatus::False,
            ConditionReason::ReferencesNotReady,
            Some(message.into()),
        )
    }

    /// Equal apart from the transition time.
    #[must_use]
    pub fn same_state(&self, other: &Self) -> bool {
        self.r#type == other.r#type
            && self.status == other.status
            && self.reason == other.reason
            && self.message == other.message
    }
}

/// Insert or replace the condition of the same type.
///
/// An unchanged condition keeps its original transition time. Returns whether
/// anything changed.
pub fn set_condition(conditions: &mut Vec<Condition>, condition: Condition) -> bool {
    match conditions.iter_mut().find(|c| c.r#type == condition.r#type) {
        Some(existing) if existing.same_state(&condition) => false,
        Some(existing) => {
            *existing = condition;
            true
        }
        None => {
            conditions.push(condition);
            true
        }
    }
}

/// Condition of the given type, if present.
#[must_use]
pub fn get_condition(conditions: &[Condition], r#type: ConditionType) -> Option<&Condition> {
    conditions.iter().find(|c| c.r#type == r#type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_set_condition_keeps_one_per_type() {
        let mut conditions = Vec::new();
        assert!(set_condition(&mut conditions, Condition::creating()));
        assert!(set_condition(&mut conditions, Condition::reconcile_success()));
        assert!(set_condition(&mut conditions, Condition::available()));

        assert_eq!(conditions.len(), 2);
        let ready = get_condition(&conditions, ConditionType::Ready).expect("ready present");
        assert_eq!(ready.reason, ConditionReason::Available);
        assert_eq!(ready.status, ConditionStatus::True);
    }

    #[test]
    fn test_set_condition_unchanged_keeps_timestamp() {
        let mut first = Condition::available();
        first.last_transition_time -= Duration::hours(1);
        let original = first.last_transition_time;
        let mut conditions = vec![first];

        assert!(!set_condition(&mut conditions, Condition::available()));
        assert_eq!(conditions[0].last_transition_time, original);
    }

    #[test]
    fn test_message_change_is_a_change() {
        let mut conditions = vec![Condition::reconcile_error("first")];
        assert!(set_condition(&mut conditions, Condition::reconcile_error("second")));
        assert_eq!(conditions[0].message.as_deref(), Some("second"));
    }

    #[test]
    fn test_condition_serializes_type_field() {
        let json = serde_json::to_value(Condition::references_not_ready("bucket b not ready"))
            .expect("serialize");
        assert_eq!(json["type"], "Synced");
        assert_eq!(json["status"], "False");
        assert_eq!(json["reason"], "ReferencesNotReady");
        assert!(json.get("lastTransitionTime").is_some());
    }
}
