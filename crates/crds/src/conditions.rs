//! Status conditions
//!
//! Condition ledger stored on the DynaKube status. One entry per condition
//! type; setting an entry with an unchanged status and reason keeps the
//! existing transition time and only refreshes the message.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Condition status (True, False, Unknown)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
pub enum ConditionStatus {
    /// Condition holds
    True,

    /// Condition does not hold
    False,

    /// State not yet known
    #[default]
    Unknown,
}

/// Condition types written by the version reconciler, one per managed component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionConditionType {
    /// ActiveGate version resolution
    ActiveGate,

    /// OneAgent version resolution
    OneAgent,

    /// Code modules version resolution
    CodeModules,
}

impl VersionConditionType {
    /// Key stored in the condition `type` field
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionConditionType::ActiveGate => "ActiveGateVersion",
            VersionConditionType::OneAgent => "OneAgentVersion",
            VersionConditionType::CodeModules => "CodeModulesVersion",
        }
    }
}

impl fmt::Display for VersionConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Condition represents an observation of the resource state
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,

    /// Status of the condition
    pub status: ConditionStatus,

    /// Machine-readable reason for the last transition
    pub reason: String,

    /// Human-readable message
    #[serde(default)]
    pub message: String,

    /// Last time the status or reason changed
    pub last_transition_time: DateTime<Utc>,
}

impl Condition {
    /// Creates a condition for the given type.
    pub fn new(
        condition_type: VersionConditionType,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            r#type: condition_type.as_str().to_string(),
            status,
            reason: reason.into(),
            message: message.into(),
            last_transition_time: now,
        }
    }
}

/// Inserts or replaces the condition with the same type.
///
/// An entry with the same status and reason keeps its transition time; only
/// its message is updated. Returns whether the ledger changed.
pub fn set_condition(conditions: &mut Vec<Condition>, condition: Condition) -> bool {
    match conditions.iter_mut().find(|c| c.r#type == condition.r#type) {
        Some(existing) if existing.status == condition.status && existing.reason == condition.reason => {
            if existing.message == condition.message {
                return false;
            }
            existing.message = condition.message;
            true
        }
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

/// Removes the condition of the given type. Returns whether one was removed.
pub fn remove_condition(conditions: &mut Vec<Condition>, condition_type: VersionConditionType) -> bool {
    let before = conditions.len();
    conditions.retain(|c| c.r#type != condition_type.as_str());
    conditions.len() != before
}

/// Looks up the condition of the given type.
pub fn find_condition(conditions: &[Condition], condition_type: VersionConditionType) -> Option<&Condition> {
    conditions.iter().find(|c| c.r#type == condition_type.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_set_condition_inserts() {
        let mut conditions = Vec::new();
        let changed = set_condition(
            &mut conditions,
            Condition::new(VersionConditionType::ActiveGate, ConditionStatus::True, "Verified", "ok", t0()),
        );
        assert!(changed);
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].r#type, "ActiveGateVersion");
    }

    #[test]
    fn test_set_condition_same_status_and_reason_keeps_timestamp() {
        let mut conditions = vec![Condition::new(
            VersionConditionType::OneAgent,
            ConditionStatus::True,
            "Verified",
            "first",
            t0(),
        )];

        let later = t0() + Duration::minutes(5);
        let changed = set_condition(
            &mut conditions,
            Condition::new(VersionConditionType::OneAgent, ConditionStatus::True, "Verified", "second", later),
        );

        assert!(changed);
        assert_eq!(conditions[0].last_transition_time, t0());
        assert_eq!(conditions[0].message, "second");
    }

    #[test]
    fn test_set_condition_identical_is_noop() {
        let mut conditions = vec![Condition::new(
            VersionConditionType::OneAgent,
            ConditionStatus::True,
            "Verified",
            "same",
            t0(),
        )];

        let changed = set_condition(
            &mut conditions,
            Condition::new(VersionConditionType::OneAgent, ConditionStatus::True, "Verified", "same", t0() + Duration::minutes(5)),
        );

        assert!(!changed);
        assert_eq!(conditions[0].last_transition_time, t0());
    }

    #[test]
    fn test_set_condition_reason_change_updates_timestamp() {
        let mut conditions = vec![Condition::new(
            VersionConditionType::OneAgent,
            ConditionStatus::True,
            "Verified",
            "",
            t0(),
        )];

        let later = t0() + Duration::minutes(5);
        let changed = set_condition(
            &mut conditions,
            Condition::new(VersionConditionType::OneAgent, ConditionStatus::False, "DynatraceApiError", "boom", later),
        );

        assert!(changed);
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].last_transition_time, later);
        assert_eq!(conditions[0].status, ConditionStatus::False);
    }

    #[test]
    fn test_remove_condition_only_touches_matching_type() {
        let mut conditions = vec![
            Condition::new(VersionConditionType::ActiveGate, ConditionStatus::True, "Verified", "", t0()),
            Condition::new(VersionConditionType::CodeModules, ConditionStatus::True, "Verified", "", t0()),
        ];

        assert!(remove_condition(&mut conditions, VersionConditionType::ActiveGate));
        assert!(!remove_condition(&mut conditions, VersionConditionType::ActiveGate));
        assert!(find_condition(&conditions, VersionConditionType::CodeModules).is_some());
        assert!(find_condition(&conditions, VersionConditionType::ActiveGate).is_none());
    }
}
