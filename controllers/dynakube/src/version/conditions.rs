//! Version condition reasons.
//!
//! Thin helpers that write the per-component version condition with one of
//! the reasons below.

use crate::version::error::VersionError;
use chrono::{DateTime, Utc};
use crds::{set_condition, Condition, ConditionStatus, VersionConditionType};

/// Version was resolved against the tenant
pub const REASON_VERIFIED: &str = "Verified";
/// Custom image or version was used without contacting the tenant
pub const REASON_VERIFICATION_SKIPPED: &str = "VerificationSkipped";
/// Vendor API call failed
pub const REASON_DYNATRACE_API_ERROR: &str = "DynatraceApiError";
/// Newer status rejected because it would move backwards
pub const REASON_DOWNGRADE_SKIPPED: &str = "DowngradeSkipped";
/// Image or version string could not be parsed
pub const REASON_INVALID_VERSION: &str = "InvalidVersion";
/// Resolved status did not pass validation
pub const REASON_VALIDATION_FAILED: &str = "ValidationFailed";

/// Records a version resolved from the tenant.
pub fn set_verified(conditions: &mut Vec<Condition>, condition_type: VersionConditionType, version: &str, now: DateTime<Utc>) {
    set_condition(
        conditions,
        Condition::new(
            condition_type,
            ConditionStatus::True,
            REASON_VERIFIED,
            format!("Version {} resolved from the tenant registry", version),
            now,
        ),
    );
}

/// Records a custom image or version used without contacting the tenant.
pub fn set_verification_skipped(conditions: &mut Vec<Condition>, condition_type: VersionConditionType, now: DateTime<Utc>) {
    set_condition(
        conditions,
        Condition::new(
            condition_type,
            ConditionStatus::True,
            REASON_VERIFICATION_SKIPPED,
            "Custom image or version is used, verification skipped",
            now,
        ),
    );
}

/// Records a rejected update that would have moved to an older version.
pub fn set_downgrade_skipped(
    conditions: &mut Vec<Condition>,
    condition_type: VersionConditionType,
    current: &str,
    candidate: &str,
    now: DateTime<Utc>,
) {
    set_condition(
        conditions,
        Condition::new(
            condition_type,
            ConditionStatus::True,
            REASON_DOWNGRADE_SKIPPED,
            format!("Keeping version {}, update to older version {} skipped", current, candidate),
            now,
        ),
    );
}

/// Records a failed resolution, choosing the reason from the error kind.
pub fn set_failed(conditions: &mut Vec<Condition>, condition_type: VersionConditionType, error: &VersionError, now: DateTime<Utc>) {
    let reason = if error.is_api_error() {
        REASON_DYNATRACE_API_ERROR
    } else if error.is_parse_error() {
        REASON_INVALID_VERSION
    } else {
        REASON_VALIDATION_FAILED
    };
    set_condition(
        conditions,
        Condition::new(condition_type, ConditionStatus::False, reason, error.to_string(), now),
    );
}
