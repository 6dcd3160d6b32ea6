//! Feature flags
//!
//! DynaKube behavior toggles set through `feature.dynatrace.com/*` annotations.

use std::collections::BTreeMap;

/// Disables automatic ActiveGate updates
pub const DISABLE_ACTIVEGATE_UPDATES: &str = "feature.dynatrace.com/disable-activegate-updates";

/// Resolves images through the vendor-provided image metadata instead of composing them
pub const AUTOMATIC_REGISTRY: &str = "feature.dynatrace.com/automatic-registry";

/// Parsed feature flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// ActiveGate updates disabled
    pub disable_active_gate_updates: bool,

    /// Automatic registry selection enabled
    pub automatic_registry: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            disable_active_gate_updates: false,
            automatic_registry: true,
        }
    }
}

impl FeatureFlags {
    /// Reads flags from annotations; unknown or unparsable values keep the default.
    pub fn from_annotations(annotations: Option<&BTreeMap<String, String>>) -> Self {
        let defaults = Self::default();
        let Some(annotations) = annotations else {
            return defaults;
        };

        Self {
            disable_active_gate_updates: parse_bool(annotations.get(DISABLE_ACTIVEGATE_UPDATES))
                .unwrap_or(defaults.disable_active_gate_updates),
            automatic_registry: parse_bool(annotations.get(AUTOMATIC_REGISTRY))
                .unwrap_or(defaults.automatic_registry),
        }
    }
}

fn parse_bool(value: Option<&String>) -> Option<bool> {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}
