//! Version status
//!
//! Per-component record of which image and version was selected, where the
//! decision came from and when it was last probed.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a resolved version came from.
///
/// Serializes as kebab-case ("tenant-registry", "custom-image", "custom-version").
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum VersionSource {
    /// Resolved against the vendor registry for the tenant
    TenantRegistry,

    /// An explicit image reference was pinned in the spec
    CustomImage,

    /// An explicit version string was pinned in the spec
    CustomVersion,
}

impl VersionSource {
    /// Wire representation, also used as the version sentinel for custom images.
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionSource::TenantRegistry => "tenant-registry",
            VersionSource::CustomImage => "custom-image",
            VersionSource::CustomVersion => "custom-version",
        }
    }
}

impl fmt::Display for VersionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved version of a single managed component.
///
/// The `Default` value is the "zero" status a disabled component carries.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VersionStatus {
    /// Version string (vendor version or the custom-image sentinel)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// Fully qualified image reference selected for the component
    #[serde(default, rename = "imageID", skip_serializing_if = "String::is_empty")]
    pub image_id: String,

    /// Source the version was resolved from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<VersionSource>,

    /// Time of the last accepted resolution attempt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_probe_timestamp: Option<DateTime<Utc>>,
}

impl VersionStatus {
    /// A status is empty when it records neither a version nor an image.
    pub fn is_empty(&self) -> bool {
        self.version.is_empty() && self.image_id.is_empty()
    }

    /// Records a probe at `now`, never moving the timestamp backwards.
    pub fn mark_probed(&mut self, source: VersionSource, now: DateTime<Utc>) {
        let stamp = match self.last_probe_timestamp {
            Some(previous) if previous > now => previous,
            _ => now,
        };
        self.last_probe_timestamp = Some(stamp);
        self.source = Some(source);
    }
}
