//! Version source precedence.

use crate::version::updater::StatusUpdater;
use crds::VersionSource;

/// Picks the source a component's version comes from.
///
/// Custom image wins over custom version, which wins over the tenant
/// registry. The auto-update and auto-registry flags decide whether and how
/// the tenant registry is probed, never which source wins. Classic
/// full-stack follows the same precedence.
pub fn determine_source(updater: &dyn StatusUpdater) -> VersionSource {
    if updater.custom_image().is_some() {
        VersionSource::CustomImage
    } else if updater.custom_version().is_some() {
        VersionSource::CustomVersion
    } else {
        VersionSource::TenantRegistry
    }
}
