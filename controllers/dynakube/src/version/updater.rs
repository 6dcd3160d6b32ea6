//! Updatable component contract.
//!
//! Every managed component (ActiveGate, OneAgent, code modules) implements
//! `StatusUpdater`. The version reconciler is written once against this
//! trait. Implementations only answer questions and probe the vendor API;
//! all writes to the status subtree and the condition ledger are done by
//! the reconciler.

use crate::version::error::VersionError;
use crds::{Condition, VersionConditionType, VersionStatus};

/// Capability set of a managed component.
#[async_trait::async_trait]
pub trait StatusUpdater: Send + Sync {
    /// Stable identifier used in logs
    fn name(&self) -> &'static str;

    /// Condition type owned by this component
    fn condition_type(&self) -> VersionConditionType;

    /// Whether the component is requested by the DynaKube spec
    fn is_enabled(&self) -> bool;

    /// Recorded version status of the component
    fn target(&self) -> &VersionStatus;

    /// Mutable access to the recorded version status
    fn target_mut(&mut self) -> &mut VersionStatus;

    /// Condition ledger of the DynaKube
    fn conditions_mut(&mut self) -> &mut Vec<Condition>;

    /// Explicitly pinned image reference
    fn custom_image(&self) -> Option<String>;

    /// Explicitly pinned version
    fn custom_version(&self) -> Option<String>;

    /// Whether the latest version may be followed automatically
    fn is_auto_update_enabled(&self) -> bool;

    /// Whether the image comes from vendor image metadata rather than being
    /// composed from the tenant registry host. Never affects source selection.
    fn is_auto_registry_enabled(&self) -> bool;

    /// Whether adopting `candidate_version` would move backwards from the
    /// recorded version. Fails only on malformed version strings.
    fn check_for_downgrade(&self, candidate_version: &str) -> Result<bool, VersionError>;

    /// Resolves the version (and image, if the component has one) to use.
    /// The returned status is committed by the caller.
    async fn use_tenant_registry(&self) -> Result<VersionStatus, VersionError>;

    /// Post-resolution check of the recorded status
    fn validate_status(&self) -> Result<(), VersionError>;
}
