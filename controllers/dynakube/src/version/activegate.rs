//! ActiveGate version updater.

use crate::version::error::VersionError;
use crate::version::image::{default_image, get_tag_from_image_id};
use crate::version::updater::StatusUpdater;
use crds::{Condition, DynaKube, DynaKubeStatus, VersionConditionType, VersionStatus};
use dynatrace_client::{DynatraceClientTrait, ImageComponent, OsType};

/// Repository of the ActiveGate image inside the tenant registry
pub const ACTIVE_GATE_REPOSITORY: &str = "linux/activegate";

/// Resolves the ActiveGate image and version of a DynaKube.
pub struct ActiveGateUpdater<'a> {
    dk: &'a DynaKube,
    status: &'a mut DynaKubeStatus,
    client: &'a dyn DynatraceClientTrait,
}

impl<'a> ActiveGateUpdater<'a> {
    /// Creates an updater writing into `status`.
    pub fn new(dk: &'a DynaKube, status: &'a mut DynaKubeStatus, client: &'a dyn DynatraceClientTrait) -> Self {
        Self { dk, status, client }
    }
}

#[async_trait::async_trait]
impl StatusUpdater for ActiveGateUpdater<'_> {
    fn name(&self) -> &'static str {
        "activegate"
    }

    fn condition_type(&self) -> VersionConditionType {
        VersionConditionType::ActiveGate
    }

    fn is_enabled(&self) -> bool {
        self.dk.active_gate_enabled()
    }

    fn target(&self) -> &VersionStatus {
        &self.status.active_gate.version_status
    }

    fn target_mut(&mut self) -> &mut VersionStatus {
        &mut self.status.active_gate.version_status
    }

    fn conditions_mut(&mut self) -> &mut Vec<Condition> {
        &mut self.status.conditions
    }

    fn custom_image(&self) -> Option<String> {
        self.dk.active_gate_custom_image()
    }

    // The ActiveGate cannot be pinned to a version
    fn custom_version(&self) -> Option<String> {
        None
    }

    fn is_auto_update_enabled(&self) -> bool {
        !self.dk.feature_flags().disable_active_gate_updates
    }

    fn is_auto_registry_enabled(&self) -> bool {
        self.dk.feature_flags().automatic_registry
    }

    fn check_for_downgrade(&self, _candidate_version: &str) -> Result<bool, VersionError> {
        Ok(false)
    }

    async fn use_tenant_registry(&self) -> Result<VersionStatus, VersionError> {
        if self.is_auto_registry_enabled() {
            let image = self.client.get_latest_image(ImageComponent::ActiveGate).await?;
            let image_id = image.uri();
            let version = get_tag_from_image_id(&image_id)?;
            return Ok(VersionStatus {
                version,
                image_id,
                ..Default::default()
            });
        }

        let registry = self
            .dk
            .tenant_registry()
            .ok_or_else(|| VersionError::InvalidConfig("apiUrl does not contain a tenant host".to_string()))?;
        let version = self.client.get_latest_active_gate_version(OsType::Unix).await?;
        Ok(VersionStatus {
            image_id: default_image(&registry, ACTIVE_GATE_REPOSITORY, &version),
            version,
            ..Default::default()
        })
    }

    fn validate_status(&self) -> Result<(), VersionError> {
        if self.target().version.is_empty() {
            return Err(VersionError::Validation(
                "build version of ActiveGate image is not set".to_string(),
            ));
        }
        Ok(())
    }
}
