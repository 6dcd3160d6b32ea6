//! OneAgent version updater.
//!
//! Covers the host-level modes: classic full-stack, cloud-native full-stack
//! and host monitoring. Application monitoring has no host agent and is
//! handled by the code modules updater.

use crate::version::agent_version::is_downgrade;
use crate::version::error::VersionError;
use crate::version::image::{default_image, get_tag_from_image_id};
use crate::version::updater::StatusUpdater;
use crds::{Condition, DynaKube, DynaKubeStatus, VersionConditionType, VersionSource, VersionStatus};
use dynatrace_client::{DynatraceClientTrait, ImageComponent, InstallerType, OsType};
use tracing::debug;

/// Repository of the OneAgent image inside the tenant registry
pub const ONE_AGENT_REPOSITORY: &str = "linux/oneagent";

/// Resolves the OneAgent image and version of a DynaKube.
pub struct OneAgentUpdater<'a> {
    dk: &'a DynaKube,
    status: &'a mut DynaKubeStatus,
    client: &'a dyn DynatraceClientTrait,
}

impl<'a> OneAgentUpdater<'a> {
    /// Creates an updater writing into `status`.
    pub fn new(dk: &'a DynaKube, status: &'a mut DynaKubeStatus, client: &'a dyn DynatraceClientTrait) -> Self {
        Self { dk, status, client }
    }

    fn registry(&self) -> Result<String, VersionError> {
        self.dk
            .tenant_registry()
            .ok_or_else(|| VersionError::InvalidConfig("apiUrl does not contain a tenant host".to_string()))
    }
}

#[async_trait::async_trait]
impl StatusUpdater for OneAgentUpdater<'_> {
    fn name(&self) -> &'static str {
        "oneagent"
    }

    fn condition_type(&self) -> VersionConditionType {
        VersionConditionType::OneAgent
    }

    fn is_enabled(&self) -> bool {
        self.dk.host_agent().is_some()
    }

    fn target(&self) -> &VersionStatus {
        &self.status.one_agent.version_status
    }

    fn target_mut(&mut self) -> &mut VersionStatus {
        &mut self.status.one_agent.version_status
    }

    fn conditions_mut(&mut self) -> &mut Vec<Condition> {
        &mut self.status.conditions
    }

    fn custom_image(&self) -> Option<String> {
        self.dk.one_agent_custom_image()
    }

    fn custom_version(&self) -> Option<String> {
        self.dk.one_agent_custom_version()
    }

    fn is_auto_update_enabled(&self) -> bool {
        self.dk.one_agent_auto_update()
    }

    fn is_auto_registry_enabled(&self) -> bool {
        self.dk.feature_flags().automatic_registry
    }

    /// Only versions previously taken from the tenant are protected.
    fn check_for_downgrade(&self, candidate_version: &str) -> Result<bool, VersionError> {
        let current = self.target();
        if current.source != Some(VersionSource::TenantRegistry) || current.version.is_empty() {
            return Ok(false);
        }
        is_downgrade(&current.version, candidate_version)
    }

    async fn use_tenant_registry(&self) -> Result<VersionStatus, VersionError> {
        if let Some(version) = self.custom_version() {
            debug!("Using pinned OneAgent version {}", version);
            return Ok(VersionStatus {
                image_id: default_image(&self.registry()?, ONE_AGENT_REPOSITORY, &version),
                version,
                ..Default::default()
            });
        }

        if self.is_auto_registry_enabled() {
            let image = self.client.get_latest_image(ImageComponent::OneAgent).await?;
            let image_id = image.uri();
            let version = get_tag_from_image_id(&image_id)?;
            return Ok(VersionStatus {
                version,
                image_id,
                ..Default::default()
            });
        }

        let registry = self.registry()?;
        let version = self
            .client
            .get_latest_agent_version(OsType::Unix, InstallerType::Default)
            .await?;
        Ok(VersionStatus {
            image_id: default_image(&registry, ONE_AGENT_REPOSITORY, &version),
            version,
            ..Default::default()
        })
    }

    fn validate_status(&self) -> Result<(), VersionError> {
        if self.target().version.is_empty() {
            return Err(VersionError::Validation(
                "build version of OneAgent image is not set".to_string(),
            ));
        }
        Ok(())
    }
}
