//! Code modules version updater.

use crate::version::error::VersionError;
use crate::version::updater::StatusUpdater;
use crds::{Condition, DynaKube, DynaKubeStatus, VersionConditionType, VersionStatus};
use dynatrace_client::{DynatraceClientTrait, InstallerType, OsType};

/// Resolves the code modules version of a DynaKube.
pub struct CodeModulesUpdater<'a> {
    dk: &'a DynaKube,
    status: &'a mut DynaKubeStatus,
    client: &'a dyn DynatraceClientTrait,
}

impl<'a> CodeModulesUpdater<'a> {
    /// Creates an updater writing into `status`.
    pub fn new(dk: &'a DynaKube, status: &'a mut DynaKubeStatus, client: &'a dyn DynatraceClientTrait) -> Self {
        Self { dk, status, client }
    }
}

#[async_trait::async_trait]
impl StatusUpdater for CodeModulesUpdater<'_> {
    fn name(&self) -> &'static str {
        "codemodules"
    }

    fn condition_type(&self) -> VersionConditionType {
        VersionConditionType::CodeModules
    }

    fn is_enabled(&self) -> bool {
        self.dk.is_app_injection_needed()
    }

    fn target(&self) -> &VersionStatus {
        &self.status.code_modules.version_status
    }

    fn target_mut(&mut self) -> &mut VersionStatus {
        &mut self.status.code_modules.version_status
    }

    fn conditions_mut(&mut self) -> &mut Vec<Condition> {
        &mut self.status.conditions
    }

    fn custom_image(&self) -> Option<String> {
        self.dk.code_modules_custom_image()
    }

    fn custom_version(&self) -> Option<String> {
        self.dk.code_modules_custom_version()
    }

    fn is_auto_update_enabled(&self) -> bool {
        true
    }

    fn is_auto_registry_enabled(&self) -> bool {
        self.dk.feature_flags().automatic_registry
    }

    fn check_for_downgrade(&self, _candidate_version: &str) -> Result<bool, VersionError> {
        Ok(false)
    }

    // Code modules are downloaded as a zip, so only the version is tracked
    async fn use_tenant_registry(&self) -> Result<VersionStatus, VersionError> {
        let version = match self.custom_version() {
            Some(version) => version,
            None => {
                self.client
                    .get_latest_agent_version(OsType::Unix, InstallerType::PaaS)
                    .await?
            }
        };
        Ok(VersionStatus {
            version,
            ..Default::default()
        })
    }

    fn validate_status(&self) -> Result<(), VersionError> {
        Ok(())
    }
}
