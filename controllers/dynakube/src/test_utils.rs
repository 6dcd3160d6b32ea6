//! Test utilities for unit testing the version reconciler
//!
//! This module provides DynaKube fixtures and a scriptable `StatusUpdater`.

#[cfg(test)]
use crate::version::error::VersionError;
#[cfg(test)]
use crate::version::updater::StatusUpdater;
#[cfg(test)]
use crds::*;
#[cfg(test)]
use dynatrace_client::DynatraceError;
#[cfg(test)]
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
#[cfg(test)]
use std::collections::BTreeMap;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
#[cfg(test)]
use std::time::Duration;

/// Tenant API URL used by the fixtures
#[cfg(test)]
pub const TEST_API_URL: &str = "https://abc12345.live.dynatrace.com/api";

/// Registry host derived from `TEST_API_URL`
#[cfg(test)]
pub const TEST_REGISTRY: &str = "abc12345.live.dynatrace.com";

/// Helper to create a test DynaKube with the given spec
#[cfg(test)]
pub fn create_test_dynakube(name: &str, namespace: &str, spec: DynaKubeSpec) -> DynaKube {
    DynaKube {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        spec,
        status: None,
    }
}

/// Helper to create a DynaKube spec pointing at the test tenant
#[cfg(test)]
pub fn test_spec() -> DynaKubeSpec {
    DynaKubeSpec {
        api_url: TEST_API_URL.to_string(),
        ..Default::default()
    }
}

/// Helper to create a DynaKube with an ActiveGate
#[cfg(test)]
pub fn create_test_active_gate_dynakube(image: Option<&str>) -> DynaKube {
    let mut spec = test_spec();
    spec.active_gate = ActiveGateSpec {
        capabilities: vec!["routing".to_string()],
        image: image.map(str::to_string),
    };
    create_test_dynakube("dynakube", "dynatrace", spec)
}

/// Helper to create a DynaKube in cloud-native full-stack mode
#[cfg(test)]
pub fn create_test_cloud_native_dynakube(host: HostInjectSpec) -> DynaKube {
    let mut spec = test_spec();
    spec.one_agent.cloud_native_full_stack = Some(CloudNativeFullStackSpec {
        host,
        code_modules_image: None,
    });
    create_test_dynakube("dynakube", "dynatrace", spec)
}

/// Helper to create a DynaKube in classic full-stack mode
#[cfg(test)]
pub fn create_test_classic_dynakube(host: HostInjectSpec) -> DynaKube {
    let mut spec = test_spec();
    spec.one_agent.classic_full_stack = Some(host);
    create_test_dynakube("dynakube", "dynatrace", spec)
}

/// Helper to create a DynaKube in application monitoring mode
#[cfg(test)]
pub fn create_test_app_monitoring_dynakube(version: Option<&str>, image: Option<&str>) -> DynaKube {
    let mut spec = test_spec();
    spec.one_agent.application_monitoring = Some(ApplicationMonitoringSpec {
        version: version.map(str::to_string),
        code_modules_image: image.map(str::to_string),
    });
    create_test_dynakube("dynakube", "dynatrace", spec)
}

/// Sets a feature flag annotation on a DynaKube
#[cfg(test)]
pub fn with_annotation(mut dk: DynaKube, key: &str, value: &str) -> DynaKube {
    dk.metadata
        .annotations
        .get_or_insert_with(BTreeMap::new)
        .insert(key.to_string(), value.to_string());
    dk
}

/// Scripted outcome of `FakeUpdater::use_tenant_registry`
#[cfg(test)]
#[derive(Debug, Clone)]
pub enum FakeProbe {
    /// Resolve to the given status
    Resolve(VersionStatus),
    /// Fail with a vendor API error
    ApiError(String),
    /// Fail with an image parse error
    InvalidImage(String),
    /// Never answer within the given duration
    Hang(Duration),
}

/// Scripted outcome of `FakeUpdater::check_for_downgrade`
#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeDowngrade {
    No,
    Yes,
    Invalid,
}

/// `StatusUpdater` whose answers are set up by the test.
#[cfg(test)]
pub struct FakeUpdater {
    pub enabled: bool,
    pub status: VersionStatus,
    pub conditions: Vec<Condition>,
    pub custom_image: Option<String>,
    pub custom_version: Option<String>,
    pub auto_update: bool,
    pub auto_registry: bool,
    pub probe: FakeProbe,
    pub downgrade: FakeDowngrade,
    pub validation_error: Option<String>,
    probes: AtomicUsize,
}

#[cfg(test)]
impl FakeUpdater {
    /// Enabled updater that resolves to "1.2.3.4-5"
    pub fn new() -> Self {
        Self {
            enabled: true,
            status: VersionStatus::default(),
            conditions: Vec::new(),
            custom_image: None,
            custom_version: None,
            auto_update: true,
            auto_registry: false,
            probe: FakeProbe::Resolve(VersionStatus {
                version: "1.2.3.4-5".to_string(),
                image_id: format!("{}/linux/oneagent:1.2.3.4-5", TEST_REGISTRY),
                ..Default::default()
            }),
            downgrade: FakeDowngrade::No,
            validation_error: None,
            probes: AtomicUsize::new(0),
        }
    }

    pub fn with_custom_image(mut self, image: &str) -> Self {
        self.custom_image = Some(image.to_string());
        self
    }

    pub fn with_custom_version(mut self, version: &str) -> Self {
        self.custom_version = Some(version.to_string());
        self
    }

    pub fn with_auto_update(mut self, enabled: bool) -> Self {
        self.auto_update = enabled;
        self
    }

    pub fn with_auto_registry(mut self, enabled: bool) -> Self {
        self.auto_registry = enabled;
        self
    }

    pub fn with_status(mut self, status: VersionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_probe(mut self, probe: FakeProbe) -> Self {
        self.probe = probe;
        self
    }

    pub fn with_downgrade(mut self, downgrade: FakeDowngrade) -> Self {
        self.downgrade = downgrade;
        self
    }

    pub fn with_validation_error(mut self, message: &str) -> Self {
        self.validation_error = Some(message.to_string());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Number of times the tenant registry was probed
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    /// The single condition this updater owns, if present
    pub fn condition(&self) -> Option<&Condition> {
        find_condition(&self.conditions, VersionConditionType::OneAgent)
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl StatusUpdater for FakeUpdater {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn condition_type(&self) -> VersionConditionType {
        VersionConditionType::OneAgent
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn target(&self) -> &VersionStatus {
        &self.status
    }

    fn target_mut(&mut self) -> &mut VersionStatus {
        &mut self.status
    }

    fn conditions_mut(&mut self) -> &mut Vec<Condition> {
        &mut self.conditions
    }

    fn custom_image(&self) -> Option<String> {
        self.custom_image.clone()
    }

    fn custom_version(&self) -> Option<String> {
        self.custom_version.clone()
    }

    fn is_auto_update_enabled(&self) -> bool {
        self.auto_update
    }

    fn is_auto_registry_enabled(&self) -> bool {
        self.auto_registry
    }

    fn check_for_downgrade(&self, candidate_version: &str) -> Result<bool, VersionError> {
        match self.downgrade {
            FakeDowngrade::No => Ok(false),
            FakeDowngrade::Yes => Ok(true),
            FakeDowngrade::Invalid => Err(VersionError::InvalidVersion {
                version: candidate_version.to_string(),
                reason: "scripted parse failure".to_string(),
            }),
        }
    }

    async fn use_tenant_registry(&self) -> Result<VersionStatus, VersionError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        match &self.probe {
            FakeProbe::Resolve(status) => {
                let mut status = status.clone();
                if let Some(version) = &self.custom_version {
                    status.version = version.clone();
                }
                Ok(status)
            }
            FakeProbe::ApiError(message) => Err(VersionError::Dynatrace(DynatraceError::Api {
                status: 500,
                message: message.clone(),
            })),
            FakeProbe::InvalidImage(image) => {
                Err(crate::version::image::get_tag_from_image_id(image).err().map_or_else(
                    || VersionError::Validation(format!("'{}' unexpectedly parsed", image)),
                    VersionError::Image,
                ))
            }
            FakeProbe::Hang(duration) => {
                tokio::time::sleep(*duration).await;
                Err(VersionError::Validation("probe should have timed out".to_string()))
            }
        }
    }

    fn validate_status(&self) -> Result<(), VersionError> {
        match &self.validation_error {
            Some(message) => Err(VersionError::Validation(message.clone())),
            None => Ok(()),
        }
    }
}
