//! DynaKube CRD
//!
//! Declares the monitoring platform for a cluster: the tenant API, the
//! ActiveGate, the OneAgent deployment mode and code module injection.

use crate::conditions::Condition;
use crate::feature_flags::FeatureFlags;
use crate::version_status::VersionStatus;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Monitoring setup of a cluster against one Dynatrace tenant
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "dynatrace.com",
    version = "v1beta5",
    kind = "DynaKube",
    namespaced,
    status = "DynaKubeStatus",
    shortname = "dk"
)]
#[serde(rename_all = "camelCase")]
pub struct DynaKubeSpec {
    /// Tenant API URL (e.g. "https://abc12345.live.dynatrace.com/api")
    pub api_url: String,

    /// Name of the secret holding the API token (defaults to the DynaKube name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<String>,

    /// ActiveGate configuration
    #[serde(default)]
    pub active_gate: ActiveGateSpec,

    /// OneAgent deployment mode
    #[serde(default)]
    pub one_agent: OneAgentSpec,
}

/// ActiveGate deployment
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveGateSpec {
    /// Enabled capabilities (e.g. "routing", "kubernetes-monitoring"); empty disables the ActiveGate
    #[serde(default)]
    pub capabilities: Vec<String>,

    /// Custom ActiveGate image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// OneAgent deployment mode; at most one mode is set
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OneAgentSpec {
    /// Classic full-stack injection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classic_full_stack: Option<HostInjectSpec>,

    /// Cloud-native full-stack injection (host agent plus code modules)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_native_full_stack: Option<CloudNativeFullStackSpec>,

    /// Host monitoring only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_monitoring: Option<HostInjectSpec>,

    /// Application monitoring only (code modules, no host agent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_monitoring: Option<ApplicationMonitoringSpec>,
}

/// Host agent settings shared by the full-stack and host monitoring modes
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct HostInjectSpec {
    /// Custom OneAgent image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Pinned OneAgent version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Automatically follow the latest version (default: true)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_update: Option<bool>,
}

/// Cloud-native full-stack mode: host agent plus code module injection
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CloudNativeFullStackSpec {
    /// Host agent settings
    #[serde(flatten)]
    pub host: HostInjectSpec,

    /// Custom code modules image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_modules_image: Option<String>,
}

/// Application-only monitoring: code module injection without a host agent
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationMonitoringSpec {
    /// Pinned code modules version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Custom code modules image
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_modules_image: Option<String>,
}

/// Status of one managed component
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComponentStatus {
    /// Resolved version of the component
    #[serde(flatten)]
    pub version_status: VersionStatus,
}

/// Observed state written by the operator
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DynaKubeStatus {
    /// ActiveGate version status
    #[serde(default)]
    pub active_gate: ComponentStatus,

    /// OneAgent version status
    #[serde(default)]
    pub one_agent: ComponentStatus,

    /// Code modules version status
    #[serde(default)]
    pub code_modules: ComponentStatus,

    /// Conditions represent the latest available observations
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

impl DynaKube {
    /// Feature flags parsed from annotations
    pub fn feature_flags(&self) -> FeatureFlags {
        FeatureFlags::from_annotations(self.metadata.annotations.as_ref())
    }

    /// Name of the secret holding the API token
    pub fn tokens_secret_name(&self) -> Option<String> {
        non_empty(self.spec.tokens.as_ref()).or_else(|| self.metadata.name.clone())
    }

    /// Registry host of the tenant, derived from the API URL
    ///
    /// "https://abc12345.live.dynatrace.com/api" -> "abc12345.live.dynatrace.com"
    pub fn tenant_registry(&self) -> Option<String> {
        let url = self.spec.api_url.trim();
        let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
        let host = without_scheme.split('/').next().unwrap_or_default();
        if host.is_empty() {
            None
        } else {
            Some(host.to_string())
        }
    }

    /// Whether an ActiveGate is requested
    pub fn active_gate_enabled(&self) -> bool {
        !self.spec.active_gate.capabilities.is_empty()
    }

    /// Custom ActiveGate image, if one is pinned
    pub fn active_gate_custom_image(&self) -> Option<String> {
        non_empty(self.spec.active_gate.image.as_ref())
    }

    /// Host agent settings of the active OneAgent mode
    pub fn host_agent(&self) -> Option<&HostInjectSpec> {
        let one_agent = &self.spec.one_agent;
        one_agent
            .classic_full_stack
            .as_ref()
            .or_else(|| one_agent.cloud_native_full_stack.as_ref().map(|c| &c.host))
            .or(one_agent.host_monitoring.as_ref())
    }

    /// Custom OneAgent image, if one is pinned
    pub fn one_agent_custom_image(&self) -> Option<String> {
        self.host_agent().and_then(|h| non_empty(h.image.as_ref()))
    }

    /// Pinned OneAgent version, if any
    pub fn one_agent_custom_version(&self) -> Option<String> {
        self.host_agent().and_then(|h| non_empty(h.version.as_ref()))
    }

    /// Whether the OneAgent follows the latest version
    pub fn one_agent_auto_update(&self) -> bool {
        self.host_agent().and_then(|h| h.auto_update).unwrap_or(true)
    }

    /// Whether code modules are injected into application pods
    pub fn is_app_injection_needed(&self) -> bool {
        self.spec.one_agent.cloud_native_full_stack.is_some()
            || self.spec.one_agent.application_monitoring.is_some()
    }

    /// Custom code modules image, if one is pinned
    pub fn code_modules_custom_image(&self) -> Option<String> {
        let one_agent = &self.spec.one_agent;
        let image = one_agent
            .cloud_native_full_stack
            .as_ref()
            .and_then(|c| c.code_modules_image.as_ref())
            .or_else(|| {
                one_agent
                    .application_monitoring
                    .as_ref()
                    .and_then(|a| a.code_modules_image.as_ref())
            });
        non_empty(image)
    }

    /// Pinned code modules version, if any
    pub fn code_modules_custom_version(&self) -> Option<String> {
        self.spec
            .one_agent
            .application_monitoring
            .as_ref()
            .and_then(|a| non_empty(a.version.as_ref()))
    }
}
