//! Dynatrace deployment API data models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Operating system of an installer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OsType {
    /// Linux/Unix installers
    Unix,
}

impl OsType {
    /// Path segment used by the deployment API
    pub fn as_str(&self) -> &'static str {
        match self {
            OsType::Unix => "unix",
        }
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Installer flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallerType {
    /// Full host installer
    Default,
    /// PaaS installer (code modules)
    PaaS,
}

impl InstallerType {
    /// Path segment used by the deployment API
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallerType::Default => "default",
            InstallerType::PaaS => "paas",
        }
    }
}

impl fmt::Display for InstallerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Component whose image metadata can be requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageComponent {
    /// OneAgent host image
    OneAgent,
    /// ActiveGate image
    ActiveGate,
}

impl fmt::Display for ImageComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageComponent::OneAgent => f.write_str("oneagent"),
            ImageComponent::ActiveGate => f.write_str("activegate"),
        }
    }
}

/// Response of `/v1/deployment/installer/agent/{os}/{installer}/latest/metainfo`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LatestAgentVersion {
    /// Latest agent version, e.g. "1.285.0.20240101-120000"
    pub latest_agent_version: String,
}

/// Response of `/v1/deployment/installer/gateway/{os}/latest/metainfo`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LatestGatewayVersion {
    /// Latest ActiveGate version
    pub latest_gateway_version: String,
}

/// Response of `/v1/deployment/image/.../latest`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LatestImageInfo {
    /// Image repository, e.g. "public.ecr.aws/dynatrace/dynatrace-oneagent"
    pub source: String,
    /// Image tag, e.g. "1.285.0.20240101-120000"
    pub tag: String,
}

impl LatestImageInfo {
    /// Full image reference "source:tag"
    pub fn uri(&self) -> String {
        format!("{}:{}", self.source, self.tag)
    }
}
