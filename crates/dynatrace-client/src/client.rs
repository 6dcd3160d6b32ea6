//! Dynatrace API client
//!
//! Implements the subset of the Dynatrace deployment API the operator needs
//! to resolve component versions:
//! /api/v1/deployment/installer/... and /api/v1/deployment/image/...

use crate::error::DynatraceError;
use crate::models::*;
use crate::client_trait::DynatraceClientTrait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Dynatrace API client
pub struct DynatraceClient {
    client: Client,
    base_url: String,
    token: String,
}

impl DynatraceClient {
    /// Create a new Dynatrace client
    ///
    /// # Arguments
    /// * `base_url` - Tenant API URL (e.g., "https://abc12345.live.dynatrace.com/api")
    /// * `token` - API token with the `InstallerDownload` scope
    pub fn new(base_url: String, token: String) -> Result<Self, DynatraceError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Issue an authenticated GET and decode the JSON body
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, DynatraceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self.client
            .get(&url)
            .header("Authorization", format!("Api-Token {}", self.token))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status == 401 || status == 403 {
            return Err(DynatraceError::Authentication(format!(
                "{} rejected the API token: {} - {}",
                path, status, body
            )));
        }

        if !status.is_success() {
            return Err(DynatraceError::Api {
                status: status.as_u16(),
                message: format!("GET {} failed: {}", path, body),
            });
        }

        let decoded = serde_json::from_str(&body)?;
        Ok(decoded)
    }
}

fn require_non_empty(value: String, what: &str) -> Result<String, DynatraceError> {
    if value.trim().is_empty() {
        return Err(DynatraceError::InvalidResponse(format!("{} is empty", what)));
    }
    Ok(value)
}

#[async_trait::async_trait]
impl DynatraceClientTrait for DynatraceClient {
    async fn get_latest_agent_version(&self, os: OsType, installer_type: InstallerType) -> Result<String, DynatraceError> {
        let path = format!("/v1/deployment/installer/agent/{}/{}/latest/metainfo", os, installer_type);
        let response: LatestAgentVersion = self.get_json(&path).await?;
        require_non_empty(response.latest_agent_version, "latestAgentVersion")
    }

    async fn get_latest_active_gate_version(&self, os: OsType) -> Result<String, DynatraceError> {
        let path = format!("/v1/deployment/installer/gateway/{}/latest/metainfo", os);
        let response: LatestGatewayVersion = self.get_json(&path).await?;
        require_non_empty(response.latest_gateway_version, "latestGatewayVersion")
    }

    async fn get_latest_image(&self, component: ImageComponent) -> Result<LatestImageInfo, DynatraceError> {
        let path = match component {
            ImageComponent::OneAgent => "/v1/deployment/image/agent/oneAgent/latest",
            ImageComponent::ActiveGate => "/v1/deployment/image/gateway/latest",
        };
        let info: LatestImageInfo = self.get_json(path).await?;
        if info.source.trim().is_empty() {
            return Err(DynatraceError::InvalidResponse(format!("{} image source is empty", component)));
        }
        Ok(info)
    }
}
