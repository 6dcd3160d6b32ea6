//! DynaKube reconciliation.
//!
//! One pass per DynaKube: read the API token, resolve component versions
//! against the tenant and write the status subresource back. Deployment of
//! the resolved images is left to the component appliers, which read the
//! status written here.
//!
//! A missing or unusable token does not end the pass early. Components that
//! need the tenant then fail with a `DynatraceApiError` condition, the others
//! are resolved as usual.

use crate::backoff::BackoffStates;
use crate::error::ControllerError;
use crate::version::{VersionError, VersionReconciler};
use crds::{DynaKube, DynaKubeStatus};
use dynatrace_client::{
    DynatraceClient, DynatraceClientTrait, DynatraceError, ImageComponent, InstallerType, LatestImageInfo, OsType,
};
use k8s_openapi::api::core::v1::Secret;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use kube_runtime::controller::Action;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Key of the API token inside the tokens secret
pub const API_TOKEN_KEY: &str = "apiToken";

/// Result of a version pass over one DynaKube.
#[derive(Debug)]
pub struct VersionOutcome {
    /// Status after the pass
    pub status: DynaKubeStatus,
    /// Whether the status differs from the one the pass started with
    pub changed: bool,
    /// Failures of individual components
    pub result: Result<(), VersionError>,
}

/// Reconciles DynaKube resources.
pub struct Reconciler {
    kube_client: Client,
    versions: VersionReconciler,
    reconcile_interval: Duration,
    /// Error count tracking per resource (namespace/name)
    backoff_states: BackoffStates,
}

impl Reconciler {
    /// Creates a reconciler requeueing successful passes after `reconcile_interval`.
    pub fn new(kube_client: Client, versions: VersionReconciler, reconcile_interval: Duration) -> Self {
        Self {
            kube_client,
            versions,
            reconcile_interval,
            backoff_states: BackoffStates::default(),
        }
    }

    /// Reconciles a single DynaKube and returns when to look at it again.
    pub async fn reconcile_dynakube(&self, dk: &DynaKube) -> Result<Action, ControllerError> {
        let name = dk
            .metadata
            .name
            .as_deref()
            .ok_or_else(|| ControllerError::InvalidConfig("DynaKube missing name".to_string()))?;
        let namespace = dk.metadata.namespace.as_deref().unwrap_or("default");

        info!("Reconciling DynaKube {}/{}", namespace, name);

        let outcome = match self.tenant_client(dk, namespace).await {
            Ok(client) => resolve_versions(&self.versions, dk, &client).await,
            Err(e) => {
                warn!("No usable API token for DynaKube {}/{}: {}", namespace, name, e);
                resolve_versions(&self.versions, dk, &TokenUnavailable::new(&e)).await
            }
        };

        // Written even after a partial failure so conditions reach the cluster
        if outcome.changed {
            let api: Api<DynaKube> = Api::namespaced(self.kube_client.clone(), namespace);
            let pp = PatchParams::default();
            api.patch_status(name, &pp, &Patch::Merge(&status_patch(&outcome.status)))
                .await
                .map_err(|e| {
                    error!("Failed to update DynaKube {}/{} status: {}", namespace, name, e);
                    ControllerError::Kube(e)
                })?;
            debug!("Updated DynaKube {}/{} status", namespace, name);
        } else {
            debug!("DynaKube {}/{} status unchanged, skipping update", namespace, name);
        }

        log_resolved_images(namespace, name, &outcome.status);

        outcome.result?;
        self.backoff_states.reset(&resource_key(namespace, name));
        Ok(Action::requeue(self.reconcile_interval))
    }

    /// Builds a tenant client from the DynaKube's tokens secret.
    async fn tenant_client(&self, dk: &DynaKube, namespace: &str) -> Result<DynatraceClient, ControllerError> {
        let secret_name = dk
            .tokens_secret_name()
            .ok_or_else(|| ControllerError::InvalidConfig("DynaKube has no tokens secret".to_string()))?;
        let secrets: Api<Secret> = Api::namespaced(self.kube_client.clone(), namespace);
        let secret = secrets.get(&secret_name).await.map_err(|e| {
            error!("Failed to read tokens secret {}/{}: {}", namespace, secret_name, e);
            ControllerError::Kube(e)
        })?;
        let token = api_token_from_secret(&secret)?;

        Ok(DynatraceClient::new(dk.spec.api_url.clone(), token)?)
    }

    /// Requeue delay after a failed pass, growing with consecutive failures.
    pub fn error_requeue(&self, dk: &DynaKube, error: &ControllerError) -> Action {
        let namespace = dk.metadata.namespace.as_deref().unwrap_or("default");
        let name = dk.metadata.name.as_deref().unwrap_or_default();
        let (delay, error_count) = self.backoff_states.record_error(&resource_key(namespace, name));
        warn!(
            "Reconciliation of DynaKube {}/{} failed ({} consecutive errors), retrying in {}s: {}",
            namespace,
            name,
            error_count,
            delay.as_secs(),
            error
        );
        Action::requeue(delay)
    }
}

/// Stands in for the tenant client when no API token could be obtained.
///
/// Every call fails with an authentication error carrying the reason.
pub struct TokenUnavailable {
    reason: String,
}

impl TokenUnavailable {
    /// Wraps the error that prevented building a tenant client.
    pub fn new(error: &ControllerError) -> Self {
        Self {
            reason: error.to_string(),
        }
    }

    fn error(&self) -> DynatraceError {
        DynatraceError::Authentication(format!("no usable API token: {}", self.reason))
    }
}

#[async_trait::async_trait]
impl DynatraceClientTrait for TokenUnavailable {
    async fn get_latest_agent_version(&self, _os: OsType, _installer_type: InstallerType) -> Result<String, DynatraceError> {
        Err(self.error())
    }

    async fn get_latest_active_gate_version(&self, _os: OsType) -> Result<String, DynatraceError> {
        Err(self.error())
    }

    async fn get_latest_image(&self, _component: ImageComponent) -> Result<LatestImageInfo, DynatraceError> {
        Err(self.error())
    }
}

/// Runs the version pass on a copy of `dk`.
pub async fn resolve_versions(
    versions: &VersionReconciler,
    dk: &DynaKube,
    client: &dyn DynatraceClientTrait,
) -> VersionOutcome {
    let mut updated = dk.clone();
    let result = versions.reconcile(&mut updated, client).await;
    let status = updated.status.unwrap_or_default();
    let changed = dk.status.as_ref() != Some(&status);
    VersionOutcome { status, changed, result }
}

/// Extracts the API token from the tokens secret.
pub fn api_token_from_secret(secret: &Secret) -> Result<String, ControllerError> {
    let secret_name = secret.metadata.name.as_deref().unwrap_or_default();

    if let Some(value) = secret.data.as_ref().and_then(|data| data.get(API_TOKEN_KEY)) {
        let token = String::from_utf8(value.0.clone())
            .map_err(|_| ControllerError::TokenSecret(format!("{} in secret {} is not valid UTF-8", API_TOKEN_KEY, secret_name)))?;
        return non_empty_token(token, secret_name);
    }
    if let Some(token) = secret.string_data.as_ref().and_then(|data| data.get(API_TOKEN_KEY)) {
        return non_empty_token(token.clone(), secret_name);
    }

    Err(ControllerError::TokenSecret(format!(
        "secret {} does not contain {}",
        secret_name, API_TOKEN_KEY
    )))
}

fn non_empty_token(token: String, secret_name: &str) -> Result<String, ControllerError> {
    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(ControllerError::TokenSecret(format!("{} in secret {} is empty", API_TOKEN_KEY, secret_name)));
    }
    Ok(token)
}

/// Merge patch replacing the status subresource.
///
/// Empty version fields are omitted when serialized, so cleared fields are
/// written as explicit nulls to remove them from the stored object.
pub fn status_patch(status: &DynaKubeStatus) -> serde_json::Value {
    let mut status_json = serde_json::json!(status);
    for component in ["activeGate", "oneAgent", "codeModules"] {
        if let Some(fields) = status_json.get_mut(component).and_then(|c| c.as_object_mut()) {
            for field in ["version", "imageID", "source", "lastProbeTimestamp"] {
                fields.entry(field).or_insert(serde_json::Value::Null);
            }
        }
    }
    serde_json::json!({ "status": status_json })
}

fn resource_key(namespace: &str, name: &str) -> String {
    format!("{}/{}", namespace, name)
}

fn log_resolved_images(namespace: &str, name: &str, status: &DynaKubeStatus) {
    for (component, version_status) in [
        ("ActiveGate", &status.active_gate.version_status),
        ("OneAgent", &status.one_agent.version_status),
        ("CodeModules", &status.code_modules.version_status),
    ] {
        if version_status.is_empty() {
            continue;
        }
        info!(
            "DynaKube {}/{} {}: version={} image={}",
            namespace,
            name,
            component,
            version_status.version,
            if version_status.image_id.is_empty() { "-" } else { version_status.image_id.as_str() }
        );
    }
}
