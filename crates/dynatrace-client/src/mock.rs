//! Mock DynatraceClient for unit testing
//!
//! Scriptable implementation of DynatraceClientTrait that records how often
//! each endpoint was called, so tests can assert probe throttling without a
//! running tenant.

use crate::client_trait::DynatraceClientTrait;
use crate::error::DynatraceError;
use crate::models::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Scripted response for one endpoint
#[derive(Debug, Clone)]
enum Scripted<T> {
    Ok(T),
    Fail(String),
}

impl<T: Clone> Scripted<T> {
    fn get(&self) -> Result<T, DynatraceError> {
        match self {
            Scripted::Ok(value) => Ok(value.clone()),
            Scripted::Fail(message) => Err(DynatraceError::Api {
                status: 500,
                message: message.clone(),
            }),
        }
    }
}

/// Mock DynatraceClient for testing
///
/// Endpoints without a scripted response fail with an API error.
#[derive(Clone, Default)]
pub struct MockDynatraceClient {
    agent_versions: Arc<Mutex<HashMap<(OsType, InstallerType), Scripted<String>>>>,
    active_gate_version: Arc<Mutex<Option<Scripted<String>>>>,
    images: Arc<Mutex<HashMap<ImageComponent, Scripted<LatestImageInfo>>>>,
    calls: Arc<Mutex<HashMap<&'static str, usize>>>,
}

impl MockDynatraceClient {
    /// Create a new mock client
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the latest agent version for a platform/installer pair
    pub fn set_agent_version(&self, os: OsType, installer_type: InstallerType, version: impl Into<String>) {
        self.agent_versions
            .lock()
            .unwrap()
            .insert((os, installer_type), Scripted::Ok(version.into()));
    }

    /// Make the agent version endpoint fail
    pub fn fail_agent_version(&self, os: OsType, installer_type: InstallerType, message: impl Into<String>) {
        self.agent_versions
            .lock()
            .unwrap()
            .insert((os, installer_type), Scripted::Fail(message.into()));
    }

    /// Script the latest ActiveGate version
    pub fn set_active_gate_version(&self, version: impl Into<String>) {
        *self.active_gate_version.lock().unwrap() = Some(Scripted::Ok(version.into()));
    }

    /// Make the ActiveGate version endpoint fail
    pub fn fail_active_gate_version(&self, message: impl Into<String>) {
        *self.active_gate_version.lock().unwrap() = Some(Scripted::Fail(message.into()));
    }

    /// Script the latest image for a component
    pub fn set_latest_image(&self, component: ImageComponent, source: impl Into<String>, tag: impl Into<String>) {
        self.images.lock().unwrap().insert(
            component,
            Scripted::Ok(LatestImageInfo {
                source: source.into(),
                tag: tag.into(),
            }),
        );
    }

    /// Number of calls made to the named trait method
    pub fn call_count(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    fn record(&self, method: &'static str) {
        *self.calls.lock().unwrap().entry(method).or_insert(0) += 1;
    }
}

#[async_trait::async_trait]
impl DynatraceClientTrait for MockDynatraceClient {
    async fn get_latest_agent_version(&self, os: OsType, installer_type: InstallerType) -> Result<String, DynatraceError> {
        self.record("get_latest_agent_version");
        self.agent_versions
            .lock()
            .unwrap()
            .get(&(os, installer_type))
            .map(Scripted::get)
            .unwrap_or_else(|| Err(DynatraceError::Api {
                status: 404,
                message: format!("no agent version scripted for {}/{}", os, installer_type),
            }))
    }

    async fn get_latest_active_gate_version(&self, os: OsType) -> Result<String, DynatraceError> {
        self.record("get_latest_active_gate_version");
        self.active_gate_version
            .lock()
            .unwrap()
            .as_ref()
            .map(Scripted::get)
            .unwrap_or_else(|| Err(DynatraceError::Api {
                status: 404,
                message: format!("no ActiveGate version scripted for {}", os),
            }))
    }

    async fn get_latest_image(&self, component: ImageComponent) -> Result<LatestImageInfo, DynatraceError> {
        self.record("get_latest_image");
        self.images
            .lock()
            .unwrap()
            .get(&component)
            .map(Scripted::get)
            .unwrap_or_else(|| Err(DynatraceError::Api {
                status: 404,
                message: format!("no {} image scripted", component),
            }))
    }
}
