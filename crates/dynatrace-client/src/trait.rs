//! DynatraceClient trait for mocking
//!
//! This trait abstracts the DynatraceClient so the version reconciler can be
//! exercised in unit tests. The concrete DynatraceClient implements it, tests
//! use `MockDynatraceClient`.

use crate::error::DynatraceError;
use crate::models::*;

/// Trait for Dynatrace deployment API operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
/// Callers bound latency by wrapping calls in `tokio::time::timeout`; dropping
/// the future cancels the request.
#[async_trait::async_trait]
pub trait DynatraceClientTrait: Send + Sync {
    /// Latest OneAgent installer version for the given platform and installer type
    async fn get_latest_agent_version(&self, os: OsType, installer_type: InstallerType) -> Result<String, DynatraceError>;

    /// Latest ActiveGate version for the given platform
    async fn get_latest_active_gate_version(&self, os: OsType) -> Result<String, DynatraceError>;

    /// Latest image published for a component
    async fn get_latest_image(&self, component: ImageComponent) -> Result<LatestImageInfo, DynatraceError>;
}
