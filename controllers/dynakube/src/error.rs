//! Controller-specific error types.
//!
//! Errors of the DynaKube Controller that are not covered by the vendor
//! client or the version reconciler.

use crate::version::VersionError;
use dynatrace_client::DynatraceError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur in the DynaKube Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Dynatrace API error
    #[error("Dynatrace error: {0}")]
    Dynatrace(#[from] DynatraceError),

    /// Version resolution failed for one or more components
    #[error("{0}")]
    Version(#[from] VersionError),

    /// API token secret missing or incomplete
    #[error("Token secret error: {0}")]
    TokenSecret(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}
