//! Version resolution errors.

use crate::version::image::ImageError;
use dynatrace_client::DynatraceError;
use thiserror::Error;

/// Errors raised while resolving the version of a managed component.
#[derive(Debug, Error)]
pub enum VersionError {
    /// Vendor API call failed
    #[error("Dynatrace API error: {0}")]
    Dynatrace(#[from] DynatraceError),

    /// Vendor API call did not finish in time
    #[error("{component} version probe timed out after {seconds}s")]
    ProbeTimeout {
        /// Component being probed
        component: String,
        /// Configured timeout
        seconds: u64,
    },

    /// Image reference could not be used for version reporting
    #[error("Invalid image reference: {0}")]
    Image(#[from] ImageError),

    /// Version string could not be parsed
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion {
        /// Offending version string
        version: String,
        /// What is wrong with it
        reason: String,
    },

    /// DynaKube spec cannot be resolved as written
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Post-resolution check failed
    #[error("Status validation failed: {0}")]
    Validation(String),

    /// One or more components failed during a multi-component pass
    #[error("Version resolution failed for {}", describe_failures(.0))]
    Components(Vec<ComponentFailure>),
}

/// Failure of a single component in a multi-component pass.
#[derive(Debug)]
pub struct ComponentFailure {
    /// Component name (e.g. "activegate")
    pub component: String,
    /// What went wrong
    pub error: VersionError,
}

fn describe_failures(failures: &[ComponentFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{} ({})", f.component, f.error))
        .collect::<Vec<_>>()
        .join(", ")
}

impl VersionError {
    /// Whether the error came from talking to the vendor API.
    pub fn is_api_error(&self) -> bool {
        matches!(self, VersionError::Dynatrace(_) | VersionError::ProbeTimeout { .. })
    }

    /// Whether the error came from parsing an image or version string.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, VersionError::Image(_) | VersionError::InvalidVersion { .. })
    }
}
