//! DynaKube CRD Definitions
//!
//! Kubernetes Custom Resource Definitions and status types for the DynaKube operator.

pub mod conditions;
pub mod dynakube;
pub mod feature_flags;
pub mod version_status;

pub use conditions::*;
pub use dynakube::*;
pub use feature_flags::{FeatureFlags, AUTOMATIC_REGISTRY, DISABLE_ACTIVEGATE_UPDATES};
pub use version_status::*;
