//! Version resolution for DynaKube components.
//!
//! - `updater`: the capability contract every component implements
//! - `source`: precedence between custom image, custom version and tenant
//! - `reconciler`: the per-component state machine and the multi-component pass
//! - `activegate`, `oneagent`, `codemodules`: concrete components
//! - `image`, `agent_version`: image reference and version string parsing

pub mod activegate;
pub mod agent_version;
pub mod clock;
pub mod codemodules;
pub mod conditions;
pub mod error;
pub mod image;
pub mod oneagent;
pub mod reconciler;
pub mod source;
pub mod updater;

#[cfg(test)]
mod reconciler_test;

pub use clock::SystemClock;
pub use error::VersionError;
pub use reconciler::VersionReconciler;
