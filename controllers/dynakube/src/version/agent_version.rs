//! Dynatrace version strings.
//!
//! Versions look like `major.minor.release[.timestamp]` where the optional
//! timestamp is `YYYYMMDD-hhmmss` (or any dash-separated numbers, e.g. `4-5`).
//! Comparison is numeric, component by component.

use crate::version::error::VersionError;
use std::cmp::Ordering;

/// Parsed, comparable Dynatrace version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentVersion {
    components: Vec<u64>,
}

impl AgentVersion {
    /// Parses a version string.
    pub fn parse(version: &str) -> Result<Self, VersionError> {
        let invalid = |reason: &str| VersionError::InvalidVersion {
            version: version.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = version.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty version"));
        }

        let parts: Vec<&str> = trimmed.split('.').collect();
        if parts.len() < 3 {
            return Err(invalid("expected at least major.minor.release"));
        }
        if parts.len() > 4 {
            return Err(invalid("too many components"));
        }

        let mut components = Vec::with_capacity(parts.len() + 1);
        for part in &parts[..3] {
            components.push(part.parse::<u64>().map_err(|_| invalid("non-numeric component"))?);
        }
        if let Some(timestamp) = parts.get(3) {
            for piece in timestamp.split('-') {
                components.push(piece.parse::<u64>().map_err(|_| invalid("non-numeric timestamp"))?);
            }
        }

        Ok(Self { components })
    }
}

impl PartialOrd for AgentVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AgentVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components.cmp(&other.components)
    }
}

/// Whether moving from `current` to `candidate` is a downgrade.
pub fn is_downgrade(current: &str, candidate: &str) -> Result<bool, VersionError> {
    let current = AgentVersion::parse(current)?;
    let candidate = AgentVersion::parse(candidate)?;
    Ok(candidate < current)
}
