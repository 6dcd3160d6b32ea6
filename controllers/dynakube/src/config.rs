//! Controller configuration from environment variables.

use crate::error::ControllerError;
use crate::version::reconciler::DEFAULT_PROBE_TIMEOUT;
use std::env;
use std::time::Duration;

/// Default time between two passes over the same DynaKube
pub const DEFAULT_RECONCILE_INTERVAL: Duration = Duration::from_secs(15 * 60);

/// Controller settings read at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Namespace to watch; `None` watches all namespaces
    pub namespace: Option<String>,
    /// Minimum age of the last probe before auto-updating components are probed again
    pub probe_threshold: Option<Duration>,
    /// Upper bound for a single vendor API probe
    pub probe_timeout: Duration,
    /// Requeue interval after a successful pass
    pub reconcile_interval: Duration,
}

impl Config {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ControllerError> {
        let namespace = lookup("WATCH_NAMESPACE").filter(|ns| !ns.trim().is_empty());
        let probe_threshold = parse_seconds(&lookup, "VERSION_PROBE_THRESHOLD_SECONDS")?;
        let probe_timeout = parse_seconds(&lookup, "VERSION_PROBE_TIMEOUT_SECONDS")?.unwrap_or(DEFAULT_PROBE_TIMEOUT);
        let reconcile_interval = parse_seconds(&lookup, "RECONCILE_INTERVAL_SECONDS")?.unwrap_or(DEFAULT_RECONCILE_INTERVAL);

        if probe_timeout.is_zero() {
            return Err(ControllerError::InvalidConfig(
                "VERSION_PROBE_TIMEOUT_SECONDS must be greater than 0".to_string(),
            ));
        }
        if reconcile_interval.is_zero() {
            return Err(ControllerError::InvalidConfig(
                "RECONCILE_INTERVAL_SECONDS must be greater than 0".to_string(),
            ));
        }

        Ok(Self {
            namespace,
            probe_threshold,
            probe_timeout,
            reconcile_interval,
        })
    }
}

fn parse_seconds(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<Duration>, ControllerError> {
    match lookup(key) {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(None),
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(|secs| Some(Duration::from_secs(secs)))
            .map_err(|_| ControllerError::InvalidConfig(format!("{} must be a number of seconds, got '{}'", key, value))),
    }
}
