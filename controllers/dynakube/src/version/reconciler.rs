//! Version reconciler.
//!
//! Decides, per managed component, whether the recorded version has to be
//! re-resolved, probes the tenant when needed, guards against downgrades and
//! records the outcome in the status subtree and the condition ledger.

use crate::version::activegate::ActiveGateUpdater;
use crate::version::clock::{Clock, SystemClock};
use crate::version::codemodules::CodeModulesUpdater;
use crate::version::conditions;
use crate::version::error::{ComponentFailure, VersionError};
use crate::version::oneagent::OneAgentUpdater;
use crate::version::source::determine_source;
use crate::version::updater::StatusUpdater;
use chrono::{DateTime, Utc};
use crds::{remove_condition, DynaKube, VersionSource, VersionStatus};
use dynatrace_client::DynatraceClientTrait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default upper bound for a single vendor probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolves component versions of a DynaKube.
pub struct VersionReconciler {
    clock: Arc<dyn Clock>,
    probe_timeout: Duration,
    /// Minimum age of the last probe before an auto-updating component is
    /// probed again. `None` probes on every pass.
    probe_threshold: Option<Duration>,
}

impl Default for VersionReconciler {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl VersionReconciler {
    /// Creates a reconciler using the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            probe_threshold: None,
        }
    }

    /// Sets the per-probe timeout.
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    /// Sets the minimum age of the last probe for auto-updating components.
    pub fn with_probe_threshold(mut self, threshold: Option<Duration>) -> Self {
        self.probe_threshold = threshold;
        self
    }

    /// Resolves every managed component of `dk` in sequence.
    ///
    /// A failing component does not stop the others; all failures are
    /// returned together once every component has been processed. The
    /// status of `dk` is updated in memory either way.
    pub async fn reconcile(&self, dk: &mut DynaKube, client: &dyn DynatraceClientTrait) -> Result<(), VersionError> {
        let mut status = dk.status.take().unwrap_or_default();
        let mut failures = Vec::new();

        {
            let mut updater = ActiveGateUpdater::new(dk, &mut status, client);
            self.run_component(&mut updater, &mut failures).await;
        }
        {
            let mut updater = OneAgentUpdater::new(dk, &mut status, client);
            self.run_component(&mut updater, &mut failures).await;
        }
        {
            let mut updater = CodeModulesUpdater::new(dk, &mut status, client);
            self.run_component(&mut updater, &mut failures).await;
        }

        dk.status = Some(status);

        if failures.is_empty() {
            Ok(())
        } else {
            Err(VersionError::Components(failures))
        }
    }

    async fn run_component(&self, updater: &mut dyn StatusUpdater, failures: &mut Vec<ComponentFailure>) {
        let name = updater.name();
        if let Err(error) = self.run(updater).await {
            warn!("Version resolution for {} failed: {}", name, error);
            failures.push(ComponentFailure {
                component: name.to_string(),
                error,
            });
        }
    }

    /// Runs one resolution pass for a single component.
    pub async fn run(&self, updater: &mut dyn StatusUpdater) -> Result<(), VersionError> {
        let name = updater.name();
        let condition_type = updater.condition_type();

        if !updater.is_enabled() {
            *updater.target_mut() = VersionStatus::default();
            if remove_condition(updater.conditions_mut(), condition_type) {
                info!("{} disabled, cleared version status", name);
            }
            return Ok(());
        }

        let source = determine_source(&*updater);
        let now = self.clock.now();

        if source == VersionSource::CustomImage {
            let image = updater.custom_image().unwrap_or_default();
            debug!("{} uses custom image {}, skipping probe", name, image);
            conditions::set_verification_skipped(updater.conditions_mut(), condition_type, now);
            let target = updater.target_mut();
            target.image_id = image;
            target.version = VersionSource::CustomImage.as_str().to_string();
        } else if self.needs_probe(&*updater, source, now) {
            self.probe(updater, source, now).await?;
        } else {
            debug!("{} version {} is current, skipping probe", name, updater.target().version);
            return Ok(());
        }

        updater.target_mut().mark_probed(source, now);

        if let Err(error) = updater.validate_status() {
            conditions::set_failed(updater.conditions_mut(), condition_type, &error, now);
            return Err(error);
        }
        Ok(())
    }

    fn needs_probe(&self, updater: &dyn StatusUpdater, source: VersionSource, now: DateTime<Utc>) -> bool {
        if source == VersionSource::CustomVersion {
            return true;
        }

        let target = updater.target();
        if target.is_empty() || target.source != Some(source) {
            return true;
        }
        if !updater.is_auto_update_enabled() {
            return false;
        }

        match (self.probe_threshold, target.last_probe_timestamp) {
            (Some(threshold), Some(last_probe)) => (now - last_probe)
                .to_std()
                .is_ok_and(|elapsed| elapsed >= threshold),
            _ => true,
        }
    }

    async fn probe(&self, updater: &mut dyn StatusUpdater, source: VersionSource, now: DateTime<Utc>) -> Result<(), VersionError> {
        let name = updater.name();
        let condition_type = updater.condition_type();

        let probed = match tokio::time::timeout(self.probe_timeout, updater.use_tenant_registry()).await {
            Ok(result) => result,
            Err(_) => Err(VersionError::ProbeTimeout {
                component: name.to_string(),
                seconds: self.probe_timeout.as_secs(),
            }),
        };
        let candidate = match probed {
            Ok(candidate) => candidate,
            Err(error) => {
                info!("Failed to determine {} version: {}", name, error);
                conditions::set_failed(updater.conditions_mut(), condition_type, &error, now);
                return Err(error);
            }
        };

        // A pinned version is explicit intent and may move in either direction
        if source == VersionSource::TenantRegistry && !candidate.version.is_empty() {
            match updater.check_for_downgrade(&candidate.version) {
                Ok(true) => {
                    let current = updater.target().version.clone();
                    info!("{}: keeping version {}, {} would be a downgrade", name, current, candidate.version);
                    conditions::set_downgrade_skipped(updater.conditions_mut(), condition_type, &current, &candidate.version, now);
                    return Ok(());
                }
                Ok(false) => {}
                Err(error) => {
                    conditions::set_failed(updater.conditions_mut(), condition_type, &error, now);
                    return Err(error);
                }
            }
        }

        let previous_probe = updater.target().last_probe_timestamp;
        let version = candidate.version.clone();
        *updater.target_mut() = VersionStatus {
            last_probe_timestamp: previous_probe,
            ..candidate
        };

        if source == VersionSource::CustomVersion {
            conditions::set_verification_skipped(updater.conditions_mut(), condition_type, now);
        } else {
            conditions::set_verified(updater.conditions_mut(), condition_type, &version, now);
        }
        debug!("{} resolved to version {}", name, version);
        Ok(())
    }
}
