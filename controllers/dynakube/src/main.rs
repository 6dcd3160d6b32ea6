//! DynaKube Controller
//!
//! Resolves the versions of the components a DynaKube requests:
//! - ActiveGate: follows the tenant's latest gateway image unless pinned
//! - OneAgent: follows the tenant's latest agent, guarded against downgrades
//! - Code modules: follows the tenant's latest PaaS agent unless pinned
//!
//! Results are written to the DynaKube status together with one condition
//! per component.

mod backoff;
mod config;
mod controller;
mod error;
mod reconciler;
mod version;
mod watcher;

#[cfg(test)]
mod test_utils;

use crate::config::Config;
use crate::error::ControllerError;
use controller::Controller;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if rustls::crypto::ring::default_provider().install_default().is_err() {
        return Err(ControllerError::InvalidConfig(
            "failed to install rustls crypto provider".to_string(),
        ));
    }

    info!("Starting DynaKube Controller");

    let config = Config::from_env()?;

    info!("Configuration:");
    info!("  Namespace: {}", config.namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Reconcile interval: {}s", config.reconcile_interval.as_secs());
    info!("  Version probe timeout: {}s", config.probe_timeout.as_secs());
    match config.probe_threshold {
        Some(threshold) => info!("  Version probe threshold: {}s", threshold.as_secs()),
        None => info!("  Version probe threshold: every pass"),
    }

    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}
