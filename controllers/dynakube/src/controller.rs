//! Main controller implementation.
//!
//! Wires the Kubernetes client, the version reconciler and the DynaKube
//! watcher together.

use crate::config::Config;
use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crate::version::{SystemClock, VersionReconciler};
use crate::watcher::watch_dynakubes;
use crds::DynaKube;
use kube::{Api, Client};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Main controller for DynaKube version management.
pub struct Controller {
    dynakube_watcher: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance and starts watching.
    pub async fn new(config: Config) -> Result<Self, ControllerError> {
        info!("Initializing DynaKube Controller");

        let kube_client = Client::try_default().await?;

        let versions = VersionReconciler::new(Arc::new(SystemClock))
            .with_probe_timeout(config.probe_timeout)
            .with_probe_threshold(config.probe_threshold);
        let reconciler = Arc::new(Reconciler::new(kube_client.clone(), versions, config.reconcile_interval));

        let api: Api<DynaKube> = match config.namespace.as_deref() {
            Some(ns) => Api::namespaced(kube_client, ns),
            None => Api::all(kube_client),
        };

        let dynakube_watcher = tokio::spawn(async move { watch_dynakubes(api, reconciler).await });

        Ok(Self { dynakube_watcher })
    }

    /// Runs until the watcher stops.
    pub async fn run(self) -> Result<(), ControllerError> {
        info!("DynaKube Controller running");

        match self.dynakube_watcher.await {
            Ok(result) => result,
            Err(e) => {
                error!("DynaKube watcher task failed: {}", e);
                Err(ControllerError::Watch(format!("DynaKube watcher task failed: {}", e)))
            }
        }
    }
}
