//! Kubernetes resource watcher.
//!
//! Watches DynaKube resources and drives reconciliation through
//! kube_runtime::Controller, which handles reconnection, per-object
//! serialization and requeueing.
//!
//! Only spec changes (a new `metadata.generation`) trigger a pass. Status
//! writes made by a pass are filtered out, so passes are paced by the
//! requeue interval instead of by our own updates.

use crate::error::ControllerError;
use crate::reconciler::Reconciler;
use crds::DynaKube;
use futures::{Stream, StreamExt};
use kube::Api;
use kube_runtime::{
    controller::{Action, Config as ControllerConfig},
    predicates, reflector, watcher, Controller, WatchStreamExt,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Watches DynaKubes until the stream ends.
pub async fn watch_dynakubes(api: Api<DynaKube>, reconciler: Arc<Reconciler>) -> Result<(), ControllerError> {
    info!("Starting DynaKube watcher");

    let error_policy = |dk: Arc<DynaKube>, error: &ControllerError, ctx: Arc<Reconciler>| -> Action {
        ctx.error_requeue(&dk, error)
    };

    let reconcile = |dk: Arc<DynaKube>, ctx: Arc<Reconciler>| async move {
        debug!(
            "Reconciling DynaKube {}/{}",
            dk.metadata.namespace.as_deref().unwrap_or("default"),
            dk.metadata.name.as_deref().unwrap_or_default()
        );
        ctx.reconcile_dynakube(&dk).await
    };

    let controller_config = ControllerConfig::default()
        .debounce(Duration::from_secs(5))
        .concurrency(3);

    let (reader, writer) = reflector::store();
    let dynakubes = watcher(api, watcher::Config::default())
        .default_backoff()
        .reflect(writer)
        .applied_objects();

    Controller::for_stream(spec_changes(dynakubes), reader)
        .with_config(controller_config)
        .run(reconcile, error_policy, reconciler)
        .for_each(|res| async move {
            match res {
                Ok((obj, _action)) => debug!("Reconciled DynaKube {}", obj.name),
                Err(e) => error!("Controller error for DynaKube: {}", e),
            }
        })
        .await;

    Err(ControllerError::Watch("DynaKube watch stream ended".to_string()))
}

/// Drops updates that leave `metadata.generation` unchanged.
fn spec_changes<S>(dynakubes: S) -> impl Stream<Item = Result<DynaKube, watcher::Error>> + Send + 'static
where
    S: Stream<Item = Result<DynaKube, watcher::Error>> + Send + 'static,
{
    dynakubes.predicate_filter(predicates::generation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use crds::HostInjectSpec;
    use futures::stream;

    fn at_generation(mut dk: DynaKube, generation: i64, resource_version: &str) -> DynaKube {
        dk.metadata.generation = Some(generation);
        dk.metadata.resource_version = Some(resource_version.to_string());
        dk
    }

    #[tokio::test]
    async fn test_status_updates_do_not_retrigger() {
        let dk = create_test_classic_dynakube(HostInjectSpec::default());
        let created = at_generation(dk.clone(), 1, "100");
        let mut status_written = at_generation(dk.clone(), 1, "101");
        status_written.status = Some(Default::default());
        let spec_edited = at_generation(dk, 2, "102");

        let seen: Vec<DynaKube> = spec_changes(stream::iter(vec![
            Ok::<_, watcher::Error>(created),
            Ok(status_written.clone()),
            Ok(status_written),
            Ok(spec_edited),
        ]))
        .map(|res| res.unwrap())
        .collect()
        .await;

        let generations: Vec<_> = seen.iter().map(|dk| dk.metadata.generation).collect();
        assert_eq!(generations, vec![Some(1), Some(2)]);
    }
}
