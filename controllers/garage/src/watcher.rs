//! Kubernetes resource watchers.
//!
//! Each Garage kind gets its own `kube_runtime::Controller` through the
//! generic `watch_resource()` helper. The runtime guarantees that a given
//! object is never reconciled concurrently with itself.

use crate::error::{ControllerError, ReconcileError};
use crate::managed::ManagedResource;
use crate::reconciler::Reconciler;
use crds::{GarageBucket, GarageKey, GarageKeyAccess};
use futures::StreamExt;
use kube::{Api, Client};
use kube_runtime::{Controller, controller::Config as ControllerConfig, watcher};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Generic watcher helper around kube_runtime::Controller.
///
/// The controller reconnects on watch errors and keeps running until the
/// stream ends. Failed cycles are requeued with the reconciler's per-resource
/// backoff.
async fn watch_resource<K>(
    api: Api<K>,
    reconciler: Arc<Reconciler>,
    resource_name: &'static str,
    concurrency: u16,
) -> Result<(), ControllerError>
where
    K: kube::Resource<DynamicType = ()>
        + Clone
        + Send
        + Sync
        + 'static
        + std::fmt::Debug
        + serde::de::DeserializeOwned
        + Into<ManagedResource>,
{
    info!("Starting {} watcher (concurrency {})", resource_name, concurrency);

    let error_policy = |obj: Arc<K>, error: &ReconcileError, ctx: Arc<Reconciler>| {
        let key = to_managed(&obj).key();
        error!("Reconciliation error for {}: {}", key, error);
        ctx.error_action(&key)
    };

    let reconcile = |obj: Arc<K>, ctx: Arc<Reconciler>| async move {
        let resource = to_managed(&obj);
        debug!("Reconciling {}", resource.key());
        ctx.reconcile(resource).await
    };

    // Debounce batches our own status and annotation writes
    let controller_config = ControllerConfig::default()
        .debounce(Duration::from_secs(5))
        .concurrency(concurrency);

    Controller::new(api, watcher::Config::default())
        .with_config(controller_config)
        .run(reconcile, error_policy, reconciler)
        .for_each(|res| async move {
            match res {
                Ok((obj, _)) => debug!("Reconciled {} {}", resource_name, obj.name),
                Err(e) => error!("Controller error for {}: {}", resource_name, e),
            }
        })
        .await;

    Ok(())
}

fn to_managed<K: Clone + Into<ManagedResource>>(obj: &Arc<K>) -> ManagedResource {
    K::clone(obj).into()
}

/// Watches the Garage resource kinds.
pub struct Watcher {
    reconciler: Arc<Reconciler>,
    concurrency: u16,
    bucket_api: Api<GarageBucket>,
    key_api: Api<GarageKey>,
    key_access_api: Api<GarageKeyAccess>,
}

impl Watcher {
    /// Watch `namespace`, or every namespace when `None`
    pub fn new(reconciler: Arc<Reconciler>, client: Client, namespace: Option<&str>, concurrency: u16) -> Self {
        Self {
            reconciler,
            concurrency,
            bucket_api: api(client.clone(), namespace),
            key_api: api(client.clone(), namespace),
            key_access_api: api(client, namespace),
        }
    }

    /// Starts watching GarageBucket resources.
    pub async fn watch_buckets(&self) -> Result<(), ControllerError> {
        watch_resource(self.bucket_api.clone(), self.reconciler.clone(), "GarageBucket", self.concurrency).await
    }

    /// Starts watching GarageKey resources.
    pub async fn watch_keys(&self) -> Result<(), ControllerError> {
        watch_resource(self.key_api.clone(), self.reconciler.clone(), "GarageKey", self.concurrency).await
    }

    /// Starts watching GarageKeyAccess resources.
    pub async fn watch_key_accesses(&self) -> Result<(), ControllerError> {
        watch_resource(self.key_access_api.clone(), self.reconciler.clone(), "GarageKeyAccess", self.concurrency).await
    }
}

fn api<K>(client: Client, namespace: Option<&str>) -> Api<K>
where
    K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope, DynamicType = ()>,
{
    match namespace {
        Some(ns) => Api::namespaced(client, ns),
        None => Api::all(client),
    }
}
