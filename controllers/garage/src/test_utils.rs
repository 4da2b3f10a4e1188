//! Test utilities for unit testing reconcilers
//!
//! In-memory stand-ins for the Kubernetes side of the engine plus fixtures
//! for the three resource kinds. Garage itself is covered by
//! `garage_client::MockGarageClient`.

use crate::connection::ConnectionPublisher;
use crate::error::ReconcileError;
use crate::managed::{ConnectionDetails, Connector, ExternalClient, ManagedResource};
use crate::reconciler::{Engine, external_for};
use crate::store::ResourceStore;
use crds::*;
use garage_client::MockGarageClient;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// `ResourceStore` over in-memory maps that records every write
#[derive(Clone, Default)]
pub struct InMemoryStore {
    buckets: Arc<Mutex<HashMap<(String, String), GarageBucket>>>,
    keys: Arc<Mutex<HashMap<(String, String), GarageKey>>>,
    status_patches: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    external_names: Arc<Mutex<Vec<(String, Option<String>)>>>,
    finalizer_writes: Arc<Mutex<Vec<(String, Vec<String>)>>>,
    fail_external_name_writes: Arc<Mutex<bool>>,
}

fn record_key<K: kube::Resource>(record: &K) -> (String, String) {
    let meta = record.meta();
    (
        meta.namespace.clone().unwrap_or_else(|| "default".to_string()),
        meta.name.clone().unwrap_or_default(),
    )
}

impl InMemoryStore {
    pub fn put_bucket(&self, bucket: GarageBucket) {
        lock(&self.buckets).insert(record_key(&bucket), bucket);
    }

    pub fn put_key(&self, key: GarageKey) {
        lock(&self.keys).insert(record_key(&key), key);
    }

    /// Status patches written so far, as `(resource key, patch)`
    pub fn status_patches(&self) -> Vec<(String, serde_json::Value)> {
        lock(&self.status_patches).clone()
    }

    /// Most recent status patch
    pub fn last_status(&self) -> Option<serde_json::Value> {
        lock(&self.status_patches).last().map(|(_, patch)| patch["status"].clone())
    }

    /// External-name values written so far
    pub fn external_names(&self) -> Vec<Option<String>> {
        lock(&self.external_names).iter().map(|(_, v)| v.clone()).collect()
    }

    /// Finalizer lists written so far
    pub fn finalizer_writes(&self) -> Vec<Vec<String>> {
        lock(&self.finalizer_writes).iter().map(|(_, v)| v.clone()).collect()
    }

    /// Make external-name writes fail, as if the process died before them
    pub fn fail_external_name_writes(&self, fail: bool) {
        *lock(&self.fail_external_name_writes) = fail;
    }
}

#[async_trait::async_trait]
impl ResourceStore for InMemoryStore {
    async fn get_bucket(&self, namespace: &str, name: &str) -> Result<Option<GarageBucket>, ReconcileError> {
        Ok(lock(&self.buckets)
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn get_key(&self, namespace: &str, name: &str) -> Result<Option<GarageKey>, ReconcileError> {
        Ok(lock(&self.keys).get(&(namespace.to_string(), name.to_string())).cloned())
    }

    async fn patch_status(&self, mr: &ManagedResource) -> Result<(), ReconcileError> {
        lock(&self.status_patches).push((mr.key(), mr.status_patch()));
        Ok(())
    }

    async fn patch_external_name(&self, mr: &ManagedResource) -> Result<(), ReconcileError> {
        if *lock(&self.fail_external_name_writes) {
            return Err(ReconcileError::Connect("injected external-name write failure".to_string()));
        }
        lock(&self.external_names).push((mr.key(), mr.external_name().map(str::to_string)));
        Ok(())
    }

    async fn set_finalizers(&self, mr: &ManagedResource) -> Result<(), ReconcileError> {
        lock(&self.finalizer_writes).push((mr.key(), mr.finalizers().to_vec()));
        Ok(())
    }
}

/// `ConnectionPublisher` that keeps what it was given
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    published: Arc<Mutex<Vec<(String, ConnectionDetails)>>>,
}

impl RecordingPublisher {
    pub fn published(&self) -> Vec<(String, ConnectionDetails)> {
        lock(&self.published).clone()
    }
}

#[async_trait::async_trait]
impl ConnectionPublisher for RecordingPublisher {
    async fn publish(&self, mr: &ManagedResource, details: &ConnectionDetails) -> Result<(), ReconcileError> {
        lock(&self.published).push((mr.key(), details.clone()));
        Ok(())
    }
}

/// `Connector` handing out external clients over a shared mock
pub struct StaticConnector {
    client: MockGarageClient,
    store: Arc<dyn ResourceStore>,
}

impl StaticConnector {
    pub fn new(client: MockGarageClient, store: Arc<dyn ResourceStore>) -> Self {
        Self { client, store }
    }
}

#[async_trait::async_trait]
impl Connector for StaticConnector {
    async fn connect(&self, mr: &ManagedResource) -> Result<Box<dyn ExternalClient>, ReconcileError> {
        Ok(external_for(mr.kind(), Arc::new(self.client.clone()), Arc::clone(&self.store)))
    }
}

/// Engine wired to a mock Garage, an in-memory store and a recording publisher
pub struct TestHarness {
    pub garage: MockGarageClient,
    pub store: InMemoryStore,
    pub publisher: RecordingPublisher,
    pub engine: Engine,
}

impl TestHarness {
    pub fn new() -> Self {
        let garage = MockGarageClient::new("http://test-garage:3903");
        let store = InMemoryStore::default();
        let publisher = RecordingPublisher::default();
        let store_arc: Arc<dyn ResourceStore> = Arc::new(store.clone());
        let engine = Engine::new(
            Arc::new(StaticConnector::new(garage.clone(), Arc::clone(&store_arc))),
            store_arc,
            Arc::new(publisher.clone()),
        );
        Self {
            garage,
            store,
            publisher,
            engine,
        }
    }

    /// External client for `kind`, sharing the harness mock and store
    pub fn external(&self, kind: crate::managed::ManagedKind) -> Box<dyn ExternalClient> {
        external_for(kind, Arc::new(self.garage.clone()), Arc::new(self.store.clone()))
    }
}

fn meta(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        uid: Some(format!("uid-{name}")),
        ..Default::default()
    }
}

/// GarageBucket record with an optional observed ID
pub fn bucket_record(name: &str, namespace: &str, id: Option<&str>) -> GarageBucket {
    GarageBucket {
        metadata: meta(name, namespace),
        spec: GarageBucketSpec {
            global_alias: Some(name.to_string()),
            ..Default::default()
        },
        status: Some(GarageBucketStatus {
            id: id.map(str::to_string),
            ..Default::default()
        }),
    }
}

/// GarageKey record with an optional observed access key ID
pub fn key_record(name: &str, namespace: &str, access_key_id: Option<&str>) -> GarageKey {
    GarageKey {
        metadata: meta(name, namespace),
        spec: GarageKeySpec {
            name: name.to_string(),
            ..Default::default()
        },
        status: Some(GarageKeyStatus {
            access_key_id: access_key_id.map(str::to_string),
            ..Default::default()
        }),
    }
}

/// Fresh bucket resource in `default` with no status
pub fn bucket_resource(name: &str, global_alias: Option<&str>) -> ManagedResource {
    ManagedResource::Bucket(GarageBucket {
        metadata: meta(name, "default"),
        spec: GarageBucketSpec {
            global_alias: global_alias.map(str::to_string),
            ..Default::default()
        },
        status: None,
    })
}

/// Fresh key resource in `default` with no status
pub fn key_resource(name: &str, key_name: &str) -> ManagedResource {
    ManagedResource::Key(GarageKey {
        metadata: meta(name, "default"),
        spec: GarageKeySpec {
            name: key_name.to_string(),
            write_connection_secret_to_ref: Some(SecretReference {
                name: format!("{name}-credentials"),
                namespace: None,
            }),
            ..Default::default()
        },
        status: None,
    })
}

/// Fresh key access resource in `default` with no status
pub fn key_access_resource(name: &str, spec: GarageKeyAccessSpec) -> ManagedResource {
    ManagedResource::KeyAccess(GarageKeyAccess {
        metadata: meta(name, "default"),
        spec,
        status: None,
    })
}

/// Mark a resource as being deleted
pub fn mark_deleted(mr: &mut ManagedResource) {
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    let now: Time = serde_json::from_value(serde_json::json!("2026-01-01T00:00:00Z")).expect("valid timestamp");
    match mr {
        ManagedResource::Bucket(r) => r.metadata.deletion_timestamp = Some(now),
        ManagedResource::Key(r) => r.metadata.deletion_timestamp = Some(now),
        ManagedResource::KeyAccess(r) => r.metadata.deletion_timestamp = Some(now),
    }
}

/// Permission triple shorthand
pub fn permissions(read: bool, write: bool, owner: bool) -> AccessPermissions {
    AccessPermissions { read, write, owner }
}
