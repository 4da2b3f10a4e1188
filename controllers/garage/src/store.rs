//! Access to the resource records themselves.
//!
//! The engine reads referenced records and writes status, the identity-hint
//! annotation and finalizers through `ResourceStore`. Each write has its own
//! path so that losing one never loses the others.

use crate::error::ReconcileError;
use crate::managed::{ManagedKind, ManagedResource};
use crds::{EXTERNAL_NAME_ANNOTATION, GarageBucket, GarageKey, GarageKeyAccess};
use k8s_openapi::NamespaceResourceScope;
use kube::api::{Patch, PatchParams};
use kube::{Api, Client};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::fmt::Debug;
use tracing::debug;

/// Reads and writes resource records
#[async_trait::async_trait]
pub trait ResourceStore: Send + Sync {
    /// Bucket record, `None` if it does not exist
    async fn get_bucket(&self, namespace: &str, name: &str) -> Result<Option<GarageBucket>, ReconcileError>;

    /// Key record, `None` if it does not exist
    async fn get_key(&self, namespace: &str, name: &str) -> Result<Option<GarageKey>, ReconcileError>;

    /// Persist the full status of `mr`
    async fn patch_status(&self, mr: &ManagedResource) -> Result<(), ReconcileError>;

    /// Persist the identity-hint annotation of `mr`
    async fn patch_external_name(&self, mr: &ManagedResource) -> Result<(), ReconcileError>;

    /// Persist the finalizer list of `mr`
    async fn set_finalizers(&self, mr: &ManagedResource) -> Result<(), ReconcileError>;
}

/// `ResourceStore` backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn merge_patch<K>(
        &self,
        namespace: &str,
        name: &str,
        patch: &serde_json::Value,
        status: bool,
    ) -> Result<(), ReconcileError>
    where
        K: kube::Resource<Scope = NamespaceResourceScope, DynamicType = ()> + Clone + DeserializeOwned + Debug,
    {
        let api: Api<K> = Api::namespaced(self.client.clone(), namespace);
        let params = PatchParams::default();
        if status {
            api.patch_status(name, &params, &Patch::Merge(patch)).await?;
        } else {
            api.patch(name, &params, &Patch::Merge(patch)).await?;
        }
        Ok(())
    }

    async fn patch_resource(
        &self,
        mr: &ManagedResource,
        patch: &serde_json::Value,
        status: bool,
    ) -> Result<(), ReconcileError> {
        let (namespace, name) = (mr.namespace(), mr.name());
        match mr.kind() {
            ManagedKind::Bucket => self.merge_patch::<GarageBucket>(namespace, name, patch, status).await,
            ManagedKind::Key => self.merge_patch::<GarageKey>(namespace, name, patch, status).await,
            ManagedKind::KeyAccess => {
                self.merge_patch::<GarageKeyAccess>(namespace, name, patch, status).await
            }
        }
    }
}

#[async_trait::async_trait]
impl ResourceStore for KubeStore {
    async fn get_bucket(&self, namespace: &str, name: &str) -> Result<Option<GarageBucket>, ReconcileError> {
        let api: Api<GarageBucket> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn get_key(&self, namespace: &str, name: &str) -> Result<Option<GarageKey>, ReconcileError> {
        let api: Api<GarageKey> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn patch_status(&self, mr: &ManagedResource) -> Result<(), ReconcileError> {
        debug!("Patching status of {}", mr.key());
        self.patch_resource(mr, &mr.status_patch(), true).await
    }

    async fn patch_external_name(&self, mr: &ManagedResource) -> Result<(), ReconcileError> {
        let patch = json!({
            "metadata": {
                "annotations": { EXTERNAL_NAME_ANNOTATION: mr.external_name() }
            }
        });
        debug!("Patching external name of {} to {:?}", mr.key(), mr.external_name());
        self.patch_resource(mr, &patch, false).await
    }

    async fn set_finalizers(&self, mr: &ManagedResource) -> Result<(), ReconcileError> {
        let patch = json!({ "metadata": { "finalizers": mr.finalizers() } });
        self.patch_resource(mr, &patch, false).await
    }
}
