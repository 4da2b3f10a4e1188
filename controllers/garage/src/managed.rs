//! Kind-independent view of the Garage resources.
//!
//! The engine works on `ManagedResource`, a tagged union over the three CRD
//! kinds, and talks to Garage through the `ExternalClient` capability each
//! kind implements.

use crate::error::ReconcileError;
use crds::{
    Condition, DeletionPolicy, EXTERNAL_NAME_ANNOTATION, FINALIZER, GarageBucket, GarageKey,
    GarageKeyAccess, SecretReference,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::Resource;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;

/// Named secret values handed to the connection publisher
pub type ConnectionDetails = BTreeMap<String, Vec<u8>>;

/// Resource kind tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManagedKind {
    Bucket,
    Key,
    KeyAccess,
}

impl ManagedKind {
    /// CRD kind name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bucket => "GarageBucket",
            Self::Key => "GarageKey",
            Self::KeyAccess => "GarageKeyAccess",
        }
    }
}

impl fmt::Display for ManagedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One resource instance of any Garage kind
#[derive(Debug, Clone)]
pub enum ManagedResource {
    Bucket(GarageBucket),
    Key(GarageKey),
    KeyAccess(GarageKeyAccess),
}

impl From<GarageBucket> for ManagedResource {
    fn from(value: GarageBucket) -> Self {
        Self::Bucket(value)
    }
}

impl From<GarageKey> for ManagedResource {
    fn from(value: GarageKey) -> Self {
        Self::Key(value)
    }
}

impl From<GarageKeyAccess> for ManagedResource {
    fn from(value: GarageKeyAccess) -> Self {
        Self::KeyAccess(value)
    }
}

impl ManagedResource {
    pub fn kind(&self) -> ManagedKind {
        match self {
            Self::Bucket(_) => ManagedKind::Bucket,
            Self::Key(_) => ManagedKind::Key,
            Self::KeyAccess(_) => ManagedKind::KeyAccess,
        }
    }

    pub fn meta(&self) -> &ObjectMeta {
        match self {
            Self::Bucket(r) => &r.metadata,
            Self::Key(r) => &r.metadata,
            Self::KeyAccess(r) => &r.metadata,
        }
    }

    fn meta_mut(&mut self) -> &mut ObjectMeta {
        match self {
            Self::Bucket(r) => &mut r.metadata,
            Self::Key(r) => &mut r.metadata,
            Self::KeyAccess(r) => &mut r.metadata,
        }
    }

    pub fn name(&self) -> &str {
        self.meta().name.as_deref().unwrap_or_default()
    }

    pub fn namespace(&self) -> &str {
        self.meta().namespace.as_deref().unwrap_or("default")
    }

    /// `Kind/namespace/name`, used for logging and backoff tracking
    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.kind(), self.namespace(), self.name())
    }

    /// Durable identity hint
    pub fn external_name(&self) -> Option<&str> {
        self.meta()
            .annotations
            .as_ref()
            .and_then(|a| a.get(EXTERNAL_NAME_ANNOTATION))
            .map(String::as_str)
    }

    pub fn set_external_name(&mut self, value: impl Into<String>) {
        self.meta_mut()
            .annotations
            .get_or_insert_with(BTreeMap::new)
            .insert(EXTERNAL_NAME_ANNOTATION.to_string(), value.into());
    }

    pub fn conditions(&self) -> &[Condition] {
        match self {
            Self::Bucket(r) => r.status.as_ref().map_or(&[], |s| s.conditions.as_slice()),
            Self::Key(r) => r.status.as_ref().map_or(&[], |s| s.conditions.as_slice()),
            Self::KeyAccess(r) => r.status.as_ref().map_or(&[], |s| s.conditions.as_slice()),
        }
    }

    /// Set a condition, keeping one per type. Returns whether it changed.
    pub fn set_condition(&mut self, condition: Condition) -> bool {
        let conditions = match self {
            Self::Bucket(r) => &mut r.status.get_or_insert_with(Default::default).conditions,
            Self::Key(r) => &mut r.status.get_or_insert_with(Default::default).conditions,
            Self::KeyAccess(r) => &mut r.status.get_or_insert_with(Default::default).conditions,
        };
        crds::set_condition(conditions, condition)
    }

    pub fn deletion_policy(&self) -> DeletionPolicy {
        match self {
            Self::Bucket(r) => r.spec.deletion_policy,
            Self::Key(r) => r.spec.deletion_policy,
            Self::KeyAccess(r) => r.spec.deletion_policy,
        }
    }

    pub fn is_being_deleted(&self) -> bool {
        self.meta().deletion_timestamp.is_some()
    }

    pub fn finalizers(&self) -> &[String] {
        self.meta().finalizers.as_deref().unwrap_or_default()
    }

    pub fn has_finalizer(&self) -> bool {
        self.finalizers().iter().any(|f| f == FINALIZER)
    }

    /// Returns true if the finalizer was added
    pub fn add_finalizer(&mut self) -> bool {
        if self.has_finalizer() {
            return false;
        }
        self.meta_mut()
            .finalizers
            .get_or_insert_with(Vec::new)
            .push(FINALIZER.to_string());
        true
    }

    /// Returns true if the finalizer was removed
    pub fn remove_finalizer(&mut self) -> bool {
        let Some(finalizers) = self.meta_mut().finalizers.as_mut() else {
            return false;
        };
        let before = finalizers.len();
        finalizers.retain(|f| f != FINALIZER);
        before != finalizers.len()
    }

    /// Where connection details go, if anywhere
    pub fn connection_secret_ref(&self) -> Option<&SecretReference> {
        match self {
            Self::Key(r) => r.spec.write_connection_secret_to_ref.as_ref(),
            Self::Bucket(_) | Self::KeyAccess(_) => None,
        }
    }

    /// Controller owner reference pointing at this resource
    pub fn owner_reference(&self) -> Option<OwnerReference> {
        match self {
            Self::Bucket(r) => r.controller_owner_ref(&()),
            Self::Key(r) => r.controller_owner_ref(&()),
            Self::KeyAccess(r) => r.controller_owner_ref(&()),
        }
    }

    /// Merge patch carrying the full status.
    ///
    /// Absent optional fields are written as `null` so that cleared
    /// identifiers are removed from the stored status.
    pub fn status_patch(&self) -> serde_json::Value {
        let status = match self {
            Self::Bucket(r) => {
                let s = r.status.clone().unwrap_or_default();
                json!({
                    "id": s.id,
                    "globalAliases": s.global_aliases,
                    "quotas": s.quotas,
                    "conditions": s.conditions,
                })
            }
            Self::Key(r) => {
                let s = r.status.clone().unwrap_or_default();
                json!({
                    "accessKeyId": s.access_key_id,
                    "conditions": s.conditions,
                })
            }
            Self::KeyAccess(r) => {
                let s = r.status.clone().unwrap_or_default();
                json!({
                    "bucketId": s.bucket_id,
                    "accessKeyId": s.access_key_id,
                    "permissions": s.permissions,
                    "conditions": s.conditions,
                })
            }
        };
        json!({ "status": status })
    }
}

/// Result of observing the external object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExternalObservation {
    pub resource_exists: bool,
    pub resource_up_to_date: bool,
}

impl ExternalObservation {
    pub fn absent() -> Self {
        Self::default()
    }

    pub fn exists(up_to_date: bool) -> Self {
        Self {
            resource_exists: true,
            resource_up_to_date: up_to_date,
        }
    }
}

/// Result of creating the external object
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalCreation {
    /// Values that must reach the connection publisher; only creation yields them
    pub connection_details: ConnectionDetails,
}

/// Observe/create/update/delete capability for one resource kind.
///
/// Implementations receive the resource mutably so they can record observed
/// identifiers in status (and, for keys, the identity hint).
#[async_trait::async_trait]
pub trait ExternalClient: Send + Sync {
    async fn observe(&self, mr: &mut ManagedResource) -> Result<ExternalObservation, ReconcileError>;
    async fn create(&self, mr: &mut ManagedResource) -> Result<ExternalCreation, ReconcileError>;
    async fn update(&self, mr: &mut ManagedResource) -> Result<(), ReconcileError>;
    async fn delete(&self, mr: &mut ManagedResource) -> Result<(), ReconcileError>;
}

/// Produces a short-lived external client for one reconcile cycle
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, mr: &ManagedResource) -> Result<Box<dyn ExternalClient>, ReconcileError>;
}
