//! Key external client
//!
//! An access key ID only exists after creation and is not derivable from the
//! declared name, so Observe resolves identity in three tiers:
//!
//! 1. the external-name hint, unless it still equals `metadata.name` (never set)
//! 2. the access key ID recorded in status
//! 3. an exact-name search, which adopts a key whose creation outlived the
//!    process that issued it
//!
//! The secret is only ever surfaced from Create.

use crate::error::ReconcileError;
use crate::managed::{
    ConnectionDetails, ExternalClient, ExternalCreation, ExternalObservation, ManagedKind, ManagedResource,
};
use crds::{Condition, GarageKeyStatus};
use garage_client::{CreateKeyRequest, GarageClientTrait, GarageError, Key};
use std::sync::Arc;
use tracing::{debug, info};

/// Connection detail holding the access key ID
pub const ACCESS_KEY_ID: &str = "accessKeyId";
/// Connection detail holding the secret access key
pub const SECRET_ACCESS_KEY: &str = "secretAccessKey";

pub struct KeyExternal {
    client: Arc<dyn GarageClientTrait>,
}

/// Hint value if it was ever set
fn armed_hint(mr: &ManagedResource) -> Option<String> {
    mr.external_name()
        .filter(|hint| !hint.is_empty() && *hint != mr.name())
        .map(str::to_string)
}

fn ensure_key(mr: &ManagedResource) -> Result<(), ReconcileError> {
    match mr.kind() {
        ManagedKind::Key => Ok(()),
        actual => Err(ReconcileError::WrongKind {
            expected: ManagedKind::Key,
            actual,
        }),
    }
}

fn status_mut(mr: &mut ManagedResource) -> Option<&mut GarageKeyStatus> {
    match mr {
        ManagedResource::Key(k) => Some(k.status.get_or_insert_with(GarageKeyStatus::default)),
        _ => None,
    }
}

fn observed_id(mr: &ManagedResource) -> Option<String> {
    match mr {
        ManagedResource::Key(k) => k
            .status
            .as_ref()
            .and_then(|s| s.access_key_id.clone())
            .filter(|id| !id.is_empty()),
        _ => None,
    }
}

fn declared_name(mr: &ManagedResource) -> String {
    match mr {
        ManagedResource::Key(k) => k.spec.name.clone(),
        _ => String::new(),
    }
}

fn set_observed_id(mr: &mut ManagedResource, id: Option<String>) {
    if let Some(status) = status_mut(mr) {
        status.access_key_id = id;
    }
}

impl KeyExternal {
    pub fn new(client: Arc<dyn GarageClientTrait>) -> Self {
        Self { client }
    }

    /// Get a key by ID; `Ok(None)` if Garage does not know it
    async fn lookup(&self, access_key_id: &str) -> Result<Option<Key>, ReconcileError> {
        match self.client.get_key(access_key_id).await {
            Ok(key) => Ok(Some(key)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(ReconcileError::external("cannot get key", e)),
        }
    }

    async fn resolve(&self, mr: &mut ManagedResource) -> Result<Option<Key>, ReconcileError> {
        if let Some(hint) = armed_hint(mr) {
            if let Some(key) = self.lookup(&hint).await? {
                debug!("Resolved {} through its external name", mr.key());
                return Ok(Some(key));
            }
            debug!("External name {} of {} did not resolve", hint, mr.key());
        }

        if let Some(id) = observed_id(mr) {
            if let Some(key) = self.lookup(&id).await? {
                debug!("Resolved {} through its observed access key ID", mr.key());
                return Ok(Some(key));
            }
            info!("Key {} of {} was removed outside the controller; clearing it", id, mr.key());
            set_observed_id(mr, None);
        }

        let name = declared_name(mr);
        if name.is_empty() {
            return Ok(None);
        }
        let found = self
            .client
            .search_key_by_name(&name)
            .await
            .map_err(|e| ReconcileError::external("cannot search keys", e))?;
        if let Some(key) = &found {
            info!("Adopted existing key {} named {:?} for {}", key.access_key_id, name, mr.key());
        }
        Ok(found)
    }
}

#[async_trait::async_trait]
impl ExternalClient for KeyExternal {
    async fn observe(&self, mr: &mut ManagedResource) -> Result<ExternalObservation, ReconcileError> {
        ensure_key(mr)?;
        let Some(key) = self.resolve(mr).await? else {
            return Ok(ExternalObservation::absent());
        };

        if mr.external_name() != Some(key.access_key_id.as_str()) {
            mr.set_external_name(key.access_key_id.clone());
        }
        set_observed_id(mr, Some(key.access_key_id));
        mr.set_condition(Condition::available());
        // Keys are immutable once created
        Ok(ExternalObservation::exists(true))
    }

    async fn create(&self, mr: &mut ManagedResource) -> Result<ExternalCreation, ReconcileError> {
        ensure_key(mr)?;
        let request = CreateKeyRequest {
            name: declared_name(mr),
        };
        let created = self
            .client
            .create_key(&request)
            .await
            .map_err(|e| ReconcileError::external("cannot create key", e))?;

        mr.set_external_name(created.access_key_id.clone());
        set_observed_id(mr, Some(created.access_key_id.clone()));

        let mut details = ConnectionDetails::new();
        details.insert(ACCESS_KEY_ID.to_string(), created.access_key_id.into_bytes());
        if let Some(secret) = created.secret_access_key.filter(|s| !s.is_empty()) {
            details.insert(SECRET_ACCESS_KEY.to_string(), secret.into_bytes());
        }
        Ok(ExternalCreation {
            connection_details: details,
        })
    }

    async fn update(&self, mr: &mut ManagedResource) -> Result<(), ReconcileError> {
        ensure_key(mr)
    }

    async fn delete(&self, mr: &mut ManagedResource) -> Result<(), ReconcileError> {
        ensure_key(mr)?;
        let Some(id) = observed_id(mr).or_else(|| armed_hint(mr)) else {
            debug!("{} has no access key ID; nothing to delete", mr.key());
            return Ok(());
        };
        match self.client.delete_key(&id).await {
            Ok(()) => Ok(()),
            Err(GarageError::NotFound { .. }) => Ok(()),
            Err(e) => Err(ReconcileError::external("cannot delete key", e)),
        }
    }
}
