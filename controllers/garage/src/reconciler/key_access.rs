//! KeyAccess external client
//!
//! A KeyAccess is the permission edge between a bucket and a key. It exists
//! only when both endpoints resolve and Garage lists the key in the bucket's
//! grants.

use crate::error::ReconcileError;
use crate::managed::{ExternalClient, ExternalCreation, ExternalObservation, ManagedKind, ManagedResource};
use crate::references::ReferenceResolver;
use crds::{AccessPermissions, Condition, GarageKeyAccess, GarageKeyAccessStatus};
use garage_client::{BucketAccessRequest, GarageClientTrait, Permissions};
use std::sync::Arc;
use tracing::debug;

pub struct KeyAccessExternal {
    client: Arc<dyn GarageClientTrait>,
    resolver: ReferenceResolver,
}

fn as_key_access(mr: &mut ManagedResource) -> Result<&mut GarageKeyAccess, ReconcileError> {
    match mr {
        ManagedResource::KeyAccess(ka) => Ok(ka),
        other => Err(ReconcileError::WrongKind {
            expected: ManagedKind::KeyAccess,
            actual: other.kind(),
        }),
    }
}

fn to_permissions(p: AccessPermissions) -> Permissions {
    Permissions {
        read: p.read,
        write: p.write,
        owner: p.owner,
    }
}

fn from_permissions(p: Permissions) -> AccessPermissions {
    AccessPermissions {
        read: p.read,
        write: p.write,
        owner: p.owner,
    }
}

/// Both endpoint IDs as recorded in status
fn observed_ids(ka: &GarageKeyAccess) -> Option<(String, String)> {
    let status = ka.status.as_ref()?;
    let bucket_id = status.bucket_id.clone().filter(|id| !id.is_empty())?;
    let access_key_id = status.access_key_id.clone().filter(|id| !id.is_empty())?;
    Some((bucket_id, access_key_id))
}

impl KeyAccessExternal {
    pub fn new(client: Arc<dyn GarageClientTrait>, resolver: ReferenceResolver) -> Self {
        Self { client, resolver }
    }

    async fn resolve(&self, ka: &GarageKeyAccess) -> Result<(Option<String>, Option<String>), ReconcileError> {
        let namespace = ka.metadata.namespace.as_deref().unwrap_or("default");
        let bucket_id = self
            .resolver
            .resolve_bucket_id(
                namespace,
                ka.spec.bucket_id.as_deref(),
                ka.spec.bucket_id_ref.as_ref(),
                "bucketIdRef",
            )
            .await?;
        let access_key_id = self
            .resolver
            .resolve_access_key_id(
                namespace,
                ka.spec.access_key_id.as_deref(),
                ka.spec.access_key_id_ref.as_ref(),
                "accessKeyIdRef",
            )
            .await?;
        Ok((bucket_id, access_key_id))
    }

    async fn change(
        &self,
        allow: bool,
        bucket_id: &str,
        access_key_id: &str,
        permissions: Permissions,
        context: &'static str,
    ) -> Result<(), ReconcileError> {
        let request = BucketAccessRequest {
            bucket_id: bucket_id.to_string(),
            access_key_id: access_key_id.to_string(),
            permissions,
        };
        let result = if allow {
            self.client.grant_access(&request).await
        } else {
            self.client.revoke_access(&request).await
        };
        result.map(|_| ()).map_err(|e| ReconcileError::external(context, e))
    }
}

#[async_trait::async_trait]
impl ExternalClient for KeyAccessExternal {
    async fn observe(&self, mr: &mut ManagedResource) -> Result<ExternalObservation, ReconcileError> {
        let ka = as_key_access(mr)?;
        let (bucket_id, access_key_id) = self.resolve(ka).await?;

        // Status mirrors the current resolution; an unresolved end clears its ID
        let status = ka.status.get_or_insert_with(GarageKeyAccessStatus::default);
        status.bucket_id = bucket_id.clone();
        status.access_key_id = access_key_id.clone();
        let (Some(bucket_id), Some(access_key_id)) = (bucket_id, access_key_id) else {
            debug!("KeyAccess has no bucket or key to relate");
            status.permissions = None;
            return Ok(ExternalObservation::absent());
        };

        let bucket = match self.client.get_bucket(&bucket_id).await {
            Ok(bucket) => bucket,
            Err(e) if e.is_not_found() => {
                status.permissions = None;
                return Ok(ExternalObservation::absent());
            }
            Err(e) => return Err(ReconcileError::external("cannot get bucket", e)),
        };

        let Some(grant) = bucket.key_permission(&access_key_id) else {
            status.permissions = None;
            return Ok(ExternalObservation::absent());
        };
        let observed = from_permissions(grant.permissions);
        status.permissions = Some(observed);
        let up_to_date = observed == ka.spec.permissions;

        mr.set_condition(Condition::available());
        Ok(ExternalObservation::exists(up_to_date))
    }

    async fn create(&self, mr: &mut ManagedResource) -> Result<ExternalCreation, ReconcileError> {
        let ka = as_key_access(mr)?;
        let Some((bucket_id, access_key_id)) = observed_ids(ka) else {
            return Err(ReconcileError::InvalidSpec(
                "bucketId and accessKeyId must be set directly or by reference".to_string(),
            ));
        };
        let permissions = to_permissions(ka.spec.permissions);
        if permissions.is_empty() {
            return Err(ReconcileError::InvalidSpec(
                "at least one of read, write or owner must be granted".to_string(),
            ));
        }

        self.change(true, &bucket_id, &access_key_id, permissions, "cannot grant key access")
            .await?;
        if let Some(status) = ka.status.as_mut() {
            status.permissions = Some(ka.spec.permissions);
        }
        Ok(ExternalCreation::default())
    }

    async fn update(&self, mr: &mut ManagedResource) -> Result<(), ReconcileError> {
        let ka = as_key_access(mr)?;
        let Some((bucket_id, access_key_id)) = observed_ids(ka) else {
            return Ok(());
        };
        let desired = ka.spec.permissions;
        let current = ka.status.as_ref().and_then(|s| s.permissions).unwrap_or_default();

        let allow = Permissions {
            read: desired.read && !current.read,
            write: desired.write && !current.write,
            owner: desired.owner && !current.owner,
        };
        let deny = Permissions {
            read: !desired.read && current.read,
            write: !desired.write && current.write,
            owner: !desired.owner && current.owner,
        };

        if !allow.is_empty() {
            self.change(true, &bucket_id, &access_key_id, allow, "cannot grant key access")
                .await?;
        }
        if !deny.is_empty() {
            self.change(false, &bucket_id, &access_key_id, deny, "cannot revoke key access")
                .await?;
        }
        if let Some(status) = ka.status.as_mut() {
            status.permissions = Some(desired);
        }
        Ok(())
    }

    async fn delete(&self, mr: &mut ManagedResource) -> Result<(), ReconcileError> {
        let ka = as_key_access(mr)?;
        let Some((bucket_id, access_key_id)) = observed_ids(ka) else {
            debug!("KeyAccess has no resolved endpoints; nothing to revoke");
            return Ok(());
        };
        match self
            .change(false, &bucket_id, &access_key_id, Permissions::all(), "cannot revoke key access")
            .await
        {
            Err(ReconcileError::External { source, .. }) if source.is_not_found() => Ok(()),
            other => other,
        }
    }
}
