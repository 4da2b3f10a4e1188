//! Bucket external client

use crate::error::ReconcileError;
use crate::managed::{ExternalClient, ExternalCreation, ExternalObservation, ManagedKind, ManagedResource};
use crds::{BucketQuotas, Condition, GarageBucket, GarageBucketStatus};
use garage_client::{Bucket, CreateBucketRequest, GarageClientTrait, LocalAliasRequest, UpdateBucketRequest};
use std::sync::Arc;
use tracing::debug;

pub struct BucketExternal {
    client: Arc<dyn GarageClientTrait>,
}

impl BucketExternal {
    pub fn new(client: Arc<dyn GarageClientTrait>) -> Self {
        Self { client }
    }

    /// Look up by observed ID, then by global alias.
    ///
    /// A stale ID is cleared from status so it is not served again.
    async fn find(&self, bucket: &mut GarageBucket) -> Result<Option<Bucket>, ReconcileError> {
        if let Some(id) = observed_id(bucket) {
            match self.client.get_bucket(&id).await {
                Ok(found) => return Ok(Some(found)),
                Err(e) if e.is_not_found() => {
                    debug!("Bucket {} no longer exists; clearing observed ID", id);
                    if let Some(status) = bucket.status.as_mut() {
                        status.id = None;
                    }
                }
                Err(e) => return Err(ReconcileError::external("cannot get bucket", e)),
            }
        }

        let Some(alias) = bucket.spec.global_alias.as_deref().filter(|a| !a.is_empty()) else {
            return Ok(None);
        };
        match self.client.get_bucket_by_alias(alias).await {
            Ok(found) => Ok(Some(found)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(ReconcileError::external("cannot get bucket", e)),
        }
    }
}

fn as_bucket(mr: &mut ManagedResource) -> Result<&mut GarageBucket, ReconcileError> {
    match mr {
        ManagedResource::Bucket(b) => Ok(b),
        other => Err(ReconcileError::WrongKind {
            expected: ManagedKind::Bucket,
            actual: other.kind(),
        }),
    }
}

fn observed_id(bucket: &GarageBucket) -> Option<String> {
    bucket
        .status
        .as_ref()
        .and_then(|s| s.id.clone())
        .filter(|id| !id.is_empty())
}

fn to_crd_quotas(quotas: Option<garage_client::BucketQuotas>) -> Option<BucketQuotas> {
    quotas.map(|q| BucketQuotas {
        max_size: q.max_size,
        max_objects: q.max_objects,
    })
}

fn record(bucket: &mut GarageBucket, found: &Bucket) {
    let status = bucket.status.get_or_insert_with(GarageBucketStatus::default);
    status.id = Some(found.id.clone());
    status.global_aliases = found.global_aliases.clone();
    status.quotas = to_crd_quotas(found.quotas);
}

#[async_trait::async_trait]
impl ExternalClient for BucketExternal {
    async fn observe(&self, mr: &mut ManagedResource) -> Result<ExternalObservation, ReconcileError> {
        let bucket = as_bucket(mr)?;
        let Some(found) = self.find(bucket).await? else {
            return Ok(ExternalObservation::absent());
        };

        record(bucket, &found);
        let up_to_date = match bucket.spec.quotas {
            None => true,
            Some(declared) => to_crd_quotas(found.quotas).unwrap_or_default() == declared,
        };
        mr.set_condition(Condition::available());
        Ok(ExternalObservation::exists(up_to_date))
    }

    async fn create(&self, mr: &mut ManagedResource) -> Result<ExternalCreation, ReconcileError> {
        let bucket = as_bucket(mr)?;
        let request = CreateBucketRequest {
            global_alias: bucket.spec.global_alias.clone().filter(|a| !a.is_empty()),
            local_alias: bucket.spec.local_alias.as_ref().map(|l| LocalAliasRequest {
                access_key_id: l.access_key_id.clone(),
                alias: l.alias.clone(),
            }),
        };
        let created = self
            .client
            .create_bucket(&request)
            .await
            .map_err(|e| ReconcileError::external("cannot create bucket", e))?;
        record(bucket, &created);
        Ok(ExternalCreation::default())
    }

    async fn update(&self, mr: &mut ManagedResource) -> Result<(), ReconcileError> {
        let bucket = as_bucket(mr)?;
        let Some(id) = observed_id(bucket) else {
            return Ok(());
        };
        let request = UpdateBucketRequest {
            id,
            quotas: bucket.spec.quotas.map(|q| garage_client::BucketQuotas {
                max_size: q.max_size,
                max_objects: q.max_objects,
            }),
        };
        let updated = self
            .client
            .update_bucket(&request)
            .await
            .map_err(|e| ReconcileError::external("cannot update bucket", e))?;
        record(bucket, &updated);
        Ok(())
    }

    async fn delete(&self, mr: &mut ManagedResource) -> Result<(), ReconcileError> {
        let bucket = as_bucket(mr)?;
        let Some(id) = observed_id(bucket) else {
            debug!("Bucket has no observed ID; nothing to delete");
            return Ok(());
        };
        match self.client.delete_bucket(&id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(ReconcileError::external("cannot delete bucket", e)),
        }
    }
}
