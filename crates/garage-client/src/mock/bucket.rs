//! Bucket operations for MockGarageClient
//!
//! Handles buckets and the key grants stored on them

use super::{MockGarageClient, lock};
use crate::error::GarageError;
use crate::models::*;
use crate::operation;

fn not_found(operation: &'static str, what: &str) -> GarageError {
    GarageError::NotFound {
        operation,
        body: format!("{what} not found"),
    }
}

pub fn create_bucket(client: &MockGarageClient, request: &CreateBucketRequest) -> Result<Bucket, GarageError> {
    client.record(operation::CREATE_BUCKET)?;

    let mut buckets = lock(&client.buckets);
    if let Some(alias) = &request.global_alias {
        if buckets.values().any(|b| b.global_aliases.contains(alias)) {
            return Err(GarageError::Api {
                operation: operation::CREATE_BUCKET,
                status: 409,
                body: format!("Bucket {alias} already exists"),
            });
        }
    }

    let id = format!("{:064x}", client.next_id());
    let mut bucket = Bucket {
        id: id.clone(),
        global_aliases: request.global_alias.iter().cloned().collect(),
        ..Default::default()
    };
    if let Some(local) = &request.local_alias {
        bucket
            .local_aliases
            .insert(local.access_key_id.clone(), local.alias.clone());
    }
    buckets.insert(id, bucket.clone());
    Ok(bucket)
}

pub fn get_bucket(client: &MockGarageClient, id: &str) -> Result<Bucket, GarageError> {
    client.record(operation::GET_BUCKET_BY_ID)?;
    lock(&client.buckets)
        .get(id)
        .cloned()
        .ok_or_else(|| not_found(operation::GET_BUCKET_BY_ID, &format!("Bucket {id}")))
}

pub fn get_bucket_by_alias(client: &MockGarageClient, global_alias: &str) -> Result<Bucket, GarageError> {
    client.record(operation::GET_BUCKET_BY_ALIAS)?;
    lock(&client.buckets)
        .values()
        .find(|b| b.global_aliases.iter().any(|a| a == global_alias))
        .cloned()
        .ok_or_else(|| not_found(operation::GET_BUCKET_BY_ALIAS, &format!("Bucket {global_alias}")))
}

pub fn update_bucket(client: &MockGarageClient, request: &UpdateBucketRequest) -> Result<Bucket, GarageError> {
    client.record(operation::UPDATE_BUCKET)?;
    let mut buckets = lock(&client.buckets);
    let bucket = buckets
        .get_mut(&request.id)
        .ok_or_else(|| not_found(operation::UPDATE_BUCKET, &format!("Bucket {}", request.id)))?;
    if let Some(quotas) = request.quotas {
        bucket.quotas = Some(quotas);
    }
    Ok(bucket.clone())
}

pub fn delete_bucket(client: &MockGarageClient, id: &str) -> Result<(), GarageError> {
    client.record(operation::DELETE_BUCKET)?;
    if lock(&client.buckets).remove(id).is_none() {
        return Err(not_found(operation::DELETE_BUCKET, &format!("Bucket {id}")));
    }
    for key in lock(&client.keys).values_mut() {
        key.buckets.retain(|b| b.id != id);
    }
    Ok(())
}

pub fn grant_access(client: &MockGarageClient, request: &BucketAccessRequest) -> Result<Bucket, GarageError> {
    change_access(client, operation::GRANT_ACCESS, request, |current, flag| current || flag)
}

pub fn revoke_access(client: &MockGarageClient, request: &BucketAccessRequest) -> Result<Bucket, GarageError> {
    change_access(client, operation::REVOKE_ACCESS, request, |current, flag| current && !flag)
}

fn change_access(
    client: &MockGarageClient,
    operation: &'static str,
    request: &BucketAccessRequest,
    apply: fn(bool, bool) -> bool,
) -> Result<Bucket, GarageError> {
    client.record(operation)?;

    let mut keys = lock(&client.keys);
    let key = keys
        .get_mut(&request.access_key_id)
        .ok_or_else(|| not_found(operation, &format!("Key {}", request.access_key_id)))?;
    let mut buckets = lock(&client.buckets);
    let bucket = buckets
        .get_mut(&request.bucket_id)
        .ok_or_else(|| not_found(operation, &format!("Bucket {}", request.bucket_id)))?;

    let current = bucket
        .key_permission(&request.access_key_id)
        .map(|k| k.permissions)
        .unwrap_or_default();
    let updated = Permissions {
        read: apply(current.read, request.permissions.read),
        write: apply(current.write, request.permissions.write),
        owner: apply(current.owner, request.permissions.owner),
    };

    bucket.keys.retain(|k| k.access_key_id != request.access_key_id);
    key.buckets.retain(|b| b.id != request.bucket_id);
    if !updated.is_empty() {
        bucket.keys.push(BucketKeyPermission {
            access_key_id: key.access_key_id.clone(),
            name: key.name.clone(),
            permissions: updated,
        });
        key.buckets.push(KeyBucketPermission {
            id: bucket.id.clone(),
            global_aliases: bucket.global_aliases.clone(),
            permissions: updated,
        });
    }
    Ok(bucket.clone())
}
