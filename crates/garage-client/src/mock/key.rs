//! Key operations for MockGarageClient

use super::{MockGarageClient, lock};
use crate::error::GarageError;
use crate::models::*;
use crate::operation;

fn key_not_found(operation: &'static str, access_key_id: &str) -> GarageError {
    GarageError::NotFound {
        operation,
        body: format!("Key {access_key_id} not found"),
    }
}

pub fn create_key(client: &MockGarageClient, request: &CreateKeyRequest) -> Result<Key, GarageError> {
    client.record(operation::CREATE_KEY)?;

    let id = client.next_id();
    let key = Key {
        access_key_id: format!("GK{id:024x}"),
        name: request.name.clone(),
        ..Default::default()
    };
    lock(&client.keys).insert(key.access_key_id.clone(), key.clone());

    Ok(Key {
        secret_access_key: Some(format!("{id:064x}")),
        ..key
    })
}

pub fn get_key(client: &MockGarageClient, access_key_id: &str) -> Result<Key, GarageError> {
    client.record(operation::GET_KEY_BY_ID)?;
    lock(&client.keys)
        .get(access_key_id)
        .cloned()
        .ok_or_else(|| key_not_found(operation::GET_KEY_BY_ID, access_key_id))
}

/// Substring match, like the real listing: callers must filter for exact names.
pub fn search_keys(client: &MockGarageClient, pattern: &str) -> Result<Vec<KeyInfo>, GarageError> {
    client.record(operation::SEARCH_KEYS)?;
    let mut found: Vec<KeyInfo> = lock(&client.keys)
        .values()
        .filter(|k| k.name.contains(pattern) || k.access_key_id.starts_with(pattern))
        .map(|k| KeyInfo {
            id: k.access_key_id.clone(),
            name: k.name.clone(),
        })
        .collect();
    found.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(found)
}

pub fn update_key(client: &MockGarageClient, request: &UpdateKeyRequest) -> Result<Key, GarageError> {
    client.record(operation::UPDATE_KEY)?;
    let mut keys = lock(&client.keys);
    let key = keys
        .get_mut(&request.access_key_id)
        .ok_or_else(|| key_not_found(operation::UPDATE_KEY, &request.access_key_id))?;
    if let Some(name) = &request.name {
        key.name.clone_from(name);
    }
    if request.allow.is_some_and(|p| p.create_bucket) {
        key.permissions.create_bucket = true;
    }
    if request.deny.is_some_and(|p| p.create_bucket) {
        key.permissions.create_bucket = false;
    }
    Ok(key.clone())
}

pub fn delete_key(client: &MockGarageClient, access_key_id: &str) -> Result<(), GarageError> {
    client.record(operation::DELETE_KEY)?;
    if lock(&client.keys).remove(access_key_id).is_none() {
        return Err(key_not_found(operation::DELETE_KEY, access_key_id));
    }
    for bucket in lock(&client.buckets).values_mut() {
        bucket.keys.retain(|k| k.access_key_id != access_key_id);
    }
    Ok(())
}
