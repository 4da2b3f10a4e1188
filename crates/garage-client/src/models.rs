//! Garage Admin API data models
//!
//! Request and response shapes for the v1 Admin API. Field names follow the
//! API's camelCase JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read/write/owner permission triple on a bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
    #[serde(default)]
    pub owner: bool,
}

impl Permissions {
    /// All three flags set.
    #[must_use]
    pub fn all() -> Self {
        Self { read: true, write: true, owner: true }
    }

    /// True when no flag is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.read && !self.write && !self.owner
    }
}

/// Garage bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub id: String,
    #[serde(default)]
    pub global_aliases: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub local_aliases: BTreeMap<String, String>,
    /// Keys holding a grant on this bucket
    #[serde(default)]
    pub keys: Vec<BucketKeyPermission>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotas: Option<BucketQuotas>,
}

impl Bucket {
    /// Grant held by `access_key_id` on this bucket, if any.
    #[must_use]
    pub fn key_permission(&self, access_key_id: &str) -> Option<&BucketKeyPermission> {
        self.keys.iter().find(|k| k.access_key_id == access_key_id)
    }
}

/// Permissions for a key on a bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketKeyPermission {
    pub access_key_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub permissions: Permissions,
}

/// Bucket quotas
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketQuotas {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_objects: Option<u64>,
}

/// Garage access key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Key {
    pub access_key_id: String,
    #[serde(default)]
    pub name: String,
    /// Only present in the response to key creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,
    #[serde(default)]
    pub permissions: KeyPermissions,
    #[serde(default)]
    pub buckets: Vec<KeyBucketPermission>,
}

/// Global permissions for a key
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyPermissions {
    #[serde(default)]
    pub create_bucket: bool,
}

/// Permissions for a key on one bucket, as listed on the key
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyBucketPermission {
    pub id: String,
    #[serde(default)]
    pub global_aliases: Vec<String>,
    #[serde(default)]
    pub permissions: Permissions,
}

/// Key summary returned by listing/search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Local (per-key) bucket alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalAliasRequest {
    pub access_key_id: String,
    pub alias: String,
}

/// Request to create a bucket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBucketRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_alias: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_alias: Option<LocalAliasRequest>,
}

/// Request to update a bucket's quotas
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBucketRequest {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quotas: Option<BucketQuotas>,
}

/// Request to create a key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateKeyRequest {
    pub name: String,
}

/// Request to update a key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateKeyRequest {
    pub access_key_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow: Option<KeyPermissions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deny: Option<KeyPermissions>,
}

/// Request to allow or deny a key's permissions on a bucket.
///
/// On allow the set flags are granted; on deny the set flags are removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketAccessRequest {
    pub bucket_id: String,
    pub access_key_id: String,
    pub permissions: Permissions,
}
