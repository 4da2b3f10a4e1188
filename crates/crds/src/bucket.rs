//! GarageBucket Custom Resource Definition
//!
//! Declares a bucket in a Garage cluster. The bucket's identity is the ID
//! Garage assigns on creation; it can also be found by its global alias.

use crate::managed::{Condition, DeletionPolicy};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// GarageBucketSpec defines the desired state of a Garage bucket
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "garage.microscaler.io",
    version = "v1alpha1",
    kind = "GarageBucket",
    namespaced,
    status = "GarageBucketStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct GarageBucketSpec {
    /// Global alias (cluster-wide bucket name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_alias: Option<String>,

    /// Alias visible only to one access key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_alias: Option<LocalAlias>,

    /// Size and object-count limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotas: Option<BucketQuotas>,

    /// What to do with the bucket in Garage when this resource is deleted
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// Alias scoped to a single access key
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LocalAlias {
    pub access_key_id: String,
    pub alias: String,
}

/// Bucket quotas
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BucketQuotas {
    /// Maximum size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<u64>,

    /// Maximum number of objects
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_objects: Option<u64>,
}

/// GarageBucketStatus defines the observed state of a Garage bucket
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GarageBucketStatus {
    /// Garage bucket ID (set once observed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Global aliases reported by Garage
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub global_aliases: Vec<String>,

    /// Quotas reported by Garage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quotas: Option<BucketQuotas>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}
