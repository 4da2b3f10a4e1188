//! GarageKeyAccess Custom Resource Definition
//!
//! Grants an access key read/write/owner permissions on a bucket. Both
//! endpoints may be given literally or as references to a GarageBucket /
//! GarageKey in the cluster.

use crate::managed::{Condition, DeletionPolicy};
use crate::references::ResourceReference;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// GarageKeyAccessSpec defines the desired permission grant
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "garage.microscaler.io",
    version = "v1alpha1",
    kind = "GarageKeyAccess",
    namespaced,
    status = "GarageKeyAccessStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct GarageKeyAccessSpec {
    /// Literal bucket ID; takes precedence over `bucketIdRef`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_id: Option<String>,

    /// GarageBucket whose observed ID is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_id_ref: Option<ResourceReference>,

    /// Literal access key ID; takes precedence over `accessKeyIdRef`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    /// GarageKey whose observed access key ID is used
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id_ref: Option<ResourceReference>,

    /// Permissions to grant
    #[serde(default)]
    pub permissions: AccessPermissions,

    /// Whether to revoke the grant in Garage when this resource is deleted
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// Read/write/owner permission triple
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AccessPermissions {
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub write: bool,
    #[serde(default)]
    pub owner: bool,
}

/// GarageKeyAccessStatus defines the observed grant
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GarageKeyAccessStatus {
    /// Resolved bucket ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_id: Option<String>,

    /// Resolved access key ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    /// Permissions Garage reports for the key on the bucket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<AccessPermissions>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}
