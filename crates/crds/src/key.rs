//! GarageKey Custom Resource Definition
//!
//! Declares an access key. Garage assigns the access key ID on creation and
//! returns the secret only once, in that same response.

use crate::managed::{Condition, DeletionPolicy};
use crate::references::SecretReference;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// GarageKeySpec defines the desired state of a Garage access key
#[derive(CustomResource, Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
#[kube(
    group = "garage.microscaler.io",
    version = "v1alpha1",
    kind = "GarageKey",
    namespaced,
    status = "GarageKeyStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct GarageKeySpec {
    /// Key name in Garage (immutable)
    pub name: String,

    /// Secret that receives `accessKeyId` and `secretAccessKey` on creation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_connection_secret_to_ref: Option<SecretReference>,

    /// What to do with the key in Garage when this resource is deleted
    #[serde(default)]
    pub deletion_policy: DeletionPolicy,
}

/// GarageKeyStatus defines the observed state of a Garage access key
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GarageKeyStatus {
    /// Access key ID assigned by Garage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}
