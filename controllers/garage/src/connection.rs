//! Connection detail publishing.
//!
//! The engine decides which values to publish and when; the publisher only
//! stores them.

use crate::error::ReconcileError;
use crate::managed::{ConnectionDetails, ManagedResource};
use k8s_openapi::ByteString;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Patch, PatchParams, PostParams};
use kube::{Api, Client};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Stores connection details for a resource
#[async_trait::async_trait]
pub trait ConnectionPublisher: Send + Sync {
    /// Store `details` for `mr`. Keys not in `details` are left untouched.
    async fn publish(&self, mr: &ManagedResource, details: &ConnectionDetails) -> Result<(), ReconcileError>;
}

/// Writes connection details into the Secret named by `writeConnectionSecretToRef`
#[derive(Clone)]
pub struct SecretPublisher {
    client: Client,
}

impl SecretPublisher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn secret_data(details: &ConnectionDetails) -> BTreeMap<String, ByteString> {
    details
        .iter()
        .map(|(k, v)| (k.clone(), ByteString(v.clone())))
        .collect()
}

#[async_trait::async_trait]
impl ConnectionPublisher for SecretPublisher {
    async fn publish(&self, mr: &ManagedResource, details: &ConnectionDetails) -> Result<(), ReconcileError> {
        let Some(secret_ref) = mr.connection_secret_ref() else {
            debug!("{} has no connection secret reference, skipping publish", mr.key());
            return Ok(());
        };
        if details.is_empty() {
            return Ok(());
        }

        let namespace = secret_ref.namespace_or(mr.namespace());
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let data = secret_data(details);

        if api.get_opt(&secret_ref.name).await?.is_some() {
            // Merge so keys written earlier survive
            let patch = json!({ "data": data });
            api.patch(&secret_ref.name, &PatchParams::default(), &Patch::Merge(&patch))
                .await?;
            info!("Updated connection secret {}/{} for {}", namespace, secret_ref.name, mr.key());
        } else {
            let owner_references = if namespace == mr.namespace() {
                mr.owner_reference().map(|o| vec![o])
            } else {
                None
            };
            let secret = Secret {
                metadata: ObjectMeta {
                    name: Some(secret_ref.name.clone()),
                    namespace: Some(namespace.to_string()),
                    owner_references,
                    ..Default::default()
                },
                data: Some(data),
                type_: Some("Opaque".to_string()),
                ..Default::default()
            };
            api.create(&PostParams::default(), &secret).await?;
            info!("Created connection secret {}/{} for {}", namespace, secret_ref.name, mr.key());
        }
        Ok(())
    }
}
