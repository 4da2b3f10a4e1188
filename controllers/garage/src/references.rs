//! Cross-resource reference resolution.
//!
//! A dependent field is either a literal identifier or a reference to another
//! resource. References resolve through the referent's observed status only,
//! never through in-process hand-off.

use crate::error::ReconcileError;
use crate::managed::ManagedKind;
use crate::store::ResourceStore;
use crds::{GarageBucket, GarageKey, ResourceReference};
use std::sync::Arc;
use tracing::debug;

/// A resource whose observed identity other resources can point at
pub trait Referenceable {
    const KIND: ManagedKind;

    /// Observed external identifier, `None` until reconciled
    fn observed_identity(&self) -> Option<&str>;
}

impl Referenceable for GarageBucket {
    const KIND: ManagedKind = ManagedKind::Bucket;

    fn observed_identity(&self) -> Option<&str> {
        self.status.as_ref()?.id.as_deref().filter(|id| !id.is_empty())
    }
}

impl Referenceable for GarageKey {
    const KIND: ManagedKind = ManagedKind::Key;

    fn observed_identity(&self) -> Option<&str> {
        self.status
            .as_ref()?
            .access_key_id
            .as_deref()
            .filter(|id| !id.is_empty())
    }
}

/// Resolves literal-or-reference identifier fields
#[derive(Clone)]
pub struct ReferenceResolver {
    store: Arc<dyn ResourceStore>,
}

impl ReferenceResolver {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }

    /// Resolve a bucket ID from a literal or a GarageBucket reference
    pub async fn resolve_bucket_id(
        &self,
        namespace: &str,
        literal: Option<&str>,
        reference: Option<&ResourceReference>,
        field: &'static str,
    ) -> Result<Option<String>, ReconcileError> {
        if let Some(value) = non_empty(literal) {
            return Ok(Some(value.to_string()));
        }
        let Some(reference) = reference else {
            return Ok(None);
        };
        let ns = reference.namespace_or(namespace);
        let record = self.store.get_bucket(ns, &reference.name).await?;
        identity_of(record.as_ref(), ns, &reference.name, field).map(Some)
    }

    /// Resolve an access key ID from a literal or a GarageKey reference
    pub async fn resolve_access_key_id(
        &self,
        namespace: &str,
        literal: Option<&str>,
        reference: Option<&ResourceReference>,
        field: &'static str,
    ) -> Result<Option<String>, ReconcileError> {
        if let Some(value) = non_empty(literal) {
            return Ok(Some(value.to_string()));
        }
        let Some(reference) = reference else {
            return Ok(None);
        };
        let ns = reference.namespace_or(namespace);
        let record = self.store.get_key(ns, &reference.name).await?;
        identity_of(record.as_ref(), ns, &reference.name, field).map(Some)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn identity_of<T: Referenceable>(
    record: Option<&T>,
    namespace: &str,
    name: &str,
    field: &'static str,
) -> Result<String, ReconcileError> {
    let Some(record) = record else {
        return Err(ReconcileError::ReferenceNotFound {
            kind: T::KIND,
            namespace: namespace.to_string(),
            name: name.to_string(),
            field,
        });
    };
    match record.observed_identity() {
        Some(id) => {
            debug!("Resolved {} via {} {}/{} to {}", field, T::KIND, namespace, name, id);
            Ok(id.to_string())
        }
        None => Err(ReconcileError::ReferenceNotReady {
            kind: T::KIND,
            namespace: namespace.to_string(),
            name: name.to_string(),
            field,
        }),
    }
}
