//! Controller-specific error types.
//!
//! `ControllerError` covers start-up and wiring; `ReconcileError` is what a
//! single reconcile cycle can fail with.

use crate::managed::ManagedKind;
use garage_client::GarageError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur while starting or running the Garage Controller.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Kubernetes API error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Garage API error
    #[error("Garage error: {0}")]
    Garage(#[from] GarageError),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Resource watch failed
    #[error("Resource watch failed: {0}")]
    Watch(String),
}

/// Errors from one reconcile cycle of one resource.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The engine was handed a resource of the wrong kind. Indicates broken wiring.
    #[error("managed resource is not a {expected} custom resource (got {actual})")]
    WrongKind {
        expected: ManagedKind,
        actual: ManagedKind,
    },

    /// A referenced resource exists but has no observed identity yet
    #[error("cannot resolve {field}: {kind} {namespace}/{name} is not reconciled yet")]
    ReferenceNotReady {
        kind: ManagedKind,
        namespace: String,
        name: String,
        field: &'static str,
    },

    /// A referenced resource does not exist (yet)
    #[error("cannot resolve {field}: {kind} {namespace}/{name} not found")]
    ReferenceNotFound {
        kind: ManagedKind,
        namespace: String,
        name: String,
        field: &'static str,
    },

    /// A Garage call failed; `context` names what the engine was doing
    #[error("{context}: {source}")]
    External {
        context: &'static str,
        #[source]
        source: GarageError,
    },

    /// No usable Garage connection could be built
    #[error("cannot connect to Garage: {0}")]
    Connect(String),

    /// The desired state cannot be acted on
    #[error("invalid spec: {0}")]
    InvalidSpec(String),

    /// Kubernetes API error while reading or writing records
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),
}

impl ReconcileError {
    /// Wrap a Garage failure with a resource-kind-specific label
    pub fn external(context: &'static str, source: GarageError) -> Self {
        Self::External { context, source }
    }

    /// True when the cycle failed only because a dependency has not converged.
    ///
    /// These are retried without being reported as failures.
    pub fn is_dependency_not_ready(&self) -> bool {
        matches!(self, Self::ReferenceNotReady { .. } | Self::ReferenceNotFound { .. })
    }
}
