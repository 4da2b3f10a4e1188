//! Reconciliation logic for Garage resources.
//!
//! - `engine`: the kind-independent observe/create/update/delete cycle
//! - `bucket`, `key`, `key_access`: per-kind external clients
//!
//! `Reconciler` wraps the engine for the kube runtime: it maps cycle outcomes
//! onto requeue actions and tracks a Fibonacci backoff per failing resource.

pub mod bucket;
pub mod engine;
pub mod key;
pub mod key_access;

#[cfg(test)]
mod engine_test;

use crate::backoff::FibonacciBackoff;
use crate::error::ReconcileError;
use crate::managed::{ExternalClient, ManagedKind, ManagedResource};
use crate::references::ReferenceResolver;
use crate::store::ResourceStore;
use bucket::BucketExternal;
pub use engine::{Engine, ReconcileOutcome};
use garage_client::GarageClientTrait;
use key::KeyExternal;
use key_access::KeyAccessExternal;
use kube_runtime::controller::Action;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

const MIN_BACKOFF: Duration = Duration::from_secs(5);
const MAX_BACKOFF: Duration = Duration::from_secs(300);
/// Requeue after a create, update or delete so the result is observed promptly
const SETTLE_REQUEUE: Duration = Duration::from_secs(5);
/// Requeue while a referenced resource converges
const DEPENDENCY_REQUEUE: Duration = Duration::from_secs(10);

/// Build the external client for `kind`
pub fn external_for(
    kind: ManagedKind,
    client: Arc<dyn GarageClientTrait>,
    store: Arc<dyn ResourceStore>,
) -> Box<dyn ExternalClient> {
    match kind {
        ManagedKind::Bucket => Box::new(BucketExternal::new(client)),
        ManagedKind::Key => Box::new(KeyExternal::new(client)),
        ManagedKind::KeyAccess => Box::new(KeyAccessExternal::new(client, ReferenceResolver::new(store))),
    }
}

/// Backoff state for a resource
#[derive(Debug, Clone)]
struct BackoffState {
    backoff: FibonacciBackoff,
    error_count: u32,
}

impl BackoffState {
    fn new() -> Self {
        Self {
            backoff: FibonacciBackoff::new(MIN_BACKOFF, MAX_BACKOFF),
            error_count: 0,
        }
    }
}

/// Reconciles Garage resources.
pub struct Reconciler {
    engine: Engine,
    poll_interval: Duration,
    /// Error tracking per resource (Kind/namespace/name -> BackoffState)
    backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl Reconciler {
    pub fn new(engine: Engine, poll_interval: Duration) -> Self {
        Self {
            engine,
            poll_interval,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Run one cycle and decide when to look at the resource again
    pub async fn reconcile(&self, resource: ManagedResource) -> Result<Action, ReconcileError> {
        let key = resource.key();
        let outcome = self.engine.reconcile(resource).await?;
        self.reset_error(&key);
        debug!("Reconciled {}: {:?}", key, outcome);
        Ok(self.action_for(outcome))
    }

    fn action_for(&self, outcome: ReconcileOutcome) -> Action {
        match outcome {
            ReconcileOutcome::Created | ReconcileOutcome::Updated | ReconcileOutcome::Deleting => {
                Action::requeue(SETTLE_REQUEUE)
            }
            ReconcileOutcome::UpToDate => Action::requeue(self.poll_interval),
            ReconcileOutcome::WaitingForReferences => Action::requeue(DEPENDENCY_REQUEUE),
            ReconcileOutcome::Deleted | ReconcileOutcome::Orphaned => Action::await_change(),
        }
    }

    /// Requeue action after a failed cycle, advancing the resource's backoff
    pub fn error_action(&self, resource_key: &str) -> Action {
        let (delay, error_count) = self.next_backoff(resource_key);
        warn!(
            "Requeueing {} in {}s after {} consecutive error(s)",
            resource_key,
            delay.as_secs(),
            error_count
        );
        Action::requeue(delay)
    }

    fn next_backoff(&self, resource_key: &str) -> (Duration, u32) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let state = states
                    .entry(resource_key.to_string())
                    .or_insert_with(BackoffState::new);
                state.error_count += 1;
                (state.backoff.next_backoff(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff_states: {}, using default backoff", e);
                (MIN_BACKOFF, 1)
            }
        }
    }

    fn reset_error(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(resource_key);
        }
    }
}
