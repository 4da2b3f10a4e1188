//! The reconcile cycle shared by every resource kind.
//!
//! One call to [`Engine::reconcile`] runs Observe and then at most one of
//! Create, Update or Delete against Garage, records conditions and persists
//! whatever changed. The engine keeps no state between cycles and never
//! retries internally; the caller's scheduler owns retry timing.

use crate::connection::ConnectionPublisher;
use crate::error::ReconcileError;
use crate::managed::{ConnectionDetails, Connector, ManagedResource};
use crate::store::ResourceStore;
use crds::{Condition, DeletionPolicy};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What a successful cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// External object was created
    Created,
    /// External object was brought up to date
    Updated,
    /// Nothing to do
    UpToDate,
    /// Delete was issued; absence is confirmed on a later cycle
    Deleting,
    /// External object is gone and the finalizer was removed
    Deleted,
    /// Deletion policy is Orphan; finalizer removed without touching Garage
    Orphaned,
    /// A referenced resource has not converged yet
    WaitingForReferences,
}

/// Mutable state of one cycle: the resource and the status last persisted
struct Cycle {
    resource: ManagedResource,
    persisted_status: serde_json::Value,
}

/// Drives one resource toward its declared state
pub struct Engine {
    connector: Arc<dyn Connector>,
    store: Arc<dyn ResourceStore>,
    publisher: Arc<dyn ConnectionPublisher>,
}

impl Engine {
    pub fn new(
        connector: Arc<dyn Connector>,
        store: Arc<dyn ResourceStore>,
        publisher: Arc<dyn ConnectionPublisher>,
    ) -> Self {
        Self {
            connector,
            store,
            publisher,
        }
    }

    /// Run one reconcile cycle for `resource`.
    ///
    /// Dependency-not-ready failures are folded into
    /// `Ok(WaitingForReferences)`; any other failure is recorded on the
    /// `Synced` condition and returned.
    pub async fn reconcile(&self, resource: ManagedResource) -> Result<ReconcileOutcome, ReconcileError> {
        let persisted_status = resource.status_patch();
        let mut cycle = Cycle {
            resource,
            persisted_status,
        };

        match self.run(&mut cycle).await {
            Ok(outcome @ (ReconcileOutcome::Deleted | ReconcileOutcome::Orphaned)) => Ok(outcome),
            Ok(outcome) => {
                self.persist_status(&mut cycle).await?;
                Ok(outcome)
            }
            Err(e) if e.is_dependency_not_ready() => {
                debug!("{} waiting for references: {}", cycle.resource.key(), e);
                cycle.resource.set_condition(Condition::unavailable());
                cycle.resource.set_condition(Condition::references_not_ready(e.to_string()));
                self.persist_status(&mut cycle).await?;
                Ok(ReconcileOutcome::WaitingForReferences)
            }
            Err(e) => {
                cycle.resource.set_condition(Condition::reconcile_error(e.to_string()));
                if let Err(patch_err) = self.persist_status(&mut cycle).await {
                    warn!("Failed to record error status on {}: {}", cycle.resource.key(), patch_err);
                }
                Err(e)
            }
        }
    }

    async fn run(&self, cycle: &mut Cycle) -> Result<ReconcileOutcome, ReconcileError> {
        if cycle.resource.is_being_deleted() {
            return self.finalize(cycle).await;
        }

        if cycle.resource.add_finalizer() {
            self.store.set_finalizers(&cycle.resource).await?;
        }
        if cycle.resource.external_name().is_none() {
            // metadata.name doubles as the "never set" sentinel
            let name = cycle.resource.name().to_string();
            cycle.resource.set_external_name(name);
            self.store.patch_external_name(&cycle.resource).await?;
        }

        let external = self.connector.connect(&cycle.resource).await?;

        let hint_before = cycle.resource.external_name().map(str::to_string);
        let observation = external.observe(&mut cycle.resource).await?;
        self.persist_hint_if_changed(&cycle.resource, hint_before.as_deref()).await?;

        if !observation.resource_exists {
            cycle.resource.set_condition(Condition::creating());
            let hint_before = cycle.resource.external_name().map(str::to_string);
            let creation = external.create(&mut cycle.resource).await?;
            info!("Created external resource for {}", cycle.resource.key());

            // The secret only exists in this response; hand it off first
            let details: ConnectionDetails = creation
                .connection_details
                .into_iter()
                .filter(|(_, v)| !v.is_empty())
                .collect();
            if !details.is_empty() {
                self.publisher.publish(&cycle.resource, &details).await?;
            }
            self.persist_hint_if_changed(&cycle.resource, hint_before.as_deref()).await?;

            cycle.resource.set_condition(Condition::reconcile_success());
            self.persist_status(cycle).await?;
            return Ok(ReconcileOutcome::Created);
        }

        if !observation.resource_up_to_date {
            external.update(&mut cycle.resource).await?;
            info!("Updated external resource for {}", cycle.resource.key());
            cycle.resource.set_condition(Condition::reconcile_success());
            return Ok(ReconcileOutcome::Updated);
        }

        cycle.resource.set_condition(Condition::reconcile_success());
        debug!("{} is up to date", cycle.resource.key());
        Ok(ReconcileOutcome::UpToDate)
    }

    async fn finalize(&self, cycle: &mut Cycle) -> Result<ReconcileOutcome, ReconcileError> {
        if !cycle.resource.has_finalizer() {
            return Ok(ReconcileOutcome::Deleted);
        }

        if cycle.resource.deletion_policy() == DeletionPolicy::Orphan {
            cycle.resource.remove_finalizer();
            self.store.set_finalizers(&cycle.resource).await?;
            info!("Orphaned external resource of {}", cycle.resource.key());
            return Ok(ReconcileOutcome::Orphaned);
        }

        let external = self.connector.connect(&cycle.resource).await?;
        cycle.resource.set_condition(Condition::deleting());

        match external.observe(&mut cycle.resource).await {
            Ok(observation) if observation.resource_exists => {
                external.delete(&mut cycle.resource).await?;
                info!("Deleted external resource of {}", cycle.resource.key());
                return Ok(ReconcileOutcome::Deleting);
            }
            Ok(_) => {}
            Err(e) if e.is_dependency_not_ready() => {
                // References can vanish first; fall back to what status recorded
                debug!("{}: {}; deleting by observed identifiers", cycle.resource.key(), e);
                external.delete(&mut cycle.resource).await?;
            }
            Err(e) => return Err(e),
        }

        cycle.resource.remove_finalizer();
        self.store.set_finalizers(&cycle.resource).await?;
        info!("Finalized {}", cycle.resource.key());
        Ok(ReconcileOutcome::Deleted)
    }

    async fn persist_hint_if_changed(
        &self,
        resource: &ManagedResource,
        before: Option<&str>,
    ) -> Result<(), ReconcileError> {
        if resource.external_name() != before {
            info!(
                "Recording external name {:?} on {}",
                resource.external_name(),
                resource.key()
            );
            self.store.patch_external_name(resource).await?;
        }
        Ok(())
    }

    async fn persist_status(&self, cycle: &mut Cycle) -> Result<(), ReconcileError> {
        let status = cycle.resource.status_patch();
        if status == cycle.persisted_status {
            return Ok(());
        }
        self.store.patch_status(&cycle.resource).await?;
        cycle.persisted_status = status;
        Ok(())
    }
}
