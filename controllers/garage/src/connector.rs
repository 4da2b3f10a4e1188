//! Per-cycle Garage connection.
//!
//! A fresh `GarageClient` is built for every reconcile cycle from the
//! configured endpoint and admin token.

use crate::config::GarageSettings;
use crate::error::ReconcileError;
use crate::managed::{Connector, ExternalClient, ManagedResource};
use crate::reconciler::external_for;
use crate::store::ResourceStore;
use garage_client::{GarageClient, GarageClientTrait};
use std::sync::Arc;

/// Builds kind-specific external clients on top of a fresh Garage client
pub struct GarageConnector {
    settings: GarageSettings,
    store: Arc<dyn ResourceStore>,
}

impl GarageConnector {
    pub fn new(settings: GarageSettings, store: Arc<dyn ResourceStore>) -> Self {
        Self { settings, store }
    }

    fn client(&self) -> Result<GarageClient, ReconcileError> {
        if self.settings.endpoint.trim().is_empty() {
            return Err(ReconcileError::Connect("Garage endpoint is not configured".to_string()));
        }
        if self.settings.admin_token.is_empty() {
            return Err(ReconcileError::Connect("Garage admin token is not configured".to_string()));
        }
        GarageClient::with_timeout(
            self.settings.endpoint.clone(),
            self.settings.admin_token.clone(),
            self.settings.request_timeout,
        )
        .map_err(|e| ReconcileError::Connect(e.to_string()))
    }
}

#[async_trait::async_trait]
impl Connector for GarageConnector {
    async fn connect(&self, mr: &ManagedResource) -> Result<Box<dyn ExternalClient>, ReconcileError> {
        let client: Arc<dyn GarageClientTrait> = Arc::new(self.client()?);
        Ok(external_for(mr.kind(), client, Arc::clone(&self.store)))
    }
}
