//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the reconcile
//! engine to Kubernetes and Garage and runs one watcher per resource kind:
//! - GarageBucket: buckets, found by ID or global alias
//! - GarageKey: access keys, whose secret is published once on creation
//! - GarageKeyAccess: bucket permissions for a key (references the other two)

use crate::config::ControllerConfig;
use crate::connection::SecretPublisher;
use crate::connector::GarageConnector;
use crate::error::ControllerError;
use crate::reconciler::{Engine, Reconciler};
use crate::store::{KubeStore, ResourceStore};
use crate::watcher::Watcher;
use garage_client::{GarageClient, GarageClientTrait};
use kube::Client;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Main controller for Garage resource management.
pub struct Controller {
    bucket_watcher: JoinHandle<Result<(), ControllerError>>,
    key_watcher: JoinHandle<Result<(), ControllerError>>,
    key_access_watcher: JoinHandle<Result<(), ControllerError>>,
}

impl Controller {
    /// Creates a new controller instance and starts its watchers.
    pub async fn new(config: ControllerConfig) -> Result<Self, ControllerError> {
        info!("Initializing Garage Controller");

        let kube_client = Client::try_default().await?;

        // Validate token and connectivity before proceeding
        info!("Validating Garage admin token and connectivity...");
        let garage = GarageClient::with_timeout(
            config.garage.endpoint.clone(),
            config.garage.admin_token.clone(),
            config.garage.request_timeout,
        )?;
        garage.validate_token().await.map_err(|e| {
            error!("Failed to validate Garage admin token: {}", e);
            error!("Please ensure:");
            error!("  1. GARAGE_ADMIN_TOKEN environment variable is set correctly");
            error!("  2. The token is valid for the Garage Admin API");
            error!("  3. Garage is reachable at {}", config.garage.endpoint);
            ControllerError::Garage(e)
        })?;
        info!("Garage admin token validated and connectivity established");

        let store: Arc<dyn ResourceStore> = Arc::new(KubeStore::new(kube_client.clone()));
        let engine = Engine::new(
            Arc::new(GarageConnector::new(config.garage.clone(), Arc::clone(&store))),
            store,
            Arc::new(SecretPublisher::new(kube_client.clone())),
        );
        let reconciler = Arc::new(Reconciler::new(engine, config.poll_interval));

        let watcher_instance = Arc::new(Watcher::new(
            reconciler,
            kube_client,
            config.namespace.as_deref(),
            config.max_concurrent_reconciles,
        ));

        // Start all watchers in background tasks
        let bucket_watcher = {
            let watcher = watcher_instance.clone();
            tokio::spawn(async move { watcher.watch_buckets().await })
        };
        let key_watcher = {
            let watcher = watcher_instance.clone();
            tokio::spawn(async move { watcher.watch_keys().await })
        };
        let key_access_watcher = {
            let watcher = watcher_instance;
            tokio::spawn(async move { watcher.watch_key_accesses().await })
        };

        Ok(Self {
            bucket_watcher,
            key_watcher,
            key_access_watcher,
        })
    }

    /// Runs until any watcher exits.
    pub async fn run(mut self) -> Result<(), ControllerError> {
        info!("Garage Controller running");

        // Watchers should run forever
        tokio::select! {
            result = &mut self.bucket_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("GarageBucket watcher panicked: {}", e)))??;
            }
            result = &mut self.key_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("GarageKey watcher panicked: {}", e)))??;
            }
            result = &mut self.key_access_watcher => {
                result.map_err(|e| ControllerError::Watch(format!("GarageKeyAccess watcher panicked: {}", e)))??;
            }
        }

        error!("A watcher exited; shutting down");
        Err(ControllerError::Watch("watcher exited unexpectedly".to_string()))
    }
}
