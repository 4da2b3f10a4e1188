//! Garage Controller
//!
//! Reconciles Garage object storage resources declared as Kubernetes CRDs:
//! - GarageBucket: buckets with optional aliases and quotas
//! - GarageKey: access keys, with credentials written to a Secret
//! - GarageKeyAccess: per-bucket permissions for a key
//!
//! Each resource is driven toward its declared state through the Garage
//! Admin API, surviving restarts and lost status.

mod backoff;
mod config;
mod connection;
mod connector;
mod controller;
mod error;
mod managed;
mod reconciler;
mod references;
mod store;
#[cfg(test)]
mod test_utils;
mod watcher;

use crate::config::ControllerConfig;
use crate::error::ControllerError;
use controller::Controller;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), ControllerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Select the ring provider before any TLS client is built
    install_crypto_provider();

    info!("Starting Garage Controller");

    let config = ControllerConfig::from_env()?;

    info!("Configuration:");
    info!("  Garage endpoint: {}", config.garage.endpoint);
    info!("  Namespace: {}", config.namespace.as_deref().unwrap_or("all namespaces"));
    info!("  Poll interval: {}s", config.poll_interval.as_secs());
    info!("  Max concurrent reconciles: {}", config.max_concurrent_reconciles);

    let controller = Controller::new(config).await?;
    controller.run().await?;

    Ok(())
}

/// Install ring as the process-wide rustls provider. Returns false when one
/// was already installed.
fn install_crypto_provider() -> bool {
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        debug!("A rustls crypto provider is already installed; keeping it");
        return false;
    }
    true
}
