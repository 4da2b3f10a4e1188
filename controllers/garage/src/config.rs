//! Controller configuration from environment variables.

use crate::error::ControllerError;
use std::time::Duration;

const DEFAULT_ENDPOINT: &str = "http://garage.garage:3903";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_MAX_CONCURRENT_RECONCILES: u16 = 10;

/// How to reach the Garage Admin API
#[derive(Clone)]
pub struct GarageSettings {
    pub endpoint: String,
    pub admin_token: String,
    pub request_timeout: Duration,
}

impl std::fmt::Debug for GarageSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GarageSettings")
            .field("endpoint", &self.endpoint)
            .field("admin_token", &"<redacted>")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Controller configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub garage: GarageSettings,
    /// Namespace to watch; all namespaces when unset
    pub namespace: Option<String>,
    /// Requeue interval for resources that are up to date
    pub poll_interval: Duration,
    /// Reconciles running at once per resource kind
    pub max_concurrent_reconciles: u16,
}

impl ControllerConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ControllerError> {
        let endpoint = lookup("GARAGE_ENDPOINT").unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let admin_token = lookup("GARAGE_ADMIN_TOKEN")
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ControllerError::InvalidConfig("GARAGE_ADMIN_TOKEN environment variable is required".to_string())
            })?;
        let namespace = lookup("WATCH_NAMESPACE").filter(|ns| !ns.is_empty());
        let request_timeout = seconds(&lookup, "GARAGE_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        let poll_interval = seconds(&lookup, "POLL_INTERVAL_SECS", DEFAULT_POLL_INTERVAL_SECS)?;
        let max_concurrent_reconciles =
            positive(&lookup, "MAX_CONCURRENT_RECONCILES", DEFAULT_MAX_CONCURRENT_RECONCILES)?;

        Ok(Self {
            garage: GarageSettings {
                endpoint,
                admin_token,
                request_timeout,
            },
            namespace,
            poll_interval,
            max_concurrent_reconciles,
        })
    }
}

fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: u64,
) -> Result<Duration, ControllerError> {
    positive(lookup, name, default).map(Duration::from_secs)
}

fn positive<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T, ControllerError>
where
    T: std::str::FromStr + PartialEq + From<u8>,
{
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };
    match raw.trim().parse::<T>() {
        Ok(value) if value != T::from(0) => Ok(value),
        _ => Err(ControllerError::InvalidConfig(format!(
            "{name} must be a positive integer, got {raw:?}"
        ))),
    }
}
