//! Garage Admin API client
//!
//! Implements the Garage Admin API v1 for buckets, keys and bucket permissions.

use crate::common::HttpClient;
use crate::error::GarageError;
use crate::garage_trait::GarageClientTrait;
use crate::models::*;
use crate::operation;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Default upper bound for one Admin API call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const API_PREFIX: &str = "/v1";

/// Garage Admin API client
#[derive(Debug, Clone)]
pub struct GarageClient {
    http: HttpClient,
}

impl GarageClient {
    /// Create a new Garage client with the default 30s request timeout
    ///
    /// # Arguments
    /// * `endpoint` - Admin API endpoint (e.g., "http://garage:3903")
    /// * `admin_token` - Admin API bearer token
    pub fn new(endpoint: String, admin_token: String) -> Result<Self, GarageError> {
        Self::with_timeout(endpoint, admin_token, DEFAULT_TIMEOUT)
    }

    /// Create a new Garage client with an explicit request timeout
    pub fn with_timeout(
        endpoint: String,
        admin_token: String,
        timeout: Duration,
    ) -> Result<Self, GarageError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| GarageError::Http {
                operation: "buildClient",
                source,
            })?;

        Ok(Self {
            http: HttpClient::new(client, endpoint, admin_token),
        })
    }

    fn path(resource: &str, filters: &[(&str, &str)]) -> String {
        if filters.is_empty() {
            format!("{API_PREFIX}{resource}")
        } else {
            format!("{API_PREFIX}{resource}?{}", HttpClient::build_query_string(filters))
        }
    }

    fn to_body<T: serde::Serialize>(
        operation: &'static str,
        request: &T,
    ) -> Result<serde_json::Value, GarageError> {
        serde_json::to_value(request).map_err(|source| GarageError::Serialization { operation, source })
    }
}

#[async_trait::async_trait]
impl GarageClientTrait for GarageClient {
    fn base_url(&self) -> &str {
        self.http.base_url()
    }

    /// Validate the admin token by making a lightweight authenticated request.
    ///
    /// # Returns
    /// * `Ok(())` - Token is valid and Garage is reachable
    /// * `Err(GarageError)` - Token is invalid or Garage is unreachable
    async fn validate_token(&self) -> Result<(), GarageError> {
        debug!("Validating Garage admin token and connectivity");
        match self
            .http
            .execute(operation::VALIDATE_TOKEN, reqwest::Method::GET, &Self::path("/status", &[]), None)
            .await
        {
            Ok(_) => {
                debug!("Token validated successfully");
                Ok(())
            }
            Err(GarageError::Api { status, body, .. })
                if status == StatusCode::UNAUTHORIZED.as_u16() || status == StatusCode::FORBIDDEN.as_u16() =>
            {
                Err(GarageError::Authentication(format!("{status} - {body}")))
            }
            Err(e) => Err(e),
        }
    }

    async fn create_bucket(&self, request: &CreateBucketRequest) -> Result<Bucket, GarageError> {
        let body = Self::to_body(operation::CREATE_BUCKET, request)?;
        self.http
            .post(operation::CREATE_BUCKET, &Self::path("/bucket", &[]), &body)
            .await
    }

    async fn get_bucket(&self, id: &str) -> Result<Bucket, GarageError> {
        self.http
            .get(operation::GET_BUCKET_BY_ID, &Self::path("/bucket", &[("id", id)]))
            .await
    }

    async fn get_bucket_by_alias(&self, global_alias: &str) -> Result<Bucket, GarageError> {
        self.http
            .get(
                operation::GET_BUCKET_BY_ALIAS,
                &Self::path("/bucket", &[("globalAlias", global_alias)]),
            )
            .await
    }

    async fn update_bucket(&self, request: &UpdateBucketRequest) -> Result<Bucket, GarageError> {
        let body = Self::to_body(operation::UPDATE_BUCKET, request)?;
        self.http
            .put(operation::UPDATE_BUCKET, &Self::path("/bucket", &[]), &body)
            .await
    }

    async fn delete_bucket(&self, id: &str) -> Result<(), GarageError> {
        self.http
            .delete(operation::DELETE_BUCKET, &Self::path("/bucket", &[("id", id)]))
            .await
    }

    async fn create_key(&self, request: &CreateKeyRequest) -> Result<Key, GarageError> {
        let body = Self::to_body(operation::CREATE_KEY, request)?;
        self.http
            .post(operation::CREATE_KEY, &Self::path("/key", &[]), &body)
            .await
    }

    async fn get_key(&self, access_key_id: &str) -> Result<Key, GarageError> {
        self.http
            .get(operation::GET_KEY_BY_ID, &Self::path("/key", &[("id", access_key_id)]))
            .await
    }

    async fn search_keys(&self, pattern: &str) -> Result<Vec<KeyInfo>, GarageError> {
        self.http
            .get(operation::SEARCH_KEYS, &Self::path("/key", &[("search", pattern)]))
            .await
    }

    async fn update_key(&self, request: &UpdateKeyRequest) -> Result<Key, GarageError> {
        let body = Self::to_body(operation::UPDATE_KEY, request)?;
        self.http
            .put(operation::UPDATE_KEY, &Self::path("/key", &[]), &body)
            .await
    }

    async fn delete_key(&self, access_key_id: &str) -> Result<(), GarageError> {
        self.http
            .delete(operation::DELETE_KEY, &Self::path("/key", &[("id", access_key_id)]))
            .await
    }

    async fn grant_access(&self, request: &BucketAccessRequest) -> Result<Bucket, GarageError> {
        let body = Self::to_body(operation::GRANT_ACCESS, request)?;
        self.http
            .post(operation::GRANT_ACCESS, &Self::path("/bucket/allow", &[]), &body)
            .await
    }

    async fn revoke_access(&self, request: &BucketAccessRequest) -> Result<Bucket, GarageError> {
        let body = Self::to_body(operation::REVOKE_ACCESS, request)?;
        self.http
            .post(operation::REVOKE_ACCESS, &Self::path("/bucket/deny", &[]), &body)
            .await
    }
}
