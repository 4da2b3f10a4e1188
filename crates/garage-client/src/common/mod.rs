//! Common utilities for the Garage API client
//!
//! Provides the authenticated request/response wrapper shared by every operation.

use crate::error::GarageError;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

/// HTTP client wrapper with bearer authentication
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpClient {
    /// Create a new HTTP client wrapper
    pub fn new(client: Client, base_url: String, token: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from a path
    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }

    /// Execute one request and return the raw response body.
    ///
    /// 404 maps to `NotFound`, any other non-2xx to `Api` with the body kept
    /// as opaque text. An empty 2xx body comes back as `None`.
    pub async fn execute(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Option<String>, GarageError> {
        let url = self.build_url(path);
        debug!("{} {} ({})", method, url, operation);

        let mut request = self
            .client
            .request(method, &url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|source| GarageError::Http { operation, source })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|source| GarageError::Http { operation, source })?;

        if status == StatusCode::NOT_FOUND {
            return Err(GarageError::NotFound { operation, body: text });
        }
        if !status.is_success() {
            return Err(GarageError::Api {
                operation,
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    async fn execute_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<T, GarageError> {
        let text = self.execute(operation, method, path, body).await?;
        serde_json::from_str(text.as_deref().unwrap_or_default())
            .map_err(|source| GarageError::Serialization { operation, source })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
    ) -> Result<T, GarageError> {
        self.execute_json(operation, Method::GET, path, None).await
    }

    /// Make a POST request
    pub async fn post<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, GarageError> {
        self.execute_json(operation, Method::POST, path, Some(body)).await
    }

    /// Make a PUT request
    pub async fn put<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, GarageError> {
        self.execute_json(operation, Method::PUT, path, Some(body)).await
    }

    /// Make a DELETE request; any 2xx, with or without body, is success
    pub async fn delete(&self, operation: &'static str, path: &str) -> Result<(), GarageError> {
        self.execute(operation, Method::DELETE, path, None).await?;
        Ok(())
    }

    /// Build query string from filters
    pub fn build_query_string(filters: &[(&str, &str)]) -> String {
        filters
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}
