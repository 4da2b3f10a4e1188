//! GarageClient trait for mocking
//!
//! This trait abstracts the GarageClient to enable mocking in unit tests.
//! The concrete GarageClient implements this trait, and tests can use mock implementations.

use crate::error::GarageError;
use crate::models::*;

/// Trait for Garage Admin API operations
///
/// Every call is safe to retry at the call site; the client itself never retries.
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait GarageClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Validate the admin token
    async fn validate_token(&self) -> Result<(), GarageError>;

    // Bucket operations
    async fn create_bucket(&self, request: &CreateBucketRequest) -> Result<Bucket, GarageError>;
    async fn get_bucket(&self, id: &str) -> Result<Bucket, GarageError>;
    async fn get_bucket_by_alias(&self, global_alias: &str) -> Result<Bucket, GarageError>;
    async fn update_bucket(&self, request: &UpdateBucketRequest) -> Result<Bucket, GarageError>;
    async fn delete_bucket(&self, id: &str) -> Result<(), GarageError>;

    // Key operations
    async fn create_key(&self, request: &CreateKeyRequest) -> Result<Key, GarageError>;
    async fn get_key(&self, access_key_id: &str) -> Result<Key, GarageError>;
    /// Raw listing; candidates may only partially match `pattern`
    async fn search_keys(&self, pattern: &str) -> Result<Vec<KeyInfo>, GarageError>;
    async fn update_key(&self, request: &UpdateKeyRequest) -> Result<Key, GarageError>;
    async fn delete_key(&self, access_key_id: &str) -> Result<(), GarageError>;

    // Permission edges
    async fn grant_access(&self, request: &BucketAccessRequest) -> Result<Bucket, GarageError>;
    async fn revoke_access(&self, request: &BucketAccessRequest) -> Result<Bucket, GarageError>;

    /// Find a key whose name equals `name` exactly.
    ///
    /// Returns `Ok(None)` when no candidate matches. A candidate that vanishes
    /// between the listing and the lookup is also reported as `Ok(None)`.
    async fn search_key_by_name(&self, name: &str) -> Result<Option<Key>, GarageError> {
        let candidates = self.search_keys(name).await?;
        let Some(info) = candidates.into_iter().find(|k| k.name == name) else {
            return Ok(None);
        };
        match self.get_key(&info.id).await {
            Ok(key) => Ok(Some(key)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }
}
