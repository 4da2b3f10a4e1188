//! Mock GarageClient for unit testing
//!
//! This module provides an in-memory implementation of GarageClientTrait that can be used
//! in unit tests without requiring a running Garage cluster.
//!
//! The mock is organized into domain-specific modules:
//! - `bucket.rs` - bucket operations and permission grants
//! - `key.rs` - access key operations
//!
//! Like the real Admin API, reads never return a key's secret.

mod bucket;
mod key;

use crate::error::GarageError;
use crate::models::*;
use crate::garage_trait::GarageClientTrait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mock GarageClient for testing
///
/// Stores buckets and keys in memory, records every call by operation name,
/// and can be told to fail specific operations.
#[derive(Debug, Clone)]
pub struct MockGarageClient {
    pub(crate) base_url: String,
    pub(crate) buckets: Arc<Mutex<HashMap<String, Bucket>>>,
    pub(crate) keys: Arc<Mutex<HashMap<String, Key>>>,
    calls: Arc<Mutex<Vec<&'static str>>>,
    failures: Arc<Mutex<HashMap<&'static str, u16>>>,
    next_id: Arc<Mutex<u64>>,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockGarageClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            buckets: Arc::new(Mutex::new(HashMap::new())),
            keys: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(1)),
        }
    }

    /// Add a bucket to the mock store (for test setup)
    pub fn add_bucket(&self, bucket: Bucket) {
        lock(&self.buckets).insert(bucket.id.clone(), bucket);
    }

    /// Add a key to the mock store (for test setup). Any secret is dropped.
    pub fn add_key(&self, mut key: Key) {
        key.secret_access_key = None;
        lock(&self.keys).insert(key.access_key_id.clone(), key);
    }

    /// Stored bucket, if present
    pub fn bucket(&self, id: &str) -> Option<Bucket> {
        lock(&self.buckets).get(id).cloned()
    }

    /// Stored key, if present
    pub fn key(&self, access_key_id: &str) -> Option<Key> {
        lock(&self.keys).get(access_key_id).cloned()
    }

    /// Number of stored buckets
    pub fn bucket_count(&self) -> usize {
        lock(&self.buckets).len()
    }

    /// Number of stored keys
    pub fn key_count(&self) -> usize {
        lock(&self.keys).len()
    }

    /// Make every future call to `operation` fail with `status` (404 yields `NotFound`)
    pub fn fail_operation(&self, operation: &'static str, status: u16) {
        lock(&self.failures).insert(operation, status);
    }

    /// Stop failing `operation`
    pub fn clear_failure(&self, operation: &'static str) {
        lock(&self.failures).remove(operation);
    }

    /// Operation names called so far, in order
    pub fn calls(&self) -> Vec<&'static str> {
        lock(&self.calls).clone()
    }

    /// How many times `operation` was called
    pub fn call_count(&self, operation: &str) -> usize {
        lock(&self.calls).iter().filter(|c| **c == operation).count()
    }

    /// Forget recorded calls
    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
    }

    /// Record a call and return the injected failure, if any
    pub(crate) fn record(&self, operation: &'static str) -> Result<(), GarageError> {
        lock(&self.calls).push(operation);
        match lock(&self.failures).get(operation) {
            None => Ok(()),
            Some(404) => Err(GarageError::NotFound {
                operation,
                body: "injected not found".to_string(),
            }),
            Some(status) => Err(GarageError::Api {
                operation,
                status: *status,
                body: "injected failure".to_string(),
            }),
        }
    }

    /// Generate next ID
    pub(crate) fn next_id(&self) -> u64 {
        let mut id = lock(&self.next_id);
        let current = *id;
        *id += 1;
        current
    }
}

#[async_trait::async_trait]
impl GarageClientTrait for MockGarageClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn validate_token(&self) -> Result<(), GarageError> {
        self.record(crate::operation::VALIDATE_TOKEN)
    }

    // Bucket operations - delegated to bucket module
    async fn create_bucket(&self, request: &CreateBucketRequest) -> Result<Bucket, GarageError> {
        bucket::create_bucket(self, request)
    }

    async fn get_bucket(&self, id: &str) -> Result<Bucket, GarageError> {
        bucket::get_bucket(self, id)
    }

    async fn get_bucket_by_alias(&self, global_alias: &str) -> Result<Bucket, GarageError> {
        bucket::get_bucket_by_alias(self, global_alias)
    }

    async fn update_bucket(&self, request: &UpdateBucketRequest) -> Result<Bucket, GarageError> {
        bucket::update_bucket(self, request)
    }

    async fn delete_bucket(&self, id: &str) -> Result<(), GarageError> {
        bucket::delete_bucket(self, id)
    }

    async fn grant_access(&self, request: &BucketAccessRequest) -> Result<Bucket, GarageError> {
        bucket::grant_access(self, request)
    }

    async fn revoke_access(&self, request: &BucketAccessRequest) -> Result<Bucket, GarageError> {
        bucket::revoke_access(self, request)
    }

    // Key operations - delegated to key module
    async fn create_key(&self, request: &CreateKeyRequest) -> Result<Key, GarageError> {
        key::create_key(self, request)
    }

    async fn get_key(&self, access_key_id: &str) -> Result<Key, GarageError> {
        key::get_key(self, access_key_id)
    }

    async fn search_keys(&self, pattern: &str) -> Result<Vec<KeyInfo>, GarageError> {
        key::search_keys(self, pattern)
    }

    async fn update_key(&self, request: &UpdateKeyRequest) -> Result<Key, GarageError> {
        key::update_key(self, request)
    }

    async fn delete_key(&self, access_key_id: &str) -> Result<(), GarageError> {
        key::delete_key(self, access_key_id)
    }
}
