//! Garage Admin API Client
//!
//! A Rust client library for the Garage object storage Admin API (v1).
//! Provides type-safe models and methods for buckets, access keys and
//! the key-to-bucket permission grants that connect them.
//!
//! # Example
//!
//! ```no_run
//! use garage_client::{BucketAccessRequest, CreateBucketRequest, CreateKeyRequest, GarageClient, GarageClientTrait, Permissions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GarageClient::new(
//!     "http://garage:3903".to_string(),
//!     "admin-token".to_string(),
//! )?;
//!
//! let bucket = client
//!     .create_bucket(&CreateBucketRequest {
//!         global_alias: Some("backups".to_string()),
//!         local_alias: None,
//!     })
//!     .await?;
//!
//! // The secret is only ever returned here
//! let key = client.create_key(&CreateKeyRequest { name: "backup-writer".to_string() }).await?;
//!
//! client
//!     .grant_access(&BucketAccessRequest {
//!         bucket_id: bucket.id.clone(),
//!         access_key_id: key.access_key_id.clone(),
//!         permissions: Permissions { read: true, write: true, owner: false },
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Typed errors**: every failure carries the name of the operation that produced it
//! - **Bounded calls**: each request has a finite timeout (30s by default)
//! - **Mocking**: `test-util` enables an in-memory `MockGarageClient`

pub mod client;
pub mod common;
pub mod error;
pub mod models;
pub mod operation;
#[path = "trait.rs"]
pub mod garage_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::GarageClient;
pub use common::HttpClient;
pub use error::GarageError;
pub use models::*;
pub use garage_trait::GarageClientTrait;
#[cfg(feature = "test-util")]
pub use mock::MockGarageClient;
