//! Operation names
//!
//! Every error produced by the client is tagged with one of these names so
//! callers can tell which external call failed.

/// `GET /v1/status`
pub const VALIDATE_TOKEN: &str = "validateToken";
/// `POST /v1/bucket`
pub const CREATE_BUCKET: &str = "createBucket";
/// `GET /v1/bucket?id=`
pub const GET_BUCKET_BY_ID: &str = "getBucketByID";
/// `GET /v1/bucket?globalAlias=`
pub const GET_BUCKET_BY_ALIAS: &str = "getBucketByAlias";
/// `PUT /v1/bucket`
pub const UPDATE_BUCKET: &str = "updateBucket";
/// `DELETE /v1/bucket?id=`
pub const DELETE_BUCKET: &str = "deleteBucket";
/// `POST /v1/key`
pub const CREATE_KEY: &str = "createKey";
/// `GET /v1/key?id=`
pub const GET_KEY_BY_ID: &str = "getKeyByID";
/// `GET /v1/key?search=`
pub const SEARCH_KEYS: &str = "searchKeyByName";
/// `PUT /v1/key`
pub const UPDATE_KEY: &str = "updateKey";
/// `DELETE /v1/key?id=`
pub const DELETE_KEY: &str = "deleteKey";
/// `POST /v1/bucket/allow`
pub const GRANT_ACCESS: &str = "grantAccess";
/// `POST /v1/bucket/deny`
pub const REVOKE_ACCESS: &str = "revokeAccess";
