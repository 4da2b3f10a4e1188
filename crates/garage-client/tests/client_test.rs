//! HTTP behaviour of GarageClient against a local mock server

use garage_client::{
    BucketAccessRequest, CreateBucketRequest, CreateKeyRequest, GarageClient, GarageClientTrait,
    GarageError, Permissions, UpdateBucketRequest, BucketQuotas,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> GarageClient {
    GarageClient::new(server.uri(), "test-token".to_string()).expect("client should build")
}

#[tokio::test]
async fn test_get_bucket_by_alias_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/bucket"))
        .and(query_param("globalAlias", "test-bucket"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "bucket-123",
            "globalAliases": ["test-bucket"],
            "keys": []
        })))
        .mount(&server)
        .await;

    let bucket = client_for(&server)
        .get_bucket_by_alias("test-bucket")
        .await
        .expect("lookup should succeed");
    assert_eq!(bucket.id, "bucket-123");
    assert_eq!(bucket.global_aliases, vec!["test-bucket".to_string()]);
}

#[tokio::test]
async fn test_create_bucket_posts_only_declared_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/bucket"))
        .and(body_json(json!({"globalAlias": "photos"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "b-1",
            "globalAliases": ["photos"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bucket = client_for(&server)
        .create_bucket(&CreateBucketRequest {
            global_alias: Some("photos".to_string()),
            local_alias: None,
        })
        .await
        .expect("create should succeed");
    assert_eq!(bucket.id, "b-1");
}

#[tokio::test]
async fn test_not_found_maps_to_not_found_with_operation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/key"))
        .and(query_param("id", "GK-missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Key not found"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .get_key("GK-missing")
        .await
        .expect_err("missing key should fail");
    assert!(err.is_not_found());
    assert_eq!(err.operation(), Some("getKeyByID"));
}

#[tokio::test]
async fn test_non_2xx_keeps_body_as_opaque_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/key"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal <b>oops</b>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .create_key(&CreateKeyRequest { name: "app".to_string() })
        .await
        .expect_err("server error should fail");
    match err {
        GarageError::Api { operation, status, body } => {
            assert_eq!(operation, "createKey");
            assert_eq!(status, 500);
            assert_eq!(body, "internal <b>oops</b>");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_delete_with_empty_body_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/bucket"))
        .and(query_param("id", "b-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .delete_bucket("b-1")
        .await
        .expect("empty 2xx is success");
}

#[tokio::test]
async fn test_search_key_by_name_filters_partial_matches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/key"))
        .and(query_param("search", "app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "GK-partial", "name": "app-old"},
            {"id": "GK-exact", "name": "app"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/key"))
        .and(query_param("id", "GK-exact"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "accessKeyId": "GK-exact",
            "name": "app",
            "permissions": {"createBucket": false},
            "buckets": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let key = client_for(&server)
        .search_key_by_name("app")
        .await
        .expect("search should succeed")
        .expect("exact match present");
    assert_eq!(key.access_key_id, "GK-exact");
    assert!(key.secret_access_key.is_none());
}

#[tokio::test]
async fn test_grant_and_revoke_use_allow_and_deny() {
    let server = MockServer::start().await;
    let bucket_body = json!({"id": "b-1", "globalAliases": [], "keys": []});
    Mock::given(method("POST"))
        .and(path("/v1/bucket/allow"))
        .and(body_json(json!({
            "bucketId": "b-1",
            "accessKeyId": "GK1",
            "permissions": {"read": true, "write": false, "owner": false}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(bucket_body.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/bucket/deny"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bucket_body))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    client
        .grant_access(&BucketAccessRequest {
            bucket_id: "b-1".to_string(),
            access_key_id: "GK1".to_string(),
            permissions: Permissions { read: true, write: false, owner: false },
        })
        .await
        .expect("grant");
    client
        .revoke_access(&BucketAccessRequest {
            bucket_id: "b-1".to_string(),
            access_key_id: "GK1".to_string(),
            permissions: Permissions::all(),
        })
        .await
        .expect("revoke");
}

#[tokio::test]
async fn test_update_bucket_puts_quotas() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/bucket"))
        .and(body_json(json!({"id": "b-1", "quotas": {"maxObjects": 10}})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "b-1",
            "globalAliases": [],
            "quotas": {"maxObjects": 10}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let bucket = client_for(&server)
        .update_bucket(&UpdateBucketRequest {
            id: "b-1".to_string(),
            quotas: Some(BucketQuotas { max_size: None, max_objects: Some(10) }),
        })
        .await
        .expect("update");
    assert_eq!(bucket.quotas.and_then(|q| q.max_objects), Some(10));
}

#[tokio::test]
async fn test_validate_token_rejects_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/status"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .validate_token()
        .await
        .expect_err("bad token should fail");
    assert!(matches!(err, GarageError::Authentication(_)));
}

#[tokio::test]
async fn test_request_timeout_is_bounded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/bucket"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let client = GarageClient::with_timeout(server.uri(), "t".to_string(), Duration::from_millis(100))
        .expect("client should build");
    let err = client.get_bucket("slow").await.expect_err("should time out");
    assert!(matches!(err, GarageError::Http { operation: "getBucketByID", .. }));
}
