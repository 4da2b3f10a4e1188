//! Unit tests for the reconcile cycle

#[cfg(test)]
mod tests {
    use crate::error::ReconcileError;
    use crate::managed::ManagedResource;
    use crate::reconciler::ReconcileOutcome;
    use crate::reconciler::key::{ACCESS_KEY_ID, SECRET_ACCESS_KEY};
    use crate::test_utils::*;
    use crds::{DeletionPolicy, FINALIZER, GarageBucketStatus, GarageKeyAccessSpec, GarageKeyStatus, ResourceReference};
    use garage_client::{Bucket, Key, operation};

    fn condition_reason(status: &serde_json::Value, r#type: &str) -> Option<String> {
        status["conditions"]
            .as_array()?
            .iter()
            .find(|c| c["type"] == r#type)
            .and_then(|c| c["reason"].as_str())
            .map(str::to_string)
    }

    /// The resource as the next cycle would see it after this one's writes
    fn persisted(mut mr: ManagedResource, store: &InMemoryStore) -> ManagedResource {
        let status = store.last_status().expect("status written");
        match &mut mr {
            ManagedResource::Bucket(b) => {
                b.status = Some(serde_json::from_value::<GarageBucketStatus>(status).expect("bucket status"));
            }
            ManagedResource::Key(k) => {
                k.status = Some(serde_json::from_value::<GarageKeyStatus>(status).expect("key status"));
            }
            ManagedResource::KeyAccess(_) => unreachable!("not used for key access"),
        }
        if let Some(Some(hint)) = store.external_names().last() {
            mr.set_external_name(hint.clone());
        }
        mr.add_finalizer();
        mr
    }

    #[tokio::test]
    async fn test_existing_bucket_is_adopted_by_alias() {
        let harness = TestHarness::new();
        harness.garage.add_bucket(Bucket {
            id: "bucket-123".to_string(),
            global_aliases: vec!["test-bucket".to_string()],
            ..Default::default()
        });

        let outcome = harness
            .engine
            .reconcile(bucket_resource("test-bucket", Some("test-bucket")))
            .await
            .expect("reconcile");

        assert_eq!(outcome, ReconcileOutcome::UpToDate);
        let status = harness.store.last_status().expect("status");
        assert_eq!(status["id"], "bucket-123");
        assert_eq!(condition_reason(&status, "Ready").as_deref(), Some("Available"));
        assert_eq!(condition_reason(&status, "Synced").as_deref(), Some("ReconcileSuccess"));
        assert_eq!(harness.store.finalizer_writes(), vec![vec![FINALIZER.to_string()]]);
        assert_eq!(harness.store.external_names(), vec![Some("test-bucket".to_string())]);
        assert_eq!(harness.garage.call_count(operation::CREATE_BUCKET), 0);
    }

    #[tokio::test]
    async fn test_missing_bucket_is_created() {
        let harness = TestHarness::new();

        let outcome = harness
            .engine
            .reconcile(bucket_resource("photos", Some("photos")))
            .await
            .expect("reconcile");

        assert_eq!(outcome, ReconcileOutcome::Created);
        assert_eq!(harness.garage.bucket_count(), 1);
        assert!(harness.publisher.published().is_empty());
        let status = harness.store.last_status().expect("status");
        assert!(status["id"].is_string());
        assert_eq!(condition_reason(&status, "Ready").as_deref(), Some("Creating"));
    }

    #[tokio::test]
    async fn test_unchanged_status_is_not_rewritten() {
        let harness = TestHarness::new();
        harness.garage.add_bucket(Bucket {
            id: "b1".to_string(),
            global_aliases: vec!["photos".to_string()],
            ..Default::default()
        });

        let mr = bucket_resource("photos", Some("photos"));
        harness.engine.reconcile(mr.clone()).await.expect("first cycle");
        let writes = harness.store.status_patches().len();

        let next = persisted(mr, &harness.store);
        let outcome = harness.engine.reconcile(next).await.expect("second cycle");

        assert_eq!(outcome, ReconcileOutcome::UpToDate);
        assert_eq!(harness.store.status_patches().len(), writes);
        assert_eq!(harness.store.finalizer_writes().len(), 1);
    }

    #[tokio::test]
    async fn test_key_secret_is_published_only_on_create() {
        let harness = TestHarness::new();
        let mr = key_resource("app", "app");

        let outcome = harness.engine.reconcile(mr.clone()).await.expect("create cycle");
        assert_eq!(outcome, ReconcileOutcome::Created);

        let published = harness.publisher.published();
        assert_eq!(published.len(), 1);
        let details = &published[0].1;
        let access_key_id = String::from_utf8(details[ACCESS_KEY_ID].clone()).expect("utf8");
        assert!(!details[SECRET_ACCESS_KEY].is_empty());
        assert_eq!(harness.store.external_names().last(), Some(&Some(access_key_id.clone())));

        let next = persisted(mr, &harness.store);
        let outcome = harness.engine.reconcile(next).await.expect("observe cycle");
        assert_eq!(outcome, ReconcileOutcome::UpToDate);
        assert_eq!(harness.publisher.published().len(), 1);
        assert_eq!(harness.garage.call_count(operation::CREATE_KEY), 1);
    }

    #[tokio::test]
    async fn test_lost_hint_write_does_not_duplicate_key() {
        let harness = TestHarness::new();
        let mut mr = key_resource("app", "app");
        mr.set_external_name("app");
        mr.add_finalizer();

        // Create succeeds, then recording the identity fails
        harness.store.fail_external_name_writes(true);
        let err = harness.engine.reconcile(mr.clone()).await.expect_err("hint write fails");
        assert!(!err.is_dependency_not_ready());
        assert_eq!(harness.garage.key_count(), 1);

        // Next cycle starts from the same stale record
        harness.store.fail_external_name_writes(false);
        let outcome = harness.engine.reconcile(mr).await.expect("recovery cycle");

        assert_eq!(outcome, ReconcileOutcome::UpToDate);
        assert_eq!(harness.garage.key_count(), 1);
        assert_eq!(harness.garage.call_count(operation::CREATE_KEY), 1);
        let adopted = harness.store.external_names().last().cloned().flatten().expect("hint re-armed");
        assert!(adopted.starts_with("GK"));
    }

    #[tokio::test]
    async fn test_unready_reference_waits_without_error() {
        let harness = TestHarness::new();
        harness.store.put_bucket(bucket_record("photos", "default", None));

        let mr = key_access_resource(
            "app-photos",
            GarageKeyAccessSpec {
                bucket_id_ref: Some(ResourceReference::new("photos")),
                access_key_id: Some("GK1".to_string()),
                permissions: permissions(true, false, false),
                ..Default::default()
            },
        );
        let outcome = harness.engine.reconcile(mr).await.expect("not an error");

        assert_eq!(outcome, ReconcileOutcome::WaitingForReferences);
        let status = harness.store.last_status().expect("status");
        assert_eq!(condition_reason(&status, "Synced").as_deref(), Some("ReferencesNotReady"));
        assert_eq!(condition_reason(&status, "Ready").as_deref(), Some("Unavailable"));
        assert!(harness.garage.calls().is_empty());
    }

    #[tokio::test]
    async fn test_key_access_without_bucket_does_not_grant_on_previous_bucket() {
        let harness = TestHarness::new();
        harness.garage.add_key(Key {
            access_key_id: "GK1".to_string(),
            name: "app".to_string(),
            ..Default::default()
        });
        harness.garage.add_bucket(Bucket {
            id: "b1".to_string(),
            ..Default::default()
        });

        let mut mr = key_access_resource(
            "app-photos",
            GarageKeyAccessSpec {
                access_key_id: Some("GK1".to_string()),
                permissions: permissions(true, false, false),
                ..Default::default()
            },
        );
        if let ManagedResource::KeyAccess(ka) = &mut mr {
            ka.status = Some(crds::GarageKeyAccessStatus {
                bucket_id: Some("b1".to_string()),
                access_key_id: Some("GK1".to_string()),
                ..Default::default()
            });
        }

        let err = harness.engine.reconcile(mr).await.expect_err("bucket is required");
        assert!(matches!(err, ReconcileError::InvalidSpec(_)));
        assert_eq!(harness.garage.call_count(operation::GRANT_ACCESS), 0);
        let bucket = harness.garage.bucket("b1").expect("bucket");
        assert!(bucket.keys.is_empty());
        let status = harness.store.last_status().expect("status");
        assert!(status["bucketId"].is_null());
    }

    #[tokio::test]
    async fn test_external_failure_is_recorded_and_returned() {
        let harness = TestHarness::new();
        harness.garage.fail_operation(operation::GET_BUCKET_BY_ALIAS, 500);

        let err = harness
            .engine
            .reconcile(bucket_resource("photos", Some("photos")))
            .await
            .expect_err("500 surfaces");

        assert!(matches!(err, ReconcileError::External { .. }));
        let status = harness.store.last_status().expect("status");
        assert_eq!(condition_reason(&status, "Synced").as_deref(), Some("ReconcileError"));
        assert_eq!(harness.garage.call_count(operation::CREATE_BUCKET), 0);
    }

    #[tokio::test]
    async fn test_delete_then_release_finalizer() {
        let harness = TestHarness::new();
        harness.garage.add_key(Key {
            access_key_id: "GK1".to_string(),
            name: "app".to_string(),
            ..Default::default()
        });

        let mut mr = key_resource("app", "app");
        mr.set_external_name("GK1");
        mr.add_finalizer();
        mark_deleted(&mut mr);

        let outcome = harness.engine.reconcile(mr.clone()).await.expect("delete cycle");
        assert_eq!(outcome, ReconcileOutcome::Deleting);
        assert_eq!(harness.garage.key_count(), 0);
        assert!(harness.store.finalizer_writes().is_empty());

        let outcome = harness.engine.reconcile(mr).await.expect("confirm cycle");
        assert_eq!(outcome, ReconcileOutcome::Deleted);
        assert_eq!(harness.store.finalizer_writes(), vec![Vec::<String>::new()]);
    }

    #[tokio::test]
    async fn test_orphan_policy_leaves_external_object() {
        let harness = TestHarness::new();
        harness.garage.add_bucket(Bucket {
            id: "b1".to_string(),
            global_aliases: vec!["photos".to_string()],
            ..Default::default()
        });

        let mut mr = bucket_resource("photos", Some("photos"));
        if let ManagedResource::Bucket(b) = &mut mr {
            b.spec.deletion_policy = DeletionPolicy::Orphan;
        }
        mr.add_finalizer();
        mark_deleted(&mut mr);

        let outcome = harness.engine.reconcile(mr).await.expect("orphan");
        assert_eq!(outcome, ReconcileOutcome::Orphaned);
        assert!(harness.garage.calls().is_empty());
        assert_eq!(harness.garage.bucket_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_without_finalizer_is_done() {
        let harness = TestHarness::new();
        let mut mr = bucket_resource("photos", Some("photos"));
        mark_deleted(&mut mr);

        let outcome = harness.engine.reconcile(mr).await.expect("nothing to do");
        assert_eq!(outcome, ReconcileOutcome::Deleted);
        assert!(harness.garage.calls().is_empty());
    }

    #[tokio::test]
    async fn test_key_access_deleted_after_referent_is_gone() {
        let harness = TestHarness::new();
        harness.garage.add_key(Key {
            access_key_id: "GK1".to_string(),
            name: "app".to_string(),
            ..Default::default()
        });
        harness.garage.add_bucket(Bucket {
            id: "b1".to_string(),
            ..Default::default()
        });

        let mut mr = key_access_resource(
            "app-photos",
            GarageKeyAccessSpec {
                bucket_id_ref: Some(ResourceReference::new("photos")),
                access_key_id: Some("GK1".to_string()),
                permissions: permissions(true, false, false),
                ..Default::default()
            },
        );
        if let ManagedResource::KeyAccess(ka) = &mut mr {
            ka.status = Some(crds::GarageKeyAccessStatus {
                bucket_id: Some("b1".to_string()),
                access_key_id: Some("GK1".to_string()),
                permissions: Some(permissions(true, false, false)),
                ..Default::default()
            });
        }
        mr.add_finalizer();
        mark_deleted(&mut mr);

        let outcome = harness.engine.reconcile(mr).await.expect("delete by observed ids");
        assert_eq!(outcome, ReconcileOutcome::Deleted);
        assert_eq!(harness.garage.call_count(operation::REVOKE_ACCESS), 1);
        assert_eq!(harness.store.finalizer_writes(), vec![Vec::<String>::new()]);
    }

    #[tokio::test]
    async fn test_every_kind_deletes_idempotently_without_identity() {
        let harness = TestHarness::new();
        let resources = vec![
            bucket_resource("photos", Some("photos")),
            key_resource("app", "app"),
            key_access_resource("app-photos", GarageKeyAccessSpec::default()),
        ];

        for mr in resources {
            let external = harness.external(mr.kind());
            let mut mr = mr;
            external.delete(&mut mr).await.expect("delete");
        }
        assert!(harness.garage.calls().is_empty());
    }
}
