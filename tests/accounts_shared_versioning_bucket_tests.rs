use account_object_store::{
    AccountId, AccountsBucket, AccountsSharedVersioningBucket, CreateBucketOptions,
    GetObjectOptions, InMemoryS3Backend, Operation, PageCursor, PutObjectOptions, S3Error,
    StaticAccountContext, TextEncoding, S3,
};
use bytes::Bytes;
use std::sync::Arc;

const BUCKET: &str = "test-accounts-shared-versioning-bucket";

async fn setup(account: &str) -> (AccountsSharedVersioningBucket, Arc<S3>, InMemoryS3Backend) {
    let backend = InMemoryS3Backend::new();
    let s3 = Arc::new(S3::new(Arc::new(backend.clone())));
    s3.create_bucket(BUCKET, CreateBucketOptions::versioned())
        .await
        .unwrap();

    let account = StaticAccountContext::new(AccountId::new(account).unwrap());
    let bucket = AccountsSharedVersioningBucket::new(Arc::clone(&s3), Arc::new(account), BUCKET);
    (bucket, s3, backend)
}

async fn read(bucket: &AccountsSharedVersioningBucket, key: &str, options: GetObjectOptions) -> String {
    bucket
        .get_as_string(key, options, TextEncoding::Utf8)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_every_version_stays_readable() {
    let (bucket, _, _) = setup("account1").await;

    let v1 = bucket
        .put("doc.txt", Bytes::from("v1"), PutObjectOptions::default())
        .await
        .unwrap();
    let v2 = bucket
        .put("doc.txt", Bytes::from("v2"), PutObjectOptions::default())
        .await
        .unwrap();

    assert_ne!(v1.version_id(), v2.version_id());
    assert_eq!(read(&bucket, "doc.txt", GetObjectOptions::default()).await, "v2");
    assert_eq!(
        read(&bucket, "doc.txt", GetObjectOptions::version(v1.version_id())).await,
        "v1"
    );

    let output = bucket
        .get("doc.txt", GetObjectOptions::version(v2.version_id()))
        .await
        .unwrap();
    assert_eq!(output.info().version_id.as_deref(), Some(v2.version_id()));
}

#[tokio::test]
async fn test_unknown_version_is_object_not_exist() {
    let (bucket, _, _) = setup("account1").await;
    bucket
        .put("doc.txt", Bytes::from("v1"), PutObjectOptions::default())
        .await
        .unwrap();

    let err = bucket
        .get("doc.txt", GetObjectOptions::version("does-not-exist"))
        .await
        .unwrap_err();

    match err {
        S3Error::ObjectNotExist { id } => {
            assert_eq!(id.key(), "account1/doc.txt");
            assert_eq!(id.version_id(), Some("does-not-exist"));
        }
        other => panic!("Expected ObjectNotExist, got {:?}", other),
    }
}

#[tokio::test]
async fn test_delete_removes_every_version_of_the_key_only() {
    let (bucket, s3, backend) = setup("account1").await;
    for body in ["1", "2", "3"] {
        bucket
            .put("a.txt", Bytes::from(body), PutObjectOptions::default())
            .await
            .unwrap();
    }
    bucket
        .put("a.txt.bak", Bytes::from("backup"), PutObjectOptions::default())
        .await
        .unwrap();

    let output = bucket.delete("a.txt").await.unwrap();

    assert_eq!(output.deleted, 3);
    assert_eq!(backend.version_count(BUCKET).await, 1);
    assert!(matches!(
        bucket.get("a.txt", GetObjectOptions::default()).await,
        Err(S3Error::ObjectNotExist { .. })
    ));

    // no delete marker left behind
    let versions = s3
        .list_objects_versions(BUCKET, Some("account1/a.txt"), 10)
        .versions(true)
        .collect_all()
        .await
        .unwrap();
    assert_eq!(versions.len(), 1);
    assert_eq!(versions[0].key, "account1/a.txt.bak");
}

#[tokio::test]
async fn test_delete_clears_existing_delete_markers() {
    let (bucket, s3, backend) = setup("account1").await;
    bucket
        .put("a.txt", Bytes::from("1"), PutObjectOptions::default())
        .await
        .unwrap();
    let id = bucket.common().object_id("a.txt", None).unwrap();
    s3.delete_object(&id).await.unwrap();
    assert_eq!(backend.version_count(BUCKET).await, 2);

    let output = bucket.delete("a.txt").await.unwrap();

    assert_eq!(output.deleted, 2);
    assert_eq!(backend.version_count(BUCKET).await, 0);
}

#[tokio::test]
async fn test_delete_of_missing_key_sends_no_batch() {
    let (bucket, _, backend) = setup("account1").await;

    let output = bucket.delete("missing.txt").await.unwrap();

    assert_eq!(output.deleted, 0);
    assert_eq!(output.batches, 0);
    assert_eq!(backend.call_count(Operation::DeleteObjects).await, 0);
}

#[tokio::test]
async fn test_delete_single_version() {
    let (bucket, _, backend) = setup("account1").await;
    let v1 = bucket
        .put("doc.txt", Bytes::from("v1"), PutObjectOptions::default())
        .await
        .unwrap();
    let v2 = bucket
        .put("doc.txt", Bytes::from("v2"), PutObjectOptions::default())
        .await
        .unwrap();

    let deleted = bucket.delete_version("doc.txt", v2.version_id()).await.unwrap();

    assert_eq!(deleted.version_id.as_deref(), Some(v2.version_id()));
    assert_eq!(backend.version_count(BUCKET).await, 1);
    assert_eq!(read(&bucket, "doc.txt", GetObjectOptions::default()).await, "v1");
    assert_eq!(
        read(&bucket, "doc.txt", GetObjectOptions::version(v1.version_id())).await,
        "v1"
    );
}

#[tokio::test]
async fn test_delete_recursive_removes_versions_and_markers() {
    let (bucket, s3, backend) = setup("account1").await;
    let other = AccountsSharedVersioningBucket::new(
        Arc::clone(&s3),
        Arc::new(StaticAccountContext::new(AccountId::new("account2").unwrap())),
        BUCKET,
    );

    for key in ["dir/a.txt", "dir/b.txt", "dir/a.txt"] {
        bucket
            .put(key, Bytes::from(key), PutObjectOptions::default())
            .await
            .unwrap();
    }
    let id = bucket.common().object_id("dir/b.txt", None).unwrap();
    s3.delete_object(&id).await.unwrap();
    other
        .put("dir/a.txt", Bytes::from("other"), PutObjectOptions::default())
        .await
        .unwrap();
    assert_eq!(backend.version_count(BUCKET).await, 5);

    let output = bucket.delete_recursive("dir/").await.unwrap();

    assert_eq!(output.deleted, 4);
    assert_eq!(backend.version_count(BUCKET).await, 1);
    assert_eq!(
        read(&other, "dir/a.txt", GetObjectOptions::default()).await,
        "other"
    );
}

#[tokio::test]
async fn test_delete_recursive_refuses_empty_prefix() {
    let (bucket, _, backend) = setup("account1").await;
    backend.reset_call_counts().await;

    assert!(matches!(
        bucket.delete_recursive("").await,
        Err(S3Error::EmptyKeyPrefix)
    ));
    assert_eq!(backend.total_calls().await, 0);
}
