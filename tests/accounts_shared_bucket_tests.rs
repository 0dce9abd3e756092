use account_object_store::{
    AccountId, AccountsBucket, AccountsSharedBucket, AppBuilder, AppServices, CreateBucketOptions,
    GetObjectConditions, InMemoryS3Backend, PutObjectOptions, S3Error, S3ObjectId,
    StaticAccountContext, TextEncoding,
};
use bytes::Bytes;
use futures::StreamExt;
use std::sync::Arc;

const BUCKET: &str = "test-accounts-shared-bucket";

async fn app() -> (AppServices, InMemoryS3Backend) {
    let backend = InMemoryS3Backend::new();
    let app = AppBuilder::new()
        .with_backend(Arc::new(backend.clone()))
        .build()
        .await
        .unwrap();
    app.s3
        .create_bucket(BUCKET, CreateBucketOptions::default())
        .await
        .unwrap();
    (app, backend)
}

fn bucket_for(app: &AppServices, account: &str) -> AccountsSharedBucket {
    let account = StaticAccountContext::new(AccountId::new(account).unwrap());
    app.accounts_shared_bucket(Arc::new(account), BUCKET)
}

async fn read(bucket: &AccountsSharedBucket, key: &str) -> String {
    bucket
        .get_as_string(key, GetObjectConditions::default(), TextEncoding::Utf8)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_keys_are_scoped_to_account() {
    let (app, _) = app().await;
    let account1 = bucket_for(&app, "account1");
    let account2 = bucket_for(&app, "account2");

    account1
        .put("file.txt", Bytes::from("one"), PutObjectOptions::default())
        .await
        .unwrap();
    account2
        .put("file.txt", Bytes::from("two"), PutObjectOptions::default())
        .await
        .unwrap();

    assert_eq!(read(&account1, "file.txt").await, "one");
    assert_eq!(read(&account2, "file.txt").await, "two");

    // the raw key carries the account prefix
    let raw = S3ObjectId::new(BUCKET, "account1/file.txt", None).unwrap();
    let text = app
        .s3
        .get_object_as_string(&raw, &GetObjectConditions::default(), TextEncoding::Utf8)
        .await
        .unwrap();
    assert_eq!(text, "one");
}

#[tokio::test]
async fn test_put_returns_prefixed_id() {
    let (app, _) = app().await;
    let bucket = bucket_for(&app, "account1");

    let output = bucket
        .put("docs/a.txt", Bytes::from("a"), PutObjectOptions::default())
        .await
        .unwrap();

    assert_eq!(output.id.bucket(), BUCKET);
    assert_eq!(output.id.key(), "account1/docs/a.txt");
    assert_eq!(output.try_version_id(), None);
}

#[tokio::test]
#[should_panic(expected = "bucket is not versioned")]
async fn test_version_id_panics_on_unversioned_bucket() {
    let (app, _) = app().await;
    let bucket = bucket_for(&app, "account1");

    let output = bucket
        .put("a.txt", Bytes::from("a"), PutObjectOptions::default())
        .await
        .unwrap();
    output.version_id();
}

#[tokio::test]
async fn test_overwrite_and_stream() {
    let (app, _) = app().await;
    let bucket = bucket_for(&app, "account1");

    bucket
        .put("a.txt", Bytes::from("first"), PutObjectOptions::default())
        .await
        .unwrap();
    bucket
        .put("a.txt", Bytes::from("second"), PutObjectOptions::default())
        .await
        .unwrap();

    let mut body = bucket
        .get_as_stream("a.txt", GetObjectConditions::default())
        .await
        .unwrap();
    let mut content = Vec::new();
    while let Some(chunk) = body.next().await {
        content.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(content, b"second");
}

#[tokio::test]
async fn test_folder_keys_are_rejected_before_any_call() {
    let (app, backend) = app().await;
    let bucket = bucket_for(&app, "account1");
    backend.reset_call_counts().await;

    let err = bucket
        .put("docs/", Bytes::from("a"), PutObjectOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, S3Error::ObjectKeyIsNotFile { .. }));
    assert_eq!(err.status_code(), http::StatusCode::BAD_REQUEST);
    assert_eq!(backend.total_calls().await, 0);
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let (app, _) = app().await;
    let bucket = bucket_for(&app, "account1");
    bucket
        .put("a.txt", Bytes::from("a"), PutObjectOptions::default())
        .await
        .unwrap();

    let deleted = bucket.delete("a.txt").await.unwrap();
    assert_eq!(deleted.id.key(), "account1/a.txt");
    assert!(!deleted.delete_marker);
    bucket.delete("a.txt").await.unwrap();

    assert!(matches!(
        bucket.get("a.txt", GetObjectConditions::default()).await,
        Err(S3Error::ObjectNotExist { .. })
    ));
}

#[tokio::test]
async fn test_delete_recursive_is_precise() {
    let (app, backend) = app().await;
    let account1 = bucket_for(&app, "account1");
    let account2 = bucket_for(&app, "account2");

    for key in ["docs/a.txt", "docs/b.txt", "docs/deep/c.txt", "docsx.txt", "other.txt"] {
        account1
            .put(key, Bytes::from(key), PutObjectOptions::default())
            .await
            .unwrap();
    }
    account2
        .put("docs/a.txt", Bytes::from("a"), PutObjectOptions::default())
        .await
        .unwrap();

    let output = account1.delete_recursive("docs/").await.unwrap();
    assert_eq!(output.deleted, 3);
    assert_eq!(output.prefix.as_deref(), Some("account1/docs/"));

    let left = app
        .s3
        .list_objects(BUCKET, None, 10)
        .keys_as_vec()
        .await
        .unwrap();
    assert_eq!(
        left,
        vec![
            "account1/docsx.txt".to_string(),
            "account1/other.txt".to_string(),
            "account2/docs/a.txt".to_string(),
        ]
    );
    assert_eq!(backend.version_count(BUCKET).await, 3);
}

#[tokio::test]
async fn test_delete_recursive_refuses_empty_prefix() {
    let (app, backend) = app().await;
    let bucket = bucket_for(&app, "account1");
    bucket
        .put("a.txt", Bytes::from("a"), PutObjectOptions::default())
        .await
        .unwrap();
    backend.reset_call_counts().await;

    let err = bucket.delete_recursive("").await.unwrap_err();

    assert!(matches!(err, S3Error::EmptyKeyPrefix));
    assert_eq!(backend.total_calls().await, 0);
    assert_eq!(backend.version_count(BUCKET).await, 1);
}

#[tokio::test]
async fn test_missing_shared_bucket() {
    let (app, _) = app().await;
    let account = StaticAccountContext::new(AccountId::new("account1").unwrap());
    let bucket = app.accounts_shared_bucket(Arc::new(account), "missing-bucket");

    let err = bucket
        .put("a.txt", Bytes::from("a"), PutObjectOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, S3Error::BucketNotExist { bucket } if bucket == "missing-bucket"));
}
