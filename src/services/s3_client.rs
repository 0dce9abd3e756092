use bytes::Bytes;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    domain::{
        errors::{codes, S3Error, S3Result, TransportError, TransportResult},
        models::{
            BodyStream, BucketVersioningStatus, CreateBucketOptions, DeleteObjectOutput,
            DeleteObjectsOutput, DeletePrefix, GetObjectConditions, GetObjectOutput,
            ListBucketsOutput, ObjectToDelete, Operation, PutObjectOptions, PutObjectOutput,
            TextEncoding,
        },
        value_objects::S3ObjectId,
    },
    ports::storage::{
        GetObjectRequest, ListObjectVersionsPage, ListObjectVersionsRequest, ListObjectsPage,
        ListObjectsRequest, PutObjectRequest, RawDeleteObjects, S3Backend, MAX_DELETE_BATCH,
    },
    services::{
        bulk_delete::BulkDelete,
        listing::{ListObjectVersionsCursor, ListObjectsCursor},
    },
};

/// Page size used when callers do not pick one
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Client for an S3-compatible store.
///
/// A long-lived handle meant to be shared (`Arc<S3>`). Bucket names passed
/// in are logical; the configured bucket prefix is prepended before any
/// request goes out and stripped again from bucket listings. After
/// [`S3::shutdown`] every call fails with an `Internal` error carrying
/// [`TransportError::Closed`].
pub struct S3 {
    backend: Arc<dyn S3Backend>,
    bucket_prefix: String,
    closed: AtomicBool,
}

impl S3 {
    pub fn new(backend: Arc<dyn S3Backend>) -> Self {
        Self::with_bucket_prefix(backend, "")
    }

    pub fn with_bucket_prefix(backend: Arc<dyn S3Backend>, bucket_prefix: impl Into<String>) -> Self {
        Self {
            backend,
            bucket_prefix: bucket_prefix.into(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn bucket_prefix(&self) -> &str {
        &self.bucket_prefix
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Stop accepting requests, then release the backend. Idempotent.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        info!("s3 client shutting down");
        self.backend.shutdown().await;
    }

    fn prefixed_bucket(&self, bucket: &str) -> String {
        format!("{}{}", self.bucket_prefix, bucket)
    }

    /// Single funnel for every remote call: refuses once closed, logs, and
    /// hands the raw transport result back for per-operation mapping.
    async fn dispatch<T, Fut>(&self, operation: Operation, target: &str, request: Fut) -> TransportResult<T>
    where
        Fut: Future<Output = TransportResult<T>>,
    {
        if self.is_closed() {
            warn!(%operation, target, "request refused, client is shut down");
            return Err(TransportError::Closed);
        }

        debug!(%operation, target, "sending request");
        let result = request.await;
        if let Err(err) = &result {
            debug!(%operation, target, error = %err, "request failed");
        }
        result
    }

    /// `dispatch` for bucket-scoped calls; `call` receives the prefixed bucket
    async fn send<T, F, Fut>(&self, operation: Operation, bucket: &str, call: F) -> TransportResult<T>
    where
        F: FnOnce(Arc<dyn S3Backend>, String) -> Fut,
        Fut: Future<Output = TransportResult<T>>,
    {
        let bucket = self.prefixed_bucket(bucket);
        let request = call(Arc::clone(&self.backend), bucket.clone());
        self.dispatch(operation, &bucket, request).await
    }

    /// Create a bucket, optionally with versioning enabled.
    pub async fn create_bucket(&self, bucket: &str, options: CreateBucketOptions) -> S3Result<bool> {
        let created = self
            .send(Operation::CreateBucket, bucket, |backend, name| async move {
                backend.create_bucket(&name).await
            })
            .await;

        match created {
            Ok(()) => {}
            Err(err)
                if err.has_code(codes::BUCKET_ALREADY_OWNED_BY_YOU)
                    || err.has_code(codes::BUCKET_ALREADY_EXISTS) =>
            {
                return Err(S3Error::BucketExist {
                    bucket: bucket.to_string(),
                    cause: err,
                });
            }
            Err(err) => return Err(S3Error::internal(Operation::CreateBucket, err)),
        }

        if options.versioning {
            self.send(Operation::PutBucketVersioning, bucket, |backend, name| async move {
                backend
                    .put_bucket_versioning(&name, BucketVersioningStatus::Enabled)
                    .await
            })
            .await
            .map_err(|err| bucket_failure(Operation::PutBucketVersioning, bucket, err))?;
        }

        info!(bucket, versioning = options.versioning, "bucket created");
        Ok(true)
    }

    pub async fn exists_bucket(&self, bucket: &str) -> S3Result<bool> {
        let head = self
            .send(Operation::HeadBucket, bucket, |backend, name| async move {
                backend.head_bucket(&name).await
            })
            .await;

        match head {
            Ok(()) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(S3Error::internal(Operation::HeadBucket, err)),
        }
    }

    /// Delete a bucket. A bucket that does not exist counts as deleted.
    ///
    /// With `force` the bucket is emptied first: every version and delete
    /// marker when versioning is enabled, every live object otherwise.
    pub async fn delete_bucket(&self, bucket: &str, force: bool) -> S3Result<bool> {
        if !self.exists_bucket(bucket).await? {
            debug!(bucket, "bucket already gone");
            return Ok(true);
        }

        let versioning = match self
            .send(Operation::GetBucketVersioning, bucket, |backend, name| async move {
                backend.get_bucket_versioning(&name).await
            })
            .await
        {
            Ok(status) => status,
            Err(err) if err.is_not_found() => return Ok(true),
            Err(err) => return Err(S3Error::internal(Operation::GetBucketVersioning, err)),
        };

        if force {
            let drained = if versioning == BucketVersioningStatus::Enabled {
                self.delete_objects_versions(bucket, DeletePrefix::All).await
            } else {
                self.delete_objects(bucket, DeletePrefix::All).await
            };
            match drained {
                Ok(_) => {}
                Err(S3Error::BucketNotExist { .. }) => return Ok(true),
                Err(err) => return Err(err),
            }
        }

        let deleted = self
            .send(Operation::DeleteBucket, bucket, |backend, name| async move {
                backend.delete_bucket(&name).await
            })
            .await;

        match deleted {
            Ok(()) => {
                info!(bucket, force, "bucket deleted");
                Ok(true)
            }
            Err(err) if err.is_not_found() => Ok(true),
            Err(err) => Err(S3Error::internal(Operation::DeleteBucket, err)),
        }
    }

    /// Buckets visible through this client's prefix.
    pub async fn list_buckets(&self) -> S3Result<ListBucketsOutput> {
        let buckets = self
            .dispatch(Operation::ListBuckets, "*", self.backend.list_buckets())
            .await
            .map_err(|err| S3Error::internal(Operation::ListBuckets, err))?;

        let names = buckets
            .iter()
            .filter_map(|b| b.name.strip_prefix(self.bucket_prefix.as_str()))
            .map(str::to_owned)
            .collect();

        Ok(ListBucketsOutput { names, buckets })
    }

    pub async fn list_bucket_names(&self) -> S3Result<Vec<String>> {
        Ok(self.list_buckets().await?.names)
    }

    /// Fetch an object; the version comes from the id.
    pub async fn get_object(
        &self,
        id: &S3ObjectId,
        conditions: &GetObjectConditions,
    ) -> S3Result<GetObjectOutput> {
        let request = GetObjectRequest {
            bucket: String::new(),
            key: id.key().to_string(),
            version_id: id.version_id().map(str::to_owned),
            conditions: conditions.clone(),
        };

        let raw = self
            .send(Operation::GetObject, id.bucket(), |backend, bucket| async move {
                backend.get_object(GetObjectRequest { bucket, ..request }).await
            })
            .await
            .map_err(|err| {
                if err.has_code(codes::NO_SUCH_KEY) || err.has_code(codes::NO_SUCH_VERSION) {
                    S3Error::ObjectNotExist { id: id.clone() }
                } else {
                    bucket_failure(Operation::GetObject, id.bucket(), err)
                }
            })?;

        Ok(GetObjectOutput::new(id.clone(), raw.info, raw.body))
    }

    pub async fn get_object_as_string(
        &self,
        id: &S3ObjectId,
        conditions: &GetObjectConditions,
        encoding: TextEncoding,
    ) -> S3Result<String> {
        self.get_object(id, conditions)
            .await?
            .get_as_string(encoding)
            .await
    }

    pub async fn get_object_as_stream(
        &self,
        id: &S3ObjectId,
        conditions: &GetObjectConditions,
    ) -> S3Result<BodyStream> {
        self.get_object(id, conditions).await?.get_as_stream()
    }

    pub async fn put_object(
        &self,
        id: &S3ObjectId,
        body: Bytes,
        options: PutObjectOptions,
    ) -> S3Result<PutObjectOutput> {
        let key = id.key().to_string();
        let raw = self
            .send(Operation::PutObject, id.bucket(), |backend, bucket| async move {
                backend
                    .put_object(PutObjectRequest {
                        bucket,
                        key,
                        body,
                        options,
                    })
                    .await
            })
            .await
            .map_err(|err| bucket_failure(Operation::PutObject, id.bucket(), err))?;

        Ok(PutObjectOutput::new(id.clone(), raw.etag, raw.version_id))
    }

    /// Delete one object, or one version when the id carries a version id.
    pub async fn delete_object(&self, id: &S3ObjectId) -> S3Result<DeleteObjectOutput> {
        let raw = self
            .send(Operation::DeleteObject, id.bucket(), |backend, bucket| async move {
                backend
                    .delete_object(&bucket, id.key(), id.version_id())
                    .await
            })
            .await
            .map_err(|err| bucket_failure(Operation::DeleteObject, id.bucket(), err))?;

        Ok(DeleteObjectOutput {
            id: id.clone(),
            version_id: raw.version_id,
            delete_marker: raw.delete_marker,
        })
    }

    /// Cursor over live objects. `page_size` is clamped to 1..=1000.
    pub fn list_objects(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        page_size: usize,
    ) -> ListObjectsCursor<'_> {
        ListObjectsCursor::new(self, bucket, prefix, clamp_page_size(page_size))
    }

    /// Cursor over object versions and delete markers. `page_size` is
    /// clamped to 1..=1000.
    pub fn list_objects_versions(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        page_size: usize,
    ) -> ListObjectVersionsCursor<'_> {
        ListObjectVersionsCursor::new(self, bucket, prefix, clamp_page_size(page_size))
    }

    /// Delete every live object under `prefix`, one batch per listing page.
    pub async fn delete_objects(
        &self,
        bucket: &str,
        prefix: DeletePrefix,
    ) -> S3Result<DeleteObjectsOutput> {
        let cursor = self.list_objects(bucket, prefix.as_prefix(), DEFAULT_PAGE_SIZE);
        BulkDelete::new(self, bucket, prefix.as_prefix(), cursor.to_delete())
            .run()
            .await
    }

    /// Delete every version and delete marker under `prefix`.
    pub async fn delete_objects_versions(
        &self,
        bucket: &str,
        prefix: DeletePrefix,
    ) -> S3Result<DeleteObjectsOutput> {
        let cursor = self.list_objects_versions(bucket, prefix.as_prefix(), DEFAULT_PAGE_SIZE);
        BulkDelete::new(self, bucket, prefix.as_prefix(), cursor.to_delete())
            .run()
            .await
    }

    /// Delete every version and delete marker of exactly `id`'s key; keys
    /// that merely start with it are left alone.
    pub async fn delete_all_object_versions(&self, id: &S3ObjectId) -> S3Result<DeleteObjectsOutput> {
        let cursor = self.list_objects_versions(id.bucket(), Some(id.key()), DEFAULT_PAGE_SIZE);
        BulkDelete::new(
            self,
            id.bucket(),
            Some(id.key()),
            cursor.to_delete().only_key(id.key()),
        )
        .run()
        .await
    }

    pub(crate) async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        page_size: usize,
        continuation_token: Option<String>,
    ) -> S3Result<ListObjectsPage> {
        let prefix = prefix.map(str::to_owned);
        self.send(Operation::ListObjectsV2, bucket, |backend, bucket| async move {
            backend
                .list_objects_v2(ListObjectsRequest {
                    bucket,
                    prefix,
                    max_keys: page_size,
                    continuation_token,
                })
                .await
        })
        .await
        .map_err(|err| bucket_failure(Operation::ListObjectsV2, bucket, err))
    }

    pub(crate) async fn list_object_versions_page(
        &self,
        bucket: &str,
        prefix: Option<&str>,
        page_size: usize,
        key_marker: Option<String>,
        version_id_marker: Option<String>,
    ) -> S3Result<ListObjectVersionsPage> {
        let prefix = prefix.map(str::to_owned);
        self.send(Operation::ListObjectVersions, bucket, |backend, bucket| async move {
            backend
                .list_object_versions(ListObjectVersionsRequest {
                    bucket,
                    prefix,
                    max_keys: page_size,
                    key_marker,
                    version_id_marker,
                })
                .await
        })
        .await
        .map_err(|err| bucket_failure(Operation::ListObjectVersions, bucket, err))
    }

    pub(crate) async fn delete_batch(
        &self,
        bucket: &str,
        objects: Vec<ObjectToDelete>,
    ) -> S3Result<RawDeleteObjects> {
        debug_assert!(objects.len() <= MAX_DELETE_BATCH);
        self.send(Operation::DeleteObjects, bucket, |backend, bucket| async move {
            backend.delete_objects(&bucket, objects).await
        })
        .await
        .map_err(|err| bucket_failure(Operation::DeleteObjects, bucket, err))
    }
}

impl std::fmt::Debug for S3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3")
            .field("bucket_prefix", &self.bucket_prefix)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

fn clamp_page_size(page_size: usize) -> usize {
    page_size.clamp(1, MAX_DELETE_BATCH)
}

/// `NoSuchBucket` becomes `BucketNotExist`, anything else is opaque
fn bucket_failure(operation: Operation, bucket: &str, err: TransportError) -> S3Error {
    if err.has_code(codes::NO_SUCH_BUCKET) {
        S3Error::BucketNotExist {
            bucket: bucket.to_string(),
        }
    } else {
        S3Error::internal(operation, err)
    }
}
