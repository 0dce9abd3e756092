use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{
    errors::TransportResult,
    models::{
        BodyStream, BucketEntry, BucketVersioningStatus, DeleteObjectError, GetObjectConditions,
        GetObjectInfo, ObjectMeta, ObjectToDelete, ObjectVersionMeta, PutObjectOptions,
    },
};

/// Port for the remote object store.
///
/// One method per wire call. Implementations receive fully resolved bucket
/// names (the client applies its bucket prefix before calling) and report
/// failures as raw [`TransportError`](crate::domain::TransportError)s; the
/// mapping into domain errors happens in the client.
#[async_trait]
pub trait S3Backend: Send + Sync + 'static {
    async fn create_bucket(&self, bucket: &str) -> TransportResult<()>;

    async fn delete_bucket(&self, bucket: &str) -> TransportResult<()>;

    /// Succeeds when the bucket exists and is accessible
    async fn head_bucket(&self, bucket: &str) -> TransportResult<()>;

    async fn list_buckets(&self) -> TransportResult<Vec<BucketEntry>>;

    async fn get_bucket_versioning(&self, bucket: &str) -> TransportResult<BucketVersioningStatus>;

    async fn put_bucket_versioning(
        &self,
        bucket: &str,
        status: BucketVersioningStatus,
    ) -> TransportResult<()>;

    async fn get_object(&self, request: GetObjectRequest) -> TransportResult<RawGetObject>;

    async fn put_object(&self, request: PutObjectRequest) -> TransportResult<RawPutObject>;

    async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
    ) -> TransportResult<RawDeleteObject>;

    /// Batch delete; callers never send more than [`MAX_DELETE_BATCH`] entries
    async fn delete_objects(
        &self,
        bucket: &str,
        objects: Vec<ObjectToDelete>,
    ) -> TransportResult<RawDeleteObjects>;

    async fn list_objects_v2(&self, request: ListObjectsRequest)
        -> TransportResult<ListObjectsPage>;

    async fn list_object_versions(
        &self,
        request: ListObjectVersionsRequest,
    ) -> TransportResult<ListObjectVersionsPage>;

    /// Release transport resources. Called once, after the client stopped
    /// accepting requests.
    async fn shutdown(&self) {}
}

/// Remote limit on keys per batch delete and per listing page
pub const MAX_DELETE_BATCH: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetObjectRequest {
    pub bucket: String,
    pub key: String,
    pub version_id: Option<String>,
    pub conditions: GetObjectConditions,
}

pub struct RawGetObject {
    pub info: GetObjectInfo,
    pub body: Option<BodyStream>,
}

#[derive(Debug, Clone)]
pub struct PutObjectRequest {
    pub bucket: String,
    pub key: String,
    pub body: Bytes,
    pub options: PutObjectOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPutObject {
    pub etag: Option<String>,
    pub version_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDeleteObject {
    pub version_id: Option<String>,
    pub delete_marker: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawDeleteObjects {
    pub deleted: Vec<ObjectToDelete>,
    pub errors: Vec<DeleteObjectError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListObjectsRequest {
    pub bucket: String,
    pub prefix: Option<String>,
    pub max_keys: usize,
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListObjectsPage {
    pub contents: Vec<ObjectMeta>,
    pub is_truncated: Option<bool>,
    pub next_continuation_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListObjectVersionsRequest {
    pub bucket: String,
    pub prefix: Option<String>,
    pub max_keys: usize,
    pub key_marker: Option<String>,
    pub version_id_marker: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListObjectVersionsPage {
    pub versions: Vec<ObjectVersionMeta>,
    pub delete_markers: Vec<ObjectVersionMeta>,
    pub is_truncated: Option<bool>,
    pub next_key_marker: Option<String>,
    pub next_version_id_marker: Option<String>,
}
