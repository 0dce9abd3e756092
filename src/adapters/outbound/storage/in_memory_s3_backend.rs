use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::{
    domain::{
        errors::{codes, TransportError, TransportResult},
        models::{
            BucketEntry, BucketVersioningStatus, GetObjectConditions, GetObjectInfo, ObjectMeta,
            ObjectToDelete, ObjectVersionMeta, Operation, StorageClass,
        },
    },
    ports::storage::{
        GetObjectRequest, ListObjectVersionsPage, ListObjectVersionsRequest, ListObjectsPage,
        ListObjectsRequest, PutObjectRequest, RawDeleteObject, RawDeleteObjects, RawGetObject,
        RawPutObject, S3Backend, MAX_DELETE_BATCH,
    },
};

/// Version id S3 assigns in buckets that are not (or no longer) versioned
const NULL_VERSION: &str = "null";

/// In-memory implementation of S3Backend for testing and development.
///
/// Emulates the parts of S3 this crate relies on: bucket versioning with
/// delete markers, lexicographic listings with continuation, the batch delete
/// limit and conditional GETs. Failures can be injected per operation and
/// every call is counted.
///
/// Version listings hand out write sequence numbers as version id markers,
/// so a listing resumes correctly after the marker version was deleted.
#[derive(Clone, Default)]
pub struct InMemoryS3Backend {
    data: Arc<RwLock<BackendData>>,
}

#[derive(Default)]
struct BackendData {
    buckets: BTreeMap<String, StoredBucket>,
    injected_failures: HashMap<Operation, VecDeque<TransportError>>,
    calls: HashMap<Operation, usize>,
    shut_down: bool,
}

struct StoredBucket {
    created_at: DateTime<Utc>,
    versioning: BucketVersioningStatus,
    // key -> versions, oldest first
    objects: BTreeMap<String, Vec<StoredVersion>>,
    next_sequence: u64,
}

#[derive(Clone)]
struct StoredVersion {
    // bucket-wide write order; listing markers resume from it
    sequence: u64,
    version_id: String,
    last_modified: DateTime<Utc>,
    // None for delete markers
    content: Option<StoredContent>,
}

#[derive(Clone)]
struct StoredContent {
    body: Bytes,
    etag: String,
    content_type: Option<String>,
    content_encoding: Option<String>,
    storage_class: StorageClass,
    metadata: HashMap<String, String>,
}

impl InMemoryS3Backend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call of `operation` fail with `error`. Failures queue up.
    pub async fn fail_next(&self, operation: Operation, error: TransportError) {
        let mut data = self.data.write().await;
        data.injected_failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Number of calls of `operation`, failed ones included
    pub async fn call_count(&self, operation: Operation) -> usize {
        let data = self.data.read().await;
        data.calls.get(&operation).copied().unwrap_or(0)
    }

    pub async fn total_calls(&self) -> usize {
        let data = self.data.read().await;
        data.calls.values().sum()
    }

    pub async fn reset_call_counts(&self) {
        self.data.write().await.calls.clear();
    }

    /// Stored versions and delete markers in `bucket`; 0 if it does not exist
    pub async fn version_count(&self, bucket: &str) -> usize {
        let data = self.data.read().await;
        data.buckets
            .get(bucket)
            .map(|b| b.objects.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    pub async fn is_shut_down(&self) -> bool {
        self.data.read().await.shut_down
    }
}

impl BackendData {
    fn begin(&mut self, operation: Operation) -> TransportResult<()> {
        *self.calls.entry(operation).or_default() += 1;
        match self
            .injected_failures
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            Some(err) => {
                debug!(%operation, error = %err, "injected failure");
                Err(err)
            }
            None => Ok(()),
        }
    }

    fn bucket(&self, name: &str) -> TransportResult<&StoredBucket> {
        self.buckets.get(name).ok_or_else(|| no_such_bucket(name))
    }

    fn bucket_mut(&mut self, name: &str) -> TransportResult<&mut StoredBucket> {
        self.buckets.get_mut(name).ok_or_else(|| no_such_bucket(name))
    }
}

impl StoredBucket {
    fn new() -> Self {
        Self {
            created_at: Utc::now(),
            versioning: BucketVersioningStatus::Unversioned,
            objects: BTreeMap::new(),
            next_sequence: 0,
        }
    }

    fn next_version_id(&self) -> String {
        match self.versioning {
            BucketVersioningStatus::Enabled => Uuid::new_v4().simple().to_string(),
            _ => NULL_VERSION.to_string(),
        }
    }

    fn push_version(&mut self, key: &str, version_id: String, content: Option<StoredContent>) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let versions = self.objects.entry(key.to_string()).or_default();
        if version_id == NULL_VERSION {
            versions.retain(|v| v.version_id != NULL_VERSION);
        }
        versions.push(StoredVersion {
            sequence,
            version_id,
            last_modified: Utc::now(),
            content,
        });
    }

    fn delete(&mut self, key: &str, version_id: Option<&str>) -> RawDeleteObject {
        match version_id {
            Some(version_id) => {
                let mut delete_marker = false;
                if let Some(versions) = self.objects.get_mut(key) {
                    if let Some(pos) = versions.iter().position(|v| v.version_id == version_id) {
                        delete_marker = versions.remove(pos).content.is_none();
                    }
                    if versions.is_empty() {
                        self.objects.remove(key);
                    }
                }
                RawDeleteObject {
                    version_id: Some(version_id.to_string()),
                    delete_marker,
                }
            }
            None if self.versioning == BucketVersioningStatus::Unversioned => {
                self.objects.remove(key);
                RawDeleteObject::default()
            }
            None => {
                let version_id = self.next_version_id();
                self.push_version(key, version_id.clone(), None);
                RawDeleteObject {
                    version_id: Some(version_id),
                    delete_marker: true,
                }
            }
        }
    }
}

fn no_such_bucket(bucket: &str) -> TransportError {
    TransportError::service(
        codes::NO_SUCH_BUCKET,
        404,
        format!("The specified bucket does not exist: {}", bucket),
    )
}

fn etag_of(body: &[u8]) -> String {
    format!("\"{:x}\"", md5::compute(body))
}

fn etag_matches(header: &str, etag: &str) -> bool {
    header == "*" || header.trim_matches('"') == etag.trim_matches('"')
}

fn check_conditions(
    conditions: &GetObjectConditions,
    etag: &str,
    last_modified: DateTime<Utc>,
) -> TransportResult<()> {
    // HTTP dates carry whole seconds
    let modified = last_modified.timestamp();

    let precondition_failed = match (&conditions.if_match, conditions.if_unmodified_since) {
        (Some(expected), _) => !etag_matches(expected, etag),
        (None, Some(since)) => modified > since.timestamp(),
        (None, None) => false,
    };
    if precondition_failed {
        return Err(TransportError::service(
            codes::PRECONDITION_FAILED,
            412,
            "At least one of the pre-conditions you specified did not hold",
        ));
    }

    let not_modified = match (&conditions.if_none_match, conditions.if_modified_since) {
        (Some(expected), _) => etag_matches(expected, etag),
        (None, Some(since)) => modified <= since.timestamp(),
        (None, None) => false,
    };
    if not_modified {
        return Err(TransportError::service(codes::NOT_MODIFIED, 304, "Not Modified"));
    }

    Ok(())
}

fn version_meta(key: &str, version: &StoredVersion, is_latest: bool) -> ObjectVersionMeta {
    ObjectVersionMeta {
        key: key.to_string(),
        version_id: version.version_id.clone(),
        last_modified_at: version.last_modified,
        storage_class: version.content.as_ref().map(|c| c.storage_class.clone()),
        size: version.content.as_ref().map_or(0, |c| c.body.len() as u64),
        is_latest,
        is_delete_marker: version.content.is_none(),
    }
}

#[async_trait]
impl S3Backend for InMemoryS3Backend {
    async fn create_bucket(&self, bucket: &str) -> TransportResult<()> {
        let mut data = self.data.write().await;
        data.begin(Operation::CreateBucket)?;

        if data.buckets.contains_key(bucket) {
            return Err(TransportError::service(
                codes::BUCKET_ALREADY_OWNED_BY_YOU,
                409,
                "Your previous request to create the named bucket succeeded and you already own it.",
            ));
        }

        data.buckets.insert(bucket.to_string(), StoredBucket::new());
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> TransportResult<()> {
        let mut data = self.data.write().await;
        data.begin(Operation::DeleteBucket)?;

        if !data.bucket(bucket)?.objects.is_empty() {
            return Err(TransportError::service(
                codes::BUCKET_NOT_EMPTY,
                409,
                "The bucket you tried to delete is not empty",
            ));
        }

        data.buckets.remove(bucket);
        Ok(())
    }

    async fn head_bucket(&self, bucket: &str) -> TransportResult<()> {
        let mut data = self.data.write().await;
        data.begin(Operation::HeadBucket)?;

        if data.buckets.contains_key(bucket) {
            Ok(())
        } else {
            Err(TransportError::service(codes::NOT_FOUND, 404, ""))
        }
    }

    async fn list_buckets(&self) -> TransportResult<Vec<BucketEntry>> {
        let mut data = self.data.write().await;
        data.begin(Operation::ListBuckets)?;

        Ok(data
            .buckets
            .iter()
            .map(|(name, bucket)| BucketEntry {
                name: name.clone(),
                created_at: Some(bucket.created_at),
            })
            .collect())
    }

    async fn get_bucket_versioning(&self, bucket: &str) -> TransportResult<BucketVersioningStatus> {
        let mut data = self.data.write().await;
        data.begin(Operation::GetBucketVersioning)?;
        Ok(data.bucket(bucket)?.versioning)
    }

    async fn put_bucket_versioning(
        &self,
        bucket: &str,
        status: BucketVersioningStatus,
    ) -> TransportResult<()> {
        let mut data = self.data.write().await;
        data.begin(Operation::PutBucketVersioning)?;

        if status == BucketVersioningStatus::Unversioned {
            return Err(TransportError::service(
                codes::MALFORMED_XML,
                400,
                "Versioning status must be Enabled or Suspended",
            ));
        }

        data.bucket_mut(bucket)?.versioning = status;
        Ok(())
    }

    async fn get_object(&self, request: GetObjectRequest) -> TransportResult<RawGetObject> {
        let mut data = self.data.write().await;
        data.begin(Operation::GetObject)?;

        let bucket = data.bucket(&request.bucket)?;
        let versions = bucket.objects.get(&request.key);

        let version = match &request.version_id {
            Some(version_id) => versions
                .and_then(|vs| vs.iter().find(|v| &v.version_id == version_id))
                .ok_or_else(|| {
                    TransportError::service(
                        codes::NO_SUCH_VERSION,
                        404,
                        "The specified version does not exist.",
                    )
                })?,
            None => versions
                .and_then(|vs| vs.last())
                .filter(|v| v.content.is_some())
                .ok_or_else(|| {
                    TransportError::service(codes::NO_SUCH_KEY, 404, "The specified key does not exist.")
                })?,
        };

        let content = version.content.as_ref().ok_or_else(|| {
            TransportError::service(
                codes::METHOD_NOT_ALLOWED,
                405,
                "The specified method is not allowed against this resource.",
            )
        })?;

        check_conditions(&request.conditions, &content.etag, version.last_modified)?;

        let info = GetObjectInfo {
            content_length: Some(content.body.len() as u64),
            content_type: content.content_type.clone(),
            content_encoding: content.content_encoding.clone(),
            etag: Some(content.etag.clone()),
            version_id: (bucket.versioning != BucketVersioningStatus::Unversioned)
                .then(|| version.version_id.clone()),
            last_modified: Some(version.last_modified),
            storage_class: Some(content.storage_class.clone()),
            metadata: content.metadata.clone(),
        };
        let body = content.body.clone();

        Ok(RawGetObject {
            info,
            body: Some(futures::stream::once(async move { Ok(body) }).boxed()),
        })
    }

    async fn put_object(&self, request: PutObjectRequest) -> TransportResult<RawPutObject> {
        let mut data = self.data.write().await;
        data.begin(Operation::PutObject)?;

        let bucket = data.bucket_mut(&request.bucket)?;
        let etag = etag_of(&request.body);
        let version_id = bucket.next_version_id();
        let options = request.options;

        bucket.push_version(
            &request.key,
            version_id.clone(),
            Some(StoredContent {
                body: request.body,
                etag: etag.clone(),
                content_type: options.content_type,
                content_encoding: options.content_encoding,
                storage_class: options.storage_class.unwrap_or_default(),
                metadata: options.metadata,
            }),
        );

        Ok(RawPutObject {
            etag: Some(etag),
            version_id: (version_id != NULL_VERSION).then_some(version_id),
        })
    }

    async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
    ) -> TransportResult<RawDeleteObject> {
        let mut data = self.data.write().await;
        data.begin(Operation::DeleteObject)?;
        Ok(data.bucket_mut(bucket)?.delete(key, version_id))
    }

    async fn delete_objects(
        &self,
        bucket: &str,
        objects: Vec<ObjectToDelete>,
    ) -> TransportResult<RawDeleteObjects> {
        let mut data = self.data.write().await;
        data.begin(Operation::DeleteObjects)?;

        if objects.is_empty() || objects.len() > MAX_DELETE_BATCH {
            return Err(TransportError::service(
                codes::MALFORMED_XML,
                400,
                format!(
                    "The XML you provided was not well-formed: {} objects (1 to {} allowed)",
                    objects.len(),
                    MAX_DELETE_BATCH
                ),
            ));
        }

        let stored = data.bucket_mut(bucket)?;
        let mut output = RawDeleteObjects::default();
        for object in objects {
            stored.delete(&object.key, object.version_id.as_deref());
            output.deleted.push(object);
        }
        Ok(output)
    }

    async fn list_objects_v2(
        &self,
        request: ListObjectsRequest,
    ) -> TransportResult<ListObjectsPage> {
        let mut data = self.data.write().await;
        data.begin(Operation::ListObjectsV2)?;

        let bucket = data.bucket(&request.bucket)?;
        let prefix = request.prefix.as_deref().unwrap_or("");
        let after = request.continuation_token.as_deref();
        let max_keys = request.max_keys.min(MAX_DELETE_BATCH);

        let mut live = bucket
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .filter(|(key, _)| after.map_or(true, |token| key.as_str() > token))
            .filter_map(|(key, versions)| {
                let latest = versions.last()?;
                let content = latest.content.as_ref()?;
                Some(ObjectMeta {
                    key: key.clone(),
                    last_modified_at: latest.last_modified,
                    storage_class: content.storage_class.clone(),
                    size: content.body.len() as u64,
                    etag: Some(content.etag.clone()),
                })
            });

        let contents: Vec<ObjectMeta> = live.by_ref().take(max_keys).collect();
        let is_truncated = live.next().is_some();
        let next_continuation_token = if is_truncated {
            contents.last().map(|o| o.key.clone())
        } else {
            None
        };

        Ok(ListObjectsPage {
            contents,
            is_truncated: Some(is_truncated),
            next_continuation_token,
        })
    }

    async fn list_object_versions(
        &self,
        request: ListObjectVersionsRequest,
    ) -> TransportResult<ListObjectVersionsPage> {
        let mut data = self.data.write().await;
        data.begin(Operation::ListObjectVersions)?;

        let bucket = data.bucket(&request.bucket)?;
        let prefix = request.prefix.as_deref().unwrap_or("");
        let max_keys = request.max_keys.min(MAX_DELETE_BATCH);

        // newest first within a key, like S3
        let entries: Vec<(&String, &StoredVersion, bool)> = bucket
            .objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .flat_map(|(key, versions)| {
                versions
                    .iter()
                    .rev()
                    .enumerate()
                    .map(move |(idx, version)| (key, version, idx == 0))
            })
            .collect();

        let after_key =
            |marker: &str| entries.iter().position(|(key, _, _)| key.as_str() > marker);
        let start = match (&request.key_marker, &request.version_id_marker) {
            (None, _) => Some(0),
            (Some(key_marker), Some(version_marker)) => match version_marker.parse::<u64>() {
                // the marker entry may be gone already; resume at the next older write
                Ok(sequence) => entries.iter().position(|(key, v, _)| {
                    key.as_str() > key_marker.as_str()
                        || (*key == key_marker && v.sequence < sequence)
                }),
                Err(_) => entries
                    .iter()
                    .position(|(key, v, _)| *key == key_marker && &v.version_id == version_marker)
                    .map(|idx| idx + 1)
                    .or_else(|| after_key(key_marker)),
            },
            (Some(key_marker), None) => after_key(key_marker),
        }
        .unwrap_or(entries.len());

        let page = &entries[start..];
        let taken = page.len().min(max_keys);
        let is_truncated = taken < page.len();

        let mut output = ListObjectVersionsPage {
            is_truncated: Some(is_truncated),
            ..Default::default()
        };
        for (key, version, is_latest) in &page[..taken] {
            let meta = version_meta(key, version, *is_latest);
            if meta.is_delete_marker {
                output.delete_markers.push(meta);
            } else {
                output.versions.push(meta);
            }
        }
        if is_truncated {
            if let Some((key, version, _)) = page[..taken].last() {
                output.next_key_marker = Some((*key).clone());
                output.next_version_id_marker = Some(version.sequence.to_string());
            }
        }

        Ok(output)
    }

    async fn shutdown(&self) {
        self.data.write().await.shut_down = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::PutObjectOptions;

    fn put(bucket: &str, key: &str, body: &'static str) -> PutObjectRequest {
        PutObjectRequest {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body: Bytes::from_static(body.as_bytes()),
            options: PutObjectOptions::default(),
        }
    }

    fn get(bucket: &str, key: &str) -> GetObjectRequest {
        GetObjectRequest {
            bucket: bucket.to_string(),
            key: key.to_string(),
            version_id: None,
            conditions: GetObjectConditions::default(),
        }
    }

    #[tokio::test]
    async fn test_unversioned_put_overwrites() {
        let backend = InMemoryS3Backend::new();
        backend.create_bucket("b").await.unwrap();

        let first = backend.put_object(put("b", "a.txt", "one")).await.unwrap();
        backend.put_object(put("b", "a.txt", "two")).await.unwrap();

        assert_eq!(first.version_id, None);
        assert_eq!(first.etag.as_deref(), Some("\"f97c5d29941bfb1b2fdab0874906ab82\""));
        assert_eq!(backend.version_count("b").await, 1);
    }

    #[tokio::test]
    async fn test_versioned_delete_leaves_marker() {
        let backend = InMemoryS3Backend::new();
        backend.create_bucket("b").await.unwrap();
        backend
            .put_bucket_versioning("b", BucketVersioningStatus::Enabled)
            .await
            .unwrap();

        let stored = backend.put_object(put("b", "a.txt", "one")).await.unwrap();
        let deleted = backend.delete_object("b", "a.txt", None).await.unwrap();
        assert!(deleted.delete_marker);

        let err = backend.get_object(get("b", "a.txt")).await.err().unwrap();
        assert!(err.has_code(codes::NO_SUCH_KEY));

        let mut by_version = get("b", "a.txt");
        by_version.version_id = stored.version_id;
        assert!(backend.get_object(by_version).await.is_ok());
        assert_eq!(backend.version_count("b").await, 2);
    }

    #[tokio::test]
    async fn test_versions_listing_resumes_after_marker_is_deleted() {
        let backend = InMemoryS3Backend::new();
        backend.create_bucket("b").await.unwrap();
        backend
            .put_bucket_versioning("b", BucketVersioningStatus::Enabled)
            .await
            .unwrap();
        for body in ["one", "two", "three"] {
            backend.put_object(put("b", "a.txt", body)).await.unwrap();
        }

        let request = |key_marker, version_id_marker| ListObjectVersionsRequest {
            bucket: "b".to_string(),
            prefix: None,
            max_keys: 2,
            key_marker,
            version_id_marker,
        };

        let first = backend.list_object_versions(request(None, None)).await.unwrap();
        assert_eq!(first.versions.len(), 2);
        assert_eq!(first.is_truncated, Some(true));

        let listed = first
            .versions
            .iter()
            .map(ObjectVersionMeta::to_delete)
            .collect();
        backend.delete_objects("b", listed).await.unwrap();

        let second = backend
            .list_object_versions(request(first.next_key_marker, first.next_version_id_marker))
            .await
            .unwrap();
        assert_eq!(second.versions.len(), 1);
        assert_eq!(second.is_truncated, Some(false));
        assert_eq!(backend.version_count("b").await, 1);
    }

    #[tokio::test]
    async fn test_conditional_get() {
        let backend = InMemoryS3Backend::new();
        backend.create_bucket("b").await.unwrap();
        let stored = backend.put_object(put("b", "a.txt", "one")).await.unwrap();

        let mut request = get("b", "a.txt");
        request.conditions.if_none_match = stored.etag.clone();
        let err = backend.get_object(request).await.err().unwrap();
        assert_eq!(err.status(), Some(304));

        let mut request = get("b", "a.txt");
        request.conditions.if_match = Some("\"other\"".to_string());
        let err = backend.get_object(request).await.err().unwrap();
        assert_eq!(err.status(), Some(412));
    }

    #[tokio::test]
    async fn test_batch_limit() {
        let backend = InMemoryS3Backend::new();
        backend.create_bucket("b").await.unwrap();

        let objects = (0..=MAX_DELETE_BATCH)
            .map(|i| ObjectToDelete::new(format!("{}.txt", i), None))
            .collect();
        let err = backend.delete_objects("b", objects).await.err().unwrap();
        assert!(err.has_code(codes::MALFORMED_XML));
    }

    #[tokio::test]
    async fn test_injected_failure_is_one_shot() {
        let backend = InMemoryS3Backend::new();
        backend
            .fail_next(
                Operation::CreateBucket,
                TransportError::Dispatch {
                    message: "connection reset".to_string(),
                },
            )
            .await;

        assert!(backend.create_bucket("b").await.is_err());
        assert!(backend.create_bucket("b").await.is_ok());
        assert_eq!(backend.call_count(Operation::CreateBucket).await, 2);
    }
}
