use std::collections::HashMap;

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use futures::StreamExt;
use serde::Serialize;

use super::{BucketEntry, Operation, StorageClass, TextEncoding};
use crate::domain::errors::{S3Error, S3Result, TransportError};
use crate::domain::value_objects::S3ObjectId;

/// Streamed object payload
pub type BodyStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Response headers of a GET
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetObjectInfo {
    pub content_length: Option<u64>,
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub etag: Option<String>,
    pub version_id: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub storage_class: Option<StorageClass>,
    pub metadata: HashMap<String, String>,
}

/// Result of a GET. The body can be consumed once, as bytes, text or a stream.
pub struct GetObjectOutput {
    id: S3ObjectId,
    info: GetObjectInfo,
    body: Option<BodyStream>,
}

impl GetObjectOutput {
    pub fn new(id: S3ObjectId, info: GetObjectInfo, body: Option<BodyStream>) -> Self {
        Self { id, info, body }
    }

    pub fn id(&self) -> &S3ObjectId {
        &self.id
    }

    pub fn info(&self) -> &GetObjectInfo {
        &self.info
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn get_as_stream(self) -> S3Result<BodyStream> {
        let Self { id, body, .. } = self;
        body.ok_or(S3Error::EmptyBody { id })
    }

    pub async fn get_as_bytes(self) -> S3Result<Bytes> {
        let mut stream = self.get_as_stream()?;
        let mut buffer = BytesMut::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| body_error(e.to_string()))?;
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer.freeze())
    }

    pub async fn get_as_string(self, encoding: TextEncoding) -> S3Result<String> {
        let bytes = self.get_as_bytes().await?;
        encoding.decode(&bytes).map_err(body_error)
    }
}

impl std::fmt::Debug for GetObjectOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GetObjectOutput")
            .field("id", &self.id)
            .field("info", &self.info)
            .field("has_body", &self.has_body())
            .finish()
    }
}

fn body_error(message: String) -> S3Error {
    S3Error::internal(Operation::GetObject, TransportError::Body { message })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObjectOutput {
    pub id: S3ObjectId,
    pub etag: Option<String>,
    version_id: Option<String>,
}

impl PutObjectOutput {
    pub fn new(id: S3ObjectId, etag: Option<String>, version_id: Option<String>) -> Self {
        Self {
            id,
            etag,
            version_id,
        }
    }

    /// Version created by the upload.
    ///
    /// # Panics
    ///
    /// When the bucket is not versioned. Asking for a version there is a bug
    /// in the caller; use [`PutObjectOutput::try_version_id`] when unsure.
    pub fn version_id(&self) -> &str {
        match self.version_id.as_deref() {
            Some(version_id) => version_id,
            None => panic!("no version id returned for {}, bucket is not versioned", self.id),
        }
    }

    pub fn try_version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteObjectOutput {
    pub id: S3ObjectId,
    pub version_id: Option<String>,
    pub delete_marker: bool,
}

/// Summary of a bulk delete
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteObjectsOutput {
    pub bucket: String,
    pub prefix: Option<String>,
    pub deleted: usize,
    pub failed: usize,
    pub batches: usize,
}

impl DeleteObjectsOutput {
    pub fn new(bucket: impl Into<String>, prefix: Option<String>) -> Self {
        Self {
            bucket: bucket.into(),
            prefix,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListBucketsOutput {
    /// Bucket names with the client's bucket prefix stripped
    pub names: Vec<String>,
    /// Raw listing, including buckets outside the prefix
    pub buckets: Vec<BucketEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(body: Option<&'static [u8]>) -> GetObjectOutput {
        let id = S3ObjectId::new_unchecked("bucket", "a.txt", None);
        let body = body.map(|b| {
            futures::stream::iter(vec![
                Ok(Bytes::from_static(&b[..1])),
                Ok(Bytes::from_static(&b[1..])),
            ])
            .boxed()
        });
        GetObjectOutput::new(id, GetObjectInfo::default(), body)
    }

    #[tokio::test]
    async fn test_get_as_string_joins_chunks() {
        let out = output(Some(b"test_body"));
        assert!(out.has_body());
        assert_eq!(out.get_as_string(TextEncoding::Utf8).await.unwrap(), "test_body");
    }

    #[tokio::test]
    async fn test_missing_body_is_empty_body_error() {
        let out = output(None);
        assert!(!out.has_body());
        let err = out.get_as_bytes().await.unwrap_err();
        assert!(matches!(err, S3Error::EmptyBody { .. }));
        assert_eq!(err.error_type(), "core.infra.s3.empty_body");
    }

    #[test]
    fn test_put_output_version_id() {
        let id = S3ObjectId::new_unchecked("bucket", "a.txt", None);
        let out = PutObjectOutput::new(id.clone(), None, Some("v1".to_string()));
        assert_eq!(out.version_id(), "v1");

        let unversioned = PutObjectOutput::new(id, None, None);
        assert_eq!(unversioned.try_version_id(), None);
    }

    #[test]
    #[should_panic(expected = "bucket is not versioned")]
    fn test_put_output_version_id_panics_when_unversioned() {
        let id = S3ObjectId::new_unchecked("bucket", "a.txt", None);
        PutObjectOutput::new(id, None, None).version_id();
    }
}
