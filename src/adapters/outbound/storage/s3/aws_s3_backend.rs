use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, BucketVersioningStatus as AwsVersioningStatus,
    CreateBucketConfiguration, Delete, ObjectIdentifier, ObjectLockMode, StorageClass as AwsStorageClass,
    VersioningConfiguration,
};
use aws_sdk_s3::Client;
use futures::StreamExt;
use tokio_util::io::ReaderStream;
use tracing::debug;

use super::convert::{
    delete_marker_meta, object_meta, to_chrono, to_smithy, version_meta, versioning_status,
};
use super::{create_s3_client, S3Config};
use crate::{
    adapters::outbound::storage::error::{build_error, transport_error},
    domain::{
        errors::{TransportError, TransportResult},
        models::{
            BucketEntry, BucketVersioningStatus, DeleteObjectError, GetObjectInfo, ObjectToDelete,
            StorageClass,
        },
    },
    ports::storage::{
        GetObjectRequest, ListObjectVersionsPage, ListObjectVersionsRequest, ListObjectsPage,
        ListObjectsRequest, PutObjectRequest, RawDeleteObject, RawDeleteObjects, RawGetObject,
        RawPutObject, S3Backend,
    },
};

/// Region whose buckets must not carry a location constraint
const DEFAULT_REGION: &str = "us-east-1";

/// S3Backend backed by the AWS SDK client
#[derive(Clone, Debug)]
pub struct AwsS3Backend {
    client: Client,
    region: String,
}

impl AwsS3Backend {
    pub fn new(client: Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    pub async fn from_config(config: &S3Config) -> Self {
        Self::new(create_s3_client(config).await, config.region.clone())
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn max_keys(value: usize) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[async_trait]
impl S3Backend for AwsS3Backend {
    async fn create_bucket(&self, bucket: &str) -> TransportResult<()> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if self.region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        request.send().await.map_err(transport_error)?;
        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> TransportResult<()> {
        self.client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(transport_error)?;
        Ok(())
    }

    async fn head_bucket(&self, bucket: &str) -> TransportResult<()> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(transport_error)?;
        Ok(())
    }

    async fn list_buckets(&self) -> TransportResult<Vec<BucketEntry>> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(transport_error)?;

        Ok(output
            .buckets()
            .iter()
            .filter_map(|bucket| {
                Some(BucketEntry {
                    name: bucket.name()?.to_string(),
                    created_at: bucket.creation_date().and_then(to_chrono),
                })
            })
            .collect())
    }

    async fn get_bucket_versioning(&self, bucket: &str) -> TransportResult<BucketVersioningStatus> {
        let output = self
            .client
            .get_bucket_versioning()
            .bucket(bucket)
            .send()
            .await
            .map_err(transport_error)?;
        Ok(versioning_status(output.status()))
    }

    async fn put_bucket_versioning(
        &self,
        bucket: &str,
        status: BucketVersioningStatus,
    ) -> TransportResult<()> {
        let status = match status {
            BucketVersioningStatus::Enabled => AwsVersioningStatus::Enabled,
            BucketVersioningStatus::Suspended => AwsVersioningStatus::Suspended,
            BucketVersioningStatus::Unversioned => {
                return Err(TransportError::Request {
                    message: "versioning can only be enabled or suspended".to_string(),
                })
            }
        };

        self.client
            .put_bucket_versioning()
            .bucket(bucket)
            .versioning_configuration(VersioningConfiguration::builder().status(status).build())
            .send()
            .await
            .map_err(transport_error)?;
        Ok(())
    }

    async fn get_object(&self, request: GetObjectRequest) -> TransportResult<RawGetObject> {
        let conditions = request.conditions;
        let output = self
            .client
            .get_object()
            .bucket(request.bucket)
            .key(request.key)
            .set_version_id(request.version_id)
            .set_if_match(conditions.if_match)
            .set_if_none_match(conditions.if_none_match)
            .set_if_modified_since(conditions.if_modified_since.as_ref().map(to_smithy))
            .set_if_unmodified_since(conditions.if_unmodified_since.as_ref().map(to_smithy))
            .send()
            .await
            .map_err(transport_error)?;

        let info = GetObjectInfo {
            content_length: output.content_length().and_then(|l| u64::try_from(l).ok()),
            content_type: output.content_type().map(str::to_owned),
            content_encoding: output.content_encoding().map(str::to_owned),
            etag: output.e_tag().map(str::to_owned),
            version_id: output.version_id().map(str::to_owned),
            last_modified: output.last_modified().and_then(to_chrono),
            storage_class: output
                .storage_class()
                .map(|c| StorageClass::from(c.as_str())),
            metadata: output.metadata().cloned().unwrap_or_default(),
        };
        let body = ReaderStream::new(output.body.into_async_read()).boxed();

        Ok(RawGetObject {
            info,
            body: Some(body),
        })
    }

    async fn put_object(&self, request: PutObjectRequest) -> TransportResult<RawPutObject> {
        let options = request.options;
        let mut builder = self
            .client
            .put_object()
            .bucket(request.bucket)
            .key(request.key)
            .body(ByteStream::from(request.body))
            .set_content_type(options.content_type)
            .set_content_encoding(options.content_encoding)
            .set_content_disposition(options.content_disposition)
            .set_content_language(options.content_language)
            .set_storage_class(
                options
                    .storage_class
                    .map(|c| AwsStorageClass::from(c.as_str())),
            )
            .set_object_lock_mode(
                options
                    .object_lock_mode
                    .map(|m| ObjectLockMode::from(m.as_str())),
            )
            .set_ssekms_key_id(options.sse_kms_key_id);

        if !options.metadata.is_empty() {
            builder = builder.set_metadata(Some(options.metadata));
        }

        let output = builder.send().await.map_err(transport_error)?;
        Ok(RawPutObject {
            etag: output.e_tag().map(str::to_owned),
            version_id: output.version_id().map(str::to_owned),
        })
    }

    async fn delete_object(
        &self,
        bucket: &str,
        key: &str,
        version_id: Option<&str>,
    ) -> TransportResult<RawDeleteObject> {
        let output = self
            .client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .set_version_id(version_id.map(str::to_owned))
            .send()
            .await
            .map_err(transport_error)?;

        Ok(RawDeleteObject {
            version_id: output.version_id().map(str::to_owned),
            delete_marker: output.delete_marker().unwrap_or(false),
        })
    }

    async fn delete_objects(
        &self,
        bucket: &str,
        objects: Vec<ObjectToDelete>,
    ) -> TransportResult<RawDeleteObjects> {
        let identifiers = objects
            .into_iter()
            .map(|object| {
                ObjectIdentifier::builder()
                    .key(object.key)
                    .set_version_id(object.version_id)
                    .build()
                    .map_err(build_error)
            })
            .collect::<TransportResult<Vec<_>>>()?;
        debug!(bucket, count = identifiers.len(), "sending batch delete");

        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .quiet(false)
            .build()
            .map_err(build_error)?;

        let output = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await
            .map_err(transport_error)?;

        Ok(RawDeleteObjects {
            deleted: output
                .deleted()
                .iter()
                .filter_map(|d| {
                    Some(ObjectToDelete::new(
                        d.key()?,
                        d.version_id().map(str::to_owned),
                    ))
                })
                .collect(),
            errors: output
                .errors()
                .iter()
                .map(|e| DeleteObjectError {
                    key: e.key().unwrap_or_default().to_string(),
                    version_id: e.version_id().map(str::to_owned),
                    code: e.code().map(str::to_owned),
                    message: e.message().map(str::to_owned),
                })
                .collect(),
        })
    }

    async fn list_objects_v2(
        &self,
        request: ListObjectsRequest,
    ) -> TransportResult<ListObjectsPage> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(request.bucket)
            .set_prefix(request.prefix)
            .max_keys(max_keys(request.max_keys))
            .set_continuation_token(request.continuation_token)
            .send()
            .await
            .map_err(transport_error)?;

        Ok(ListObjectsPage {
            contents: output.contents().iter().filter_map(object_meta).collect(),
            is_truncated: output.is_truncated(),
            next_continuation_token: output.next_continuation_token().map(str::to_owned),
        })
    }

    async fn list_object_versions(
        &self,
        request: ListObjectVersionsRequest,
    ) -> TransportResult<ListObjectVersionsPage> {
        let output = self
            .client
            .list_object_versions()
            .bucket(request.bucket)
            .set_prefix(request.prefix)
            .max_keys(max_keys(request.max_keys))
            .set_key_marker(request.key_marker)
            .set_version_id_marker(request.version_id_marker)
            .send()
            .await
            .map_err(transport_error)?;

        Ok(ListObjectVersionsPage {
            versions: output.versions().iter().filter_map(version_meta).collect(),
            delete_markers: output
                .delete_markers()
                .iter()
                .filter_map(delete_marker_meta)
                .collect(),
            is_truncated: output.is_truncated(),
            next_key_marker: output.next_key_marker().map(str::to_owned),
            next_version_id_marker: output.next_version_id_marker().map(str::to_owned),
        })
    }

    async fn shutdown(&self) {
        // the SDK client releases its connection pool when the last clone drops
        debug!("aws s3 backend shut down");
    }
}
