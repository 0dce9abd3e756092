use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

use super::AccountsSharedBucketCommon;
use crate::{
    domain::{
        errors::S3Result,
        models::{
            DeleteObjectOutput, DeleteObjectsOutput, GetObjectOptions, GetObjectOutput,
            PutObjectOptions, PutObjectOutput,
        },
    },
    ports::{account::AccountContext, services::AccountsBucket},
    services::s3_client::S3,
};

/// Account-scoped view of a shared bucket with versioning enabled.
///
/// `delete` removes every version of a key (delete markers included), so
/// nothing of it stays recoverable; `delete_version` removes a single one.
#[derive(Clone, Debug)]
pub struct AccountsSharedVersioningBucket {
    common: AccountsSharedBucketCommon,
}

impl AccountsSharedVersioningBucket {
    pub fn new(s3: Arc<S3>, account: Arc<dyn AccountContext>, bucket: impl Into<String>) -> Self {
        Self {
            common: AccountsSharedBucketCommon::new(s3, account, bucket),
        }
    }

    pub fn common(&self) -> &AccountsSharedBucketCommon {
        &self.common
    }

    pub async fn delete_version(
        &self,
        key: &str,
        version_id: impl Into<String> + Send,
    ) -> S3Result<DeleteObjectOutput> {
        let id = self.common.object_id(key, Some(version_id.into()))?;
        debug!(bucket = %id.bucket(), key = %id.key(), version_id = ?id.version_id(), "delete version");
        self.common.s3().delete_object(&id).await
    }
}

#[async_trait]
impl AccountsBucket for AccountsSharedVersioningBucket {
    type GetOptions = GetObjectOptions;
    type DeleteOutput = DeleteObjectsOutput;

    fn bucket(&self) -> &str {
        self.common.bucket()
    }

    async fn get(&self, key: &str, options: GetObjectOptions) -> S3Result<GetObjectOutput> {
        self.common
            .get(key, options.version_id, &options.conditions)
            .await
    }

    async fn put(
        &self,
        key: &str,
        body: Bytes,
        options: PutObjectOptions,
    ) -> S3Result<PutObjectOutput> {
        self.common.put(key, body, options).await
    }

    async fn delete(&self, key: &str) -> S3Result<DeleteObjectsOutput> {
        let id = self.common.object_id(key, None)?;
        debug!(bucket = %id.bucket(), key = %id.key(), "delete all versions");
        self.common.s3().delete_all_object_versions(&id).await
    }

    async fn delete_recursive(&self, prefix: &str) -> S3Result<DeleteObjectsOutput> {
        self.common.delete_recursive(prefix, true).await
    }
}
