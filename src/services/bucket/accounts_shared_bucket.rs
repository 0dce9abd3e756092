use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use super::AccountsSharedBucketCommon;
use crate::{
    domain::{
        errors::S3Result,
        models::{
            DeleteObjectOutput, DeleteObjectsOutput, GetObjectConditions, GetObjectOutput,
            PutObjectOptions, PutObjectOutput,
        },
        value_objects::S3ObjectId,
    },
    ports::{account::AccountContext, services::AccountsBucket},
    services::s3_client::S3,
};

/// Account-scoped view of a shared bucket without versioning
#[derive(Clone, Debug)]
pub struct AccountsSharedBucket {
    common: AccountsSharedBucketCommon,
}

impl AccountsSharedBucket {
    pub fn new(s3: Arc<S3>, account: Arc<dyn AccountContext>, bucket: impl Into<String>) -> Self {
        Self {
            common: AccountsSharedBucketCommon::new(s3, account, bucket),
        }
    }

    pub fn common(&self) -> &AccountsSharedBucketCommon {
        &self.common
    }

    pub fn object_id(&self, key: &str) -> S3Result<S3ObjectId> {
        self.common.object_id(key, None)
    }
}

#[async_trait]
impl AccountsBucket for AccountsSharedBucket {
    type GetOptions = GetObjectConditions;
    type DeleteOutput = DeleteObjectOutput;

    fn bucket(&self) -> &str {
        self.common.bucket()
    }

    async fn get(&self, key: &str, options: GetObjectConditions) -> S3Result<GetObjectOutput> {
        self.common.get(key, None, &options).await
    }

    async fn put(
        &self,
        key: &str,
        body: Bytes,
        options: PutObjectOptions,
    ) -> S3Result<PutObjectOutput> {
        self.common.put(key, body, options).await
    }

    async fn delete(&self, key: &str) -> S3Result<DeleteObjectOutput> {
        let id = self.common.object_id(key, None)?;
        self.common.s3().delete_object(&id).await
    }

    async fn delete_recursive(&self, prefix: &str) -> S3Result<DeleteObjectsOutput> {
        self.common.delete_recursive(prefix, false).await
    }
}
