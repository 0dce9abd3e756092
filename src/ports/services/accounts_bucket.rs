use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::{
    errors::S3Result,
    models::{BodyStream, DeleteObjectsOutput, GetObjectOutput, PutObjectOptions, PutObjectOutput, TextEncoding},
};

/// A bucket shared by many accounts, each confined to `<account id>/`.
///
/// Keys passed in are bare (relative to the account); implementations prefix
/// them with the current account before talking to the store.
#[async_trait]
pub trait AccountsBucket: Send + Sync {
    /// Read options (`GetObjectConditions` or `GetObjectOptions`)
    type GetOptions: Default + Send + Sync + 'static;
    /// What a single-key delete reports
    type DeleteOutput: Send + 'static;

    /// Name of the shared bucket, without the client's bucket prefix
    fn bucket(&self) -> &str;

    async fn get(&self, key: &str, options: Self::GetOptions) -> S3Result<GetObjectOutput>;

    async fn get_as_string(
        &self,
        key: &str,
        options: Self::GetOptions,
        encoding: TextEncoding,
    ) -> S3Result<String> {
        self.get(key, options).await?.get_as_string(encoding).await
    }

    async fn get_as_stream(&self, key: &str, options: Self::GetOptions) -> S3Result<BodyStream> {
        self.get(key, options).await?.get_as_stream()
    }

    async fn put(
        &self,
        key: &str,
        body: Bytes,
        options: PutObjectOptions,
    ) -> S3Result<PutObjectOutput>;

    async fn delete(&self, key: &str) -> S3Result<Self::DeleteOutput>;

    /// Delete everything under `prefix` for the current account.
    /// An empty prefix is refused with `EmptyKeyPrefix`.
    async fn delete_recursive(&self, prefix: &str) -> S3Result<DeleteObjectsOutput>;
}
