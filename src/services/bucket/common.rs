use bytes::Bytes;
use std::sync::Arc;
use tracing::debug;

use crate::{
    domain::{
        errors::{S3Error, S3Result},
        models::{
            DeleteObjectsOutput, DeletePrefix, GetObjectConditions, GetObjectOutput,
            PutObjectOptions, PutObjectOutput,
        },
        value_objects::S3ObjectId,
    },
    ports::account::AccountContext,
    services::s3_client::S3,
};

/// Key prefixing and identifier building shared by the account buckets.
///
/// The account is resolved on every call, never cached.
#[derive(Clone)]
pub struct AccountsSharedBucketCommon {
    s3: Arc<S3>,
    account: Arc<dyn AccountContext>,
    bucket: String,
}

impl AccountsSharedBucketCommon {
    pub fn new(s3: Arc<S3>, account: Arc<dyn AccountContext>, bucket: impl Into<String>) -> Self {
        Self {
            s3,
            account,
            bucket: bucket.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn s3(&self) -> &S3 {
        &self.s3
    }

    /// `<account id>/` of the current account
    pub fn account_prefix(&self) -> String {
        self.account.current_account().key_prefix()
    }

    pub fn prefixed_key(&self, key: &str) -> String {
        format!("{}{}", self.account_prefix(), key)
    }

    /// Validated id of `key` inside the current account's key space
    pub fn object_id(&self, key: &str, version_id: Option<String>) -> S3Result<S3ObjectId> {
        S3ObjectId::new(self.bucket.as_str(), self.prefixed_key(key), version_id)
    }

    pub async fn get(
        &self,
        key: &str,
        version_id: Option<String>,
        conditions: &GetObjectConditions,
    ) -> S3Result<GetObjectOutput> {
        let id = self.object_id(key, version_id)?;
        debug!(bucket = %self.bucket, key = %id.key(), "get object");
        self.s3.get_object(&id, conditions).await
    }

    pub async fn put(
        &self,
        key: &str,
        body: Bytes,
        options: PutObjectOptions,
    ) -> S3Result<PutObjectOutput> {
        let id = self.object_id(key, None)?;
        debug!(bucket = %self.bucket, key = %id.key(), size = body.len(), "put object");
        self.s3.put_object(&id, body, options).await
    }

    /// Prefix for a recursive delete; empty prefixes would reach the whole
    /// account and are refused.
    pub fn recursive_prefix(&self, prefix: &str) -> S3Result<DeletePrefix> {
        if prefix.is_empty() {
            return Err(S3Error::EmptyKeyPrefix);
        }
        Ok(DeletePrefix::Prefix(self.prefixed_key(prefix)))
    }

    pub async fn delete_recursive(
        &self,
        prefix: &str,
        versions: bool,
    ) -> S3Result<DeleteObjectsOutput> {
        let prefix = self.recursive_prefix(prefix)?;
        debug!(bucket = %self.bucket, prefix = ?prefix.as_prefix(), versions, "delete recursive");
        if versions {
            self.s3.delete_objects_versions(&self.bucket, prefix).await
        } else {
            self.s3.delete_objects(&self.bucket, prefix).await
        }
    }
}

impl std::fmt::Debug for AccountsSharedBucketCommon {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountsSharedBucketCommon")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::storage::InMemoryS3Backend;
    use crate::domain::value_objects::AccountId;
    use crate::ports::account::StaticAccountContext;

    fn common() -> AccountsSharedBucketCommon {
        let s3 = Arc::new(S3::new(Arc::new(InMemoryS3Backend::new())));
        let account = StaticAccountContext::new(AccountId::new("account1").unwrap());
        AccountsSharedBucketCommon::new(s3, Arc::new(account), "shared")
    }

    #[test]
    fn test_object_id_is_prefixed() {
        let id = common().object_id("docs/a.txt", None).unwrap();
        assert_eq!(id.bucket(), "shared");
        assert_eq!(id.key(), "account1/docs/a.txt");
    }

    #[test]
    fn test_object_id_rejects_folders() {
        assert!(matches!(
            common().object_id("docs/", None),
            Err(S3Error::ObjectKeyIsNotFile { key }) if key == "account1/docs/"
        ));
    }

    #[test]
    fn test_recursive_prefix() {
        let common = common();
        assert!(matches!(
            common.recursive_prefix(""),
            Err(S3Error::EmptyKeyPrefix)
        ));
        assert_eq!(
            common.recursive_prefix("docs/").unwrap(),
            DeletePrefix::Prefix("account1/docs/".to_string())
        );
    }
}
