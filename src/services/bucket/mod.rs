mod accounts_shared_bucket;
mod accounts_shared_versioning_bucket;
mod common;

pub use accounts_shared_bucket::AccountsSharedBucket;
pub use accounts_shared_versioning_bucket::AccountsSharedVersioningBucket;
pub use common::AccountsSharedBucketCommon;
