pub mod bucket;
pub mod bulk_delete;
pub mod listing;
pub mod s3_client;

pub use bucket::{AccountsSharedBucket, AccountsSharedBucketCommon, AccountsSharedVersioningBucket};
pub use bulk_delete::{BulkDelete, DeleteBatch};
pub use listing::{
    ListObjectVersionsCursor, ListObjectsCursor, ObjectKeys, ObjectsToDelete, PageCursor,
    VersionsToDelete,
};
pub use s3_client::{DEFAULT_PAGE_SIZE, S3};
