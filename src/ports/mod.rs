pub mod account;
pub mod services;
pub mod storage;

// Re-export all port traits for convenience
pub use account::{AccountContext, StaticAccountContext};
pub use services::AccountsBucket;
pub use storage::{
    GetObjectRequest, ListObjectVersionsPage, ListObjectVersionsRequest, ListObjectsPage,
    ListObjectsRequest, PutObjectRequest, RawDeleteObject, RawDeleteObjects, RawGetObject,
    RawPutObject, S3Backend, MAX_DELETE_BATCH,
};
