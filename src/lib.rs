pub mod adapters;
pub mod app;
pub mod domain;
pub mod ports;
pub mod services;

// Re-export key types for convenience

// Domain types - identifiers, models and errors
pub use domain::{
    // Value objects
    AccountId,
    // Models
    BodyStream,
    BucketVersioningStatus,
    CreateBucketOptions,
    DeleteObjectOutput,
    DeleteObjectsOutput,
    DeletePrefix,
    GetObjectConditions,
    GetObjectOptions,
    GetObjectOutput,
    ListBucketsOutput,
    ObjectMeta,
    ObjectToDelete,
    ObjectVersionMeta,
    Operation,
    PutObjectOptions,
    PutObjectOutput,
    // Errors
    S3Error,
    S3ObjectId,
    S3Result,
    StorageClass,
    TextEncoding,
    TransportError,
};

// Port types - interfaces for external systems
pub use ports::{AccountContext, AccountsBucket, S3Backend, StaticAccountContext};

// Service implementations - client, cursors and account buckets
pub use services::{
    AccountsSharedBucket, AccountsSharedBucketCommon, AccountsSharedVersioningBucket, BulkDelete,
    ListObjectVersionsCursor, ListObjectsCursor, PageCursor, DEFAULT_PAGE_SIZE, S3,
};

// Application factory and configuration
pub use app::{
    create_app_from_env, create_in_memory_app, create_s3_app, AppBuilder, AppConfig, AppError,
    AppServices, StorageBackend,
};

// Adapter types - infrastructure implementations
pub use adapters::outbound::storage::{AwsS3Backend, InMemoryS3Backend, S3Config};

// Public facade for easy construction
pub mod prelude {
    pub use crate::{
        create_app_from_env, create_in_memory_app, create_s3_app, AccountContext, AccountId,
        AccountsBucket, AccountsSharedBucket, AccountsSharedVersioningBucket, AppBuilder,
        AppServices, CreateBucketOptions, DeletePrefix, GetObjectConditions, GetObjectOptions,
        PageCursor, PutObjectOptions, S3Error, S3ObjectId, S3Result, StaticAccountContext,
        TextEncoding, S3,
    };
}
