// Infrastructure error conversion
pub mod error;

// Storage implementations
pub mod in_memory_s3_backend;
pub mod s3;

// Re-export key types
pub use in_memory_s3_backend::InMemoryS3Backend;
pub use s3::{create_s3_client, AwsS3Backend, S3Config};
