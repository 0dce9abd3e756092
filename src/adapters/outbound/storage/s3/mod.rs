//! S3 storage backend on top of the AWS SDK
//!
//! Works against AWS S3 and S3-compatible services (MinIO, Ceph, LocalStack)
//! through a custom endpoint and path-style addressing.

mod aws_s3_backend;
mod convert;

pub use aws_s3_backend::AwsS3Backend;

use aws_config::BehaviorVersion;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client;

/// Attempts per request, first try included
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Configuration for S3 storage backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Config {
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub force_path_style: bool,
    pub max_attempts: u32,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: false,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl S3Config {
    /// Static credentials and path-style addressing against a custom endpoint
    pub fn s3_compatible(
        endpoint: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            access_key_id: Some(access_key_id.into()),
            secret_access_key: Some(secret_access_key.into()),
            force_path_style: true,
            ..Default::default()
        }
    }
}

/// Create an SDK client from configuration.
///
/// Without a static key pair the SDK's default credential chain is used.
/// Retries use the adaptive mode.
pub async fn create_s3_client(config: &S3Config) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(config.region.clone()))
        .retry_config(RetryConfig::adaptive().with_max_attempts(config.max_attempts.max(1)));

    if let (Some(access_key_id), Some(secret_access_key)) =
        (&config.access_key_id, &config.secret_access_key)
    {
        loader = loader.credentials_provider(Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "account-object-store",
        ));
    }

    let shared = loader.load().await;
    let mut builder = aws_sdk_s3::config::Builder::from(&shared);

    if let Some(endpoint) = &config.endpoint {
        builder = builder.endpoint_url(endpoint);
    }

    if config.force_path_style {
        builder = builder.force_path_style(true);
    }

    Client::from_conf(builder.build())
}
