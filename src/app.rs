use std::sync::Arc;
use tracing::info;

use crate::{
    adapters::outbound::storage::{AwsS3Backend, InMemoryS3Backend, S3Config},
    ports::{account::AccountContext, storage::S3Backend},
    services::{AccountsSharedBucket, AccountsSharedVersioningBucket, S3},
};

/// Configuration for the application
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub storage_backend: StorageBackend,
    /// Prepended to every bucket name the client sends
    pub bucket_prefix: String,
}

/// Storage backend configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StorageBackend {
    #[default]
    InMemory,
    S3 {
        region: String,
        endpoint: Option<String>,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        force_path_style: bool,
    },
}

impl StorageBackend {
    pub fn from_s3_config(config: S3Config) -> Self {
        StorageBackend::S3 {
            region: config.region,
            endpoint: config.endpoint,
            access_key_id: config.access_key_id,
            secret_access_key: config.secret_access_key,
            force_path_style: config.force_path_style,
        }
    }
}

/// Application services container
#[derive(Clone, Debug)]
pub struct AppServices {
    pub s3: Arc<S3>,
}

impl AppServices {
    pub fn accounts_shared_bucket(
        &self,
        account: Arc<dyn AccountContext>,
        bucket: impl Into<String>,
    ) -> AccountsSharedBucket {
        AccountsSharedBucket::new(Arc::clone(&self.s3), account, bucket)
    }

    pub fn accounts_shared_versioning_bucket(
        &self,
        account: Arc<dyn AccountContext>,
        bucket: impl Into<String>,
    ) -> AccountsSharedVersioningBucket {
        AccountsSharedVersioningBucket::new(Arc::clone(&self.s3), account, bucket)
    }

    /// Stop the shared client; later calls through any bucket fail.
    pub async fn shutdown(&self) {
        self.s3.shutdown().await;
    }
}

/// Application builder for dependency injection
pub struct AppBuilder {
    config: AppConfig,
    backend: Option<Arc<dyn S3Backend>>,
}

impl AppBuilder {
    /// Create a new application builder
    pub fn new() -> Self {
        Self {
            config: AppConfig::default(),
            backend: None,
        }
    }

    /// Configure the application with custom settings
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = config;
        self
    }

    /// Configure storage backend
    pub fn with_storage_backend(mut self, backend: StorageBackend) -> Self {
        self.config.storage_backend = backend;
        self
    }

    pub fn with_bucket_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.bucket_prefix = prefix.into();
        self
    }

    /// Use an already constructed backend; the storage backend setting is ignored
    pub fn with_backend(mut self, backend: Arc<dyn S3Backend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Build the complete application with services
    pub async fn build(self) -> Result<AppServices, AppError> {
        let backend = match self.backend {
            Some(backend) => backend,
            None => create_backend(&self.config.storage_backend).await?,
        };

        info!(bucket_prefix = %self.config.bucket_prefix, "s3 client ready");
        Ok(AppServices {
            s3: Arc::new(S3::with_bucket_prefix(backend, self.config.bucket_prefix)),
        })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Create the storage backend based on configuration
async fn create_backend(storage: &StorageBackend) -> Result<Arc<dyn S3Backend>, AppError> {
    match storage {
        StorageBackend::InMemory => Ok(Arc::new(InMemoryS3Backend::new())),
        StorageBackend::S3 {
            region,
            endpoint,
            access_key_id,
            secret_access_key,
            force_path_style,
        } => {
            if region.is_empty() {
                return Err(AppError::Configuration {
                    message: "S3 region cannot be empty".to_string(),
                });
            }
            if access_key_id.is_some() != secret_access_key.is_some() {
                return Err(AppError::Configuration {
                    message: "S3 access key id and secret access key must be set together"
                        .to_string(),
                });
            }

            let config = S3Config {
                region: region.clone(),
                endpoint: endpoint.clone(),
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
                force_path_style: *force_path_style,
                ..Default::default()
            };
            info!(region = %config.region, endpoint = ?config.endpoint, "using S3 storage backend");
            Ok(Arc::new(AwsS3Backend::from_config(&config).await))
        }
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Convenience functions for common configurations
///
/// Create an in-memory application for testing and development
pub async fn create_in_memory_app() -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackend::InMemory)
        .build()
        .await
}

/// Create an S3-backed application
pub async fn create_s3_app(
    config: S3Config,
    bucket_prefix: impl Into<String>,
) -> Result<AppServices, AppError> {
    AppBuilder::new()
        .with_storage_backend(StorageBackend::from_s3_config(config))
        .with_bucket_prefix(bucket_prefix)
        .build()
        .await
}

/// Read the application configuration from environment variables
pub fn config_from_env() -> Result<AppConfig, AppError> {
    let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

    let storage_backend = match var("STORAGE_BACKEND").as_deref() {
        Some("s3") => StorageBackend::S3 {
            region: var("S3_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            endpoint: var("S3_ENDPOINT"),
            access_key_id: var("S3_ACCESS_KEY"),
            secret_access_key: var("S3_SECRET_KEY"),
            force_path_style: var("S3_FORCE_PATH_STYLE")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        },
        Some("memory") | None => StorageBackend::InMemory,
        Some(other) => {
            return Err(AppError::Configuration {
                message: format!("Unknown STORAGE_BACKEND '{}', expected 's3' or 'memory'", other),
            })
        }
    };

    Ok(AppConfig {
        storage_backend,
        bucket_prefix: var("S3_BUCKET_PREFIX").unwrap_or_default(),
    })
}

/// Create application from environment variables
pub async fn create_app_from_env() -> Result<AppServices, AppError> {
    AppBuilder::new().with_config(config_from_env()?).build().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_app() {
        let app = create_in_memory_app().await.unwrap();
        assert_eq!(app.s3.bucket_prefix(), "");
        assert!(!app.s3.is_closed());

        app.shutdown().await;
        assert!(app.s3.is_closed());
    }

    #[tokio::test]
    async fn test_mismatched_credentials_are_rejected() {
        let result = AppBuilder::new()
            .with_storage_backend(StorageBackend::S3 {
                region: "us-east-1".to_string(),
                endpoint: None,
                access_key_id: Some("key".to_string()),
                secret_access_key: None,
                force_path_style: false,
            })
            .build()
            .await;

        assert!(matches!(result, Err(AppError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_custom_backend_and_prefix() {
        let backend = InMemoryS3Backend::new();
        let app = AppBuilder::new()
            .with_backend(Arc::new(backend.clone()))
            .with_bucket_prefix("test-")
            .build()
            .await
            .unwrap();

        app.s3
            .create_bucket("files", Default::default())
            .await
            .unwrap();
        assert!(backend.head_bucket("test-files").await.is_ok());
    }
}
