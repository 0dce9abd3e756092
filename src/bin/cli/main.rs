use account_object_store::{
    app::{AppBuilder, AppConfig, AppServices, StorageBackend},
    AccountId, AccountsBucket, CreateBucketOptions, GetObjectConditions, GetObjectOptions,
    PageCursor, PutObjectOptions, StaticAccountContext,
};
use anyhow::{Context, Result};
use bytes::Bytes;
use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use std::{path::PathBuf, str::FromStr, sync::Arc};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

#[derive(Parser, Debug)]
#[command(name = "account-object-store-cli")]
#[command(about = "Manage account-scoped objects in S3-compatible storage", long_about = None)]
struct Cli {
    /// Storage backend type (s3 or memory)
    #[arg(long, env = "STORAGE_BACKEND", default_value = "s3")]
    storage_backend: String,

    /// S3 endpoint URL (for MinIO and other S3-compatible services)
    #[arg(long, env = "S3_ENDPOINT")]
    s3_endpoint: Option<String>,

    /// S3 region
    #[arg(long, env = "S3_REGION", default_value = "us-east-1")]
    s3_region: String,

    /// S3 access key
    #[arg(long, env = "S3_ACCESS_KEY")]
    s3_access_key: Option<String>,

    /// S3 secret key
    #[arg(long, env = "S3_SECRET_KEY")]
    s3_secret_key: Option<String>,

    /// Use path-style addressing
    #[arg(long, env = "S3_FORCE_PATH_STYLE", default_value = "false")]
    s3_force_path_style: bool,

    /// Prefix prepended to every bucket name
    #[arg(long, env = "S3_BUCKET_PREFIX", default_value = "")]
    bucket_prefix: String,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

/// Where an object command operates
#[derive(Args, Debug)]
struct AccountTarget {
    /// Shared bucket name
    #[arg(short, long, env = "ACCOUNT_BUCKET")]
    bucket: String,

    /// Account whose key space is used
    #[arg(short, long, env = "ACCOUNT_ID")]
    account: String,

    /// Treat the bucket as versioned
    #[arg(long)]
    versioning: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List buckets visible through the bucket prefix
    Buckets,

    /// Create a bucket
    CreateBucket {
        bucket: String,
        /// Enable versioning
        #[arg(long)]
        versioning: bool,
    },

    /// Delete a bucket
    DeleteBucket {
        bucket: String,
        /// Delete all objects (and versions) first
        #[arg(long)]
        force: bool,
    },

    /// Check whether a bucket exists
    ExistsBucket { bucket: String },

    /// Upload a file
    Put {
        /// Object key, relative to the account
        key: String,
        /// File path to upload
        file: PathBuf,
        #[command(flatten)]
        target: AccountTarget,
        /// Content type
        #[arg(long)]
        content_type: Option<String>,
    },

    /// Download an object
    Get {
        /// Object key, relative to the account
        key: String,
        #[command(flatten)]
        target: AccountTarget,
        /// Output file path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Version to fetch (versioned buckets)
        #[arg(long)]
        version_id: Option<String>,
    },

    /// Delete an object (every version of it in versioned buckets)
    Delete {
        key: String,
        #[command(flatten)]
        target: AccountTarget,
    },

    /// Delete everything under a prefix
    DeleteRecursive {
        prefix: String,
        #[command(flatten)]
        target: AccountTarget,
    },

    /// Delete one version of an object
    DeleteVersion {
        key: String,
        version_id: String,
        #[command(flatten)]
        target: AccountTarget,
    },

    /// List objects of a bucket
    List {
        bucket: String,
        /// Key prefix
        #[arg(short, long)]
        prefix: Option<String>,
        /// List versions and delete markers
        #[arg(long)]
        versions: bool,
        /// Keys per request
        #[arg(long, default_value = "50")]
        page_size: usize,
        /// Print one JSON document per entry
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    fn to_app_config(&self) -> Result<AppConfig> {
        let storage_backend = match self.storage_backend.as_str() {
            "memory" => StorageBackend::InMemory,
            "s3" => StorageBackend::S3 {
                region: self.s3_region.clone(),
                endpoint: self.s3_endpoint.clone(),
                access_key_id: self.s3_access_key.clone(),
                secret_access_key: self.s3_secret_key.clone(),
                force_path_style: self.s3_force_path_style,
            },
            _ => anyhow::bail!("Unknown storage backend: {}", self.storage_backend),
        };

        Ok(AppConfig {
            storage_backend,
            bucket_prefix: self.bucket_prefix.clone(),
        })
    }

    fn init_logging(&self) -> Result<()> {
        let level = LevelFilter::from_str(&self.log_level)
            .with_context(|| format!("Invalid log level: {}", self.log_level))?;

        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_filter(level),
            )
            .init();

        Ok(())
    }
}

impl AccountTarget {
    fn account(&self) -> Result<Arc<StaticAccountContext>> {
        let account = AccountId::new(self.account.as_str())
            .with_context(|| format!("Invalid account id: {}", self.account))?;
        Ok(Arc::new(StaticAccountContext::new(account)))
    }
}

async fn write_body<B: AccountsBucket>(
    bucket: &B,
    key: &str,
    options: B::GetOptions,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut body = bucket
        .get_as_stream(key, options)
        .await
        .with_context(|| format!("Failed to get {}", key))?;

    let mut writer: Box<dyn AsyncWrite + Unpin + Send> = match &output {
        Some(path) => Box::new(
            tokio::fs::File::create(path)
                .await
                .with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(tokio::io::stdout()),
    };

    while let Some(chunk) = body.next().await {
        writer.write_all(&chunk.context("Failed to read object body")?).await?;
    }
    writer.flush().await?;
    Ok(())
}

async fn run(app: &AppServices, command: Commands) -> Result<()> {
    let s3 = &app.s3;

    match command {
        Commands::Buckets => {
            for name in s3.list_bucket_names().await? {
                println!("{}", name);
            }
        }
        Commands::CreateBucket { bucket, versioning } => {
            s3.create_bucket(&bucket, CreateBucketOptions { versioning })
                .await
                .with_context(|| format!("Failed to create bucket {}", bucket))?;
            println!("created {}", bucket);
        }
        Commands::DeleteBucket { bucket, force } => {
            s3.delete_bucket(&bucket, force)
                .await
                .with_context(|| format!("Failed to delete bucket {}", bucket))?;
            println!("deleted {}", bucket);
        }
        Commands::ExistsBucket { bucket } => {
            println!("{}", s3.exists_bucket(&bucket).await?);
        }
        Commands::Put {
            key,
            file,
            target,
            content_type,
        } => {
            let body = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let options = PutObjectOptions {
                content_type,
                ..Default::default()
            };
            let account = target.account()?;

            let output = if target.versioning {
                app.accounts_shared_versioning_bucket(account, target.bucket)
                    .put(&key, Bytes::from(body), options)
                    .await?
            } else {
                app.accounts_shared_bucket(account, target.bucket)
                    .put(&key, Bytes::from(body), options)
                    .await?
            };
            match output.try_version_id() {
                Some(version_id) => println!("{} {}", output.id, version_id),
                None => println!("{}", output.id),
            }
        }
        Commands::Get {
            key,
            target,
            output,
            version_id,
        } => {
            let account = target.account()?;
            if target.versioning {
                let bucket = app.accounts_shared_versioning_bucket(account, target.bucket);
                let options = GetObjectOptions {
                    version_id,
                    ..Default::default()
                };
                write_body(&bucket, &key, options, output).await?;
            } else {
                if version_id.is_some() {
                    anyhow::bail!("--version-id requires --versioning");
                }
                let bucket = app.accounts_shared_bucket(account, target.bucket);
                write_body(&bucket, &key, GetObjectConditions::default(), output).await?;
            }
        }
        Commands::Delete { key, target } => {
            let account = target.account()?;
            if target.versioning {
                let deleted = app
                    .accounts_shared_versioning_bucket(account, target.bucket)
                    .delete(&key)
                    .await?;
                println!("deleted {} versions of {}", deleted.deleted, key);
            } else {
                app.accounts_shared_bucket(account, target.bucket)
                    .delete(&key)
                    .await?;
                println!("deleted {}", key);
            }
        }
        Commands::DeleteRecursive { prefix, target } => {
            let account = target.account()?;
            let deleted = if target.versioning {
                app.accounts_shared_versioning_bucket(account, target.bucket)
                    .delete_recursive(&prefix)
                    .await?
            } else {
                app.accounts_shared_bucket(account, target.bucket)
                    .delete_recursive(&prefix)
                    .await?
            };
            println!("{}", serde_json::to_string(&deleted)?);
        }
        Commands::DeleteVersion {
            key,
            version_id,
            target,
        } => {
            let account = target.account()?;
            app.accounts_shared_versioning_bucket(account, target.bucket)
                .delete_version(&key, version_id)
                .await?;
            println!("deleted {}", key);
        }
        Commands::List {
            bucket,
            prefix,
            versions,
            page_size,
            json,
        } => {
            if versions {
                let mut pages = s3
                    .list_objects_versions(&bucket, prefix.as_deref(), page_size)
                    .versions(true)
                    .into_stream();
                while let Some(page) = pages.next().await {
                    for version in page? {
                        if json {
                            println!("{}", serde_json::to_string(&version)?);
                        } else {
                            let marker = if version.is_delete_marker { " (delete marker)" } else { "" };
                            println!("{} {}{}", version.key, version.version_id, marker);
                        }
                    }
                }
            } else {
                let mut pages = s3
                    .list_objects(&bucket, prefix.as_deref(), page_size)
                    .into_stream();
                while let Some(page) = pages.next().await {
                    for object in page? {
                        if json {
                            println!("{}", serde_json::to_string(&object)?);
                        } else {
                            println!("{}\t{}", object.size, object.key);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.init_logging()?;

    let config = cli.to_app_config()?;
    debug!(backend = ?config.storage_backend, "building application");

    let app = AppBuilder::new()
        .with_config(config)
        .build()
        .await
        .context("Failed to build application")?;

    let result = run(&app, cli.command).await;
    app.shutdown().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "account-object-store-cli",
            "--storage-backend",
            "s3",
            "--s3-endpoint",
            "http://localhost:9000",
            "--s3-access-key",
            "minioadmin",
            "--s3-secret-key",
            "minioadmin",
            "put",
            "docs/a.txt",
            "./a.txt",
            "--bucket",
            "shared",
            "--account",
            "account1",
            "--versioning",
        ]);

        assert_eq!(cli.s3_endpoint.as_deref(), Some("http://localhost:9000"));
        match cli.command {
            Commands::Put { key, target, .. } => {
                assert_eq!(key, "docs/a.txt");
                assert_eq!(target.bucket, "shared");
                assert_eq!(target.account, "account1");
                assert!(target.versioning);
            }
            other => panic!("Expected put command, got {:?}", other),
        }
    }

    #[test]
    fn test_memory_config() {
        let cli = Cli::parse_from([
            "account-object-store-cli",
            "--storage-backend",
            "memory",
            "--bucket-prefix",
            "dev-",
            "buckets",
        ]);

        let config = cli.to_app_config().unwrap();
        assert_eq!(config.storage_backend, StorageBackend::InMemory);
        assert_eq!(config.bucket_prefix, "dev-");
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let cli = Cli::parse_from([
            "account-object-store-cli",
            "--storage-backend",
            "ftp",
            "buckets",
        ]);
        assert!(cli.to_app_config().is_err());
    }
}
