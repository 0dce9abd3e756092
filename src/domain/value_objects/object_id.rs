use crate::domain::errors::{S3Error, S3Result};

/// Identifies one object (optionally one version of it) in a bucket.
///
/// Keys built through [`S3ObjectId::new`] must name a file, i.e. the last path
/// segment carries a non-empty extension (`reports/2024.csv`, not `reports/`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct S3ObjectId {
    bucket: String,
    key: String,
    version_id: Option<String>,
}

impl S3ObjectId {
    /// Create a new identifier, rejecting keys without a file extension.
    /// A trailing dot is no extension, so `file.` and `a..` are rejected too.
    pub fn new(
        bucket: impl Into<String>,
        key: impl Into<String>,
        version_id: Option<String>,
    ) -> S3Result<Self> {
        let key = key.into();
        if file_extension(&key).is_none() {
            return Err(S3Error::ObjectKeyIsNotFile { key });
        }

        Ok(Self::new_unchecked(bucket, key, version_id))
    }

    /// Create an identifier without validating the key.
    pub fn new_unchecked(
        bucket: impl Into<String>,
        key: impl Into<String>,
        version_id: Option<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
            version_id,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn version_id(&self) -> Option<&str> {
        self.version_id.as_deref()
    }

    pub fn with_version_id(mut self, version_id: impl Into<String>) -> Self {
        self.version_id = Some(version_id.into());
        self
    }

    /// Extension of the key's last segment, without the dot
    pub fn extension(&self) -> Option<&str> {
        file_extension(&self.key)
    }
}

impl std::fmt::Display for S3ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)?;
        if let Some(version_id) = &self.version_id {
            write!(f, "?versionId={}", version_id)?;
        }
        Ok(())
    }
}

fn file_extension(key: &str) -> Option<&str> {
    let file_name = key.rfind('/').map_or(key, |idx| &key[idx + 1..]);
    match file_name.rfind('.') {
        Some(0) | None => None,
        Some(idx) if idx + 1 == file_name.len() => None,
        Some(idx) => Some(&file_name[idx + 1..]),
    }
}
