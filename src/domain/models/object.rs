use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Storage classes reported by listings and accepted on upload
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StorageClass {
    #[default]
    Standard,
    ReducedRedundancy,
    StandardIa,
    OnezoneIa,
    IntelligentTiering,
    Glacier,
    GlacierIr,
    DeepArchive,
    Outposts,
    Snow,
    ExpressOnezone,
    Other(String),
}

impl StorageClass {
    pub fn as_str(&self) -> &str {
        match self {
            StorageClass::Standard => "STANDARD",
            StorageClass::ReducedRedundancy => "REDUCED_REDUNDANCY",
            StorageClass::StandardIa => "STANDARD_IA",
            StorageClass::OnezoneIa => "ONEZONE_IA",
            StorageClass::IntelligentTiering => "INTELLIGENT_TIERING",
            StorageClass::Glacier => "GLACIER",
            StorageClass::GlacierIr => "GLACIER_IR",
            StorageClass::DeepArchive => "DEEP_ARCHIVE",
            StorageClass::Outposts => "OUTPOSTS",
            StorageClass::Snow => "SNOW",
            StorageClass::ExpressOnezone => "EXPRESS_ONEZONE",
            StorageClass::Other(s) => s,
        }
    }
}

impl From<&str> for StorageClass {
    fn from(value: &str) -> Self {
        match value {
            "STANDARD" => StorageClass::Standard,
            "REDUCED_REDUNDANCY" => StorageClass::ReducedRedundancy,
            "STANDARD_IA" => StorageClass::StandardIa,
            "ONEZONE_IA" => StorageClass::OnezoneIa,
            "INTELLIGENT_TIERING" => StorageClass::IntelligentTiering,
            "GLACIER" => StorageClass::Glacier,
            "GLACIER_IR" => StorageClass::GlacierIr,
            "DEEP_ARCHIVE" => StorageClass::DeepArchive,
            "OUTPOSTS" => StorageClass::Outposts,
            "SNOW" => StorageClass::Snow,
            "EXPRESS_ONEZONE" => StorageClass::ExpressOnezone,
            other => StorageClass::Other(other.to_string()),
        }
    }
}

impl std::fmt::Display for StorageClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A live object as returned by a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub key: String,
    pub last_modified_at: DateTime<Utc>,
    pub storage_class: StorageClass,
    pub size: u64,
    pub etag: Option<String>,
}

impl ObjectMeta {
    pub fn to_delete(&self) -> ObjectToDelete {
        ObjectToDelete::new(self.key.clone(), None)
    }
}

/// One entry of a version listing: a stored version or a delete marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectVersionMeta {
    pub key: String,
    pub version_id: String,
    pub last_modified_at: DateTime<Utc>,
    pub storage_class: Option<StorageClass>,
    /// Always 0 for delete markers
    pub size: u64,
    pub is_latest: bool,
    pub is_delete_marker: bool,
}

impl ObjectVersionMeta {
    pub fn to_delete(&self) -> ObjectToDelete {
        ObjectToDelete::new(self.key.clone(), Some(self.version_id.clone()))
    }
}

/// Entry of a batch delete request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectToDelete {
    pub key: String,
    pub version_id: Option<String>,
}

impl ObjectToDelete {
    pub fn new(key: impl Into<String>, version_id: Option<String>) -> Self {
        Self {
            key: key.into(),
            version_id,
        }
    }
}

/// Per-key failure reported inside a successful batch delete response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteObjectError {
    pub key: String,
    pub version_id: Option<String>,
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketEntry {
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BucketVersioningStatus {
    /// Versioning was never enabled on the bucket
    #[default]
    Unversioned,
    Enabled,
    Suspended,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_class_parsing() {
        assert_eq!(StorageClass::from("STANDARD"), StorageClass::Standard);
        assert_eq!(StorageClass::from("GLACIER_IR"), StorageClass::GlacierIr);
        assert_eq!(
            StorageClass::from("COLD"),
            StorageClass::Other("COLD".to_string())
        );
        assert_eq!(StorageClass::StandardIa.as_str(), "STANDARD_IA");
    }

    #[test]
    fn test_version_to_delete_keeps_version_id() {
        let version = ObjectVersionMeta {
            key: "account1/a.txt".to_string(),
            version_id: "v1".to_string(),
            last_modified_at: Utc::now(),
            storage_class: None,
            size: 0,
            is_latest: true,
            is_delete_marker: true,
        };
        assert_eq!(
            version.to_delete(),
            ObjectToDelete::new("account1/a.txt", Some("v1".to_string()))
        );
    }
}
