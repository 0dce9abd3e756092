use std::collections::HashMap;

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::StorageClass;

/// Conditional GET headers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetObjectConditions {
    pub if_match: Option<String>,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<DateTime<Utc>>,
    pub if_unmodified_since: Option<DateTime<Utc>>,
}

impl GetObjectConditions {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Read options of versioning buckets: conditions plus the version to fetch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetObjectOptions {
    pub version_id: Option<String>,
    pub conditions: GetObjectConditions,
}

impl GetObjectOptions {
    pub fn version(version_id: impl Into<String>) -> Self {
        Self {
            version_id: Some(version_id.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectLockMode {
    Governance,
    Compliance,
}

impl ObjectLockMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectLockMode::Governance => "GOVERNANCE",
            ObjectLockMode::Compliance => "COMPLIANCE",
        }
    }
}

/// Headers and metadata sent along with an upload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PutObjectOptions {
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub content_disposition: Option<String>,
    pub content_language: Option<String>,
    pub metadata: HashMap<String, String>,
    pub storage_class: Option<StorageClass>,
    pub object_lock_mode: Option<ObjectLockMode>,
    pub sse_kms_key_id: Option<String>,
}

impl PutObjectOptions {
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CreateBucketOptions {
    pub versioning: bool,
}

impl CreateBucketOptions {
    pub fn versioned() -> Self {
        Self { versioning: true }
    }
}

/// Scope of a bulk delete: the whole bucket or every key under a prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeletePrefix {
    All,
    Prefix(String),
}

impl DeletePrefix {
    pub fn as_prefix(&self) -> Option<&str> {
        match self {
            DeletePrefix::All => None,
            DeletePrefix::Prefix(prefix) => Some(prefix),
        }
    }
}

impl From<&str> for DeletePrefix {
    fn from(prefix: &str) -> Self {
        DeletePrefix::Prefix(prefix.to_string())
    }
}

impl From<String> for DeletePrefix {
    fn from(prefix: String) -> Self {
        DeletePrefix::Prefix(prefix)
    }
}

/// How an object body is turned into text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Latin1,
    Base64,
    Hex,
}

impl TextEncoding {
    pub fn decode(&self, bytes: &[u8]) -> Result<String, String> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| e.to_string()),
            TextEncoding::Latin1 => Ok(bytes.iter().map(|b| char::from(*b)).collect()),
            TextEncoding::Base64 => Ok(base64::engine::general_purpose::STANDARD.encode(bytes)),
            TextEncoding::Hex => Ok(bytes.iter().map(|b| format!("{:02x}", b)).collect()),
        }
    }
}

impl std::str::FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(TextEncoding::Utf8),
            "latin1" | "binary" => Ok(TextEncoding::Latin1),
            "base64" => Ok(TextEncoding::Base64),
            "hex" => Ok(TextEncoding::Hex),
            other => Err(format!("unknown text encoding: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_encodings() {
        let bytes = b"hi\xff";
        assert!(TextEncoding::Utf8.decode(bytes).is_err());
        assert_eq!(TextEncoding::Latin1.decode(bytes).unwrap(), "hi\u{ff}");
        assert_eq!(TextEncoding::Base64.decode(b"hello").unwrap(), "aGVsbG8=");
        assert_eq!(TextEncoding::Hex.decode(bytes).unwrap(), "6869ff");
        assert_eq!("UTF-8".parse::<TextEncoding>(), Ok(TextEncoding::Utf8));
    }

    #[test]
    fn test_delete_prefix() {
        assert_eq!(DeletePrefix::All.as_prefix(), None);
        assert_eq!(DeletePrefix::from("account1/").as_prefix(), Some("account1/"));
    }
}
