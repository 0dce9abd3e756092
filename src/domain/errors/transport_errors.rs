/// Service error codes the client layer reacts to.
pub mod codes {
    pub const NO_SUCH_BUCKET: &str = "NoSuchBucket";
    pub const NO_SUCH_KEY: &str = "NoSuchKey";
    pub const NO_SUCH_VERSION: &str = "NoSuchVersion";
    pub const NOT_FOUND: &str = "NotFound";
    pub const BUCKET_ALREADY_OWNED_BY_YOU: &str = "BucketAlreadyOwnedByYou";
    pub const BUCKET_ALREADY_EXISTS: &str = "BucketAlreadyExists";
    pub const BUCKET_NOT_EMPTY: &str = "BucketNotEmpty";
    pub const PRECONDITION_FAILED: &str = "PreconditionFailed";
    pub const NOT_MODIFIED: &str = "NotModified";
    pub const METHOD_NOT_ALLOWED: &str = "MethodNotAllowed";
    pub const MALFORMED_XML: &str = "MalformedXML";
    pub const INVALID_ARGUMENT: &str = "InvalidArgument";
}

/// Raw failure reported by an [`S3Backend`](crate::ports::S3Backend).
///
/// Keeps whatever the wire gave us (error code, HTTP status, message) so the
/// client layer can map well-known cases and pass the rest through opaquely.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("service error {} (status {}): {message}", .code.as_deref().unwrap_or("<none>"), .status.map(|s| s.to_string()).unwrap_or_else(|| "?".to_string()))]
    Service {
        code: Option<String>,
        status: Option<u16>,
        message: String,
    },

    #[error("dispatch failure: {message}")]
    Dispatch { message: String },

    #[error("invalid request: {message}")]
    Request { message: String },

    #[error("failed to read response body: {message}")]
    Body { message: String },

    #[error("client has been shut down")]
    Closed,
}

pub type TransportResult<T> = Result<T, TransportError>;

impl TransportError {
    pub fn service(code: &str, status: u16, message: impl Into<String>) -> Self {
        TransportError::Service {
            code: Some(code.to_string()),
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            TransportError::Service { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Service { status, .. } => *status,
            _ => None,
        }
    }

    pub fn has_code(&self, expected: &str) -> bool {
        self.code() == Some(expected)
    }

    /// HTTP 404, or one of the not-found codes when the status was lost.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
            || self.has_code(codes::NOT_FOUND)
            || self.has_code(codes::NO_SUCH_BUCKET)
    }
}
