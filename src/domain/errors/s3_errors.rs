use http::StatusCode;

use super::TransportError;
use crate::domain::models::Operation;
use crate::domain::value_objects::S3ObjectId;

/// Errors surfaced by the S3 client and the account buckets.
///
/// Every variant has a stable type string ([`S3Error::error_type`]) and an
/// HTTP-like status ([`S3Error::status_code`]). Anything the client does not
/// recognise ends up in [`S3Error::Internal`] with the transport error kept
/// as the source.
#[derive(Debug, Clone, thiserror::Error)]
pub enum S3Error {
    #[error("Bucket already exists: {bucket}")]
    BucketExist {
        bucket: String,
        #[source]
        cause: TransportError,
    },

    #[error("Bucket does not exist: {bucket}")]
    BucketNotExist { bucket: String },

    #[error("Object does not exist: {id}")]
    ObjectNotExist { id: S3ObjectId },

    #[error("Object key is not a file: {key}")]
    ObjectKeyIsNotFile { key: String },

    #[error("Object key prefix cannot be empty")]
    EmptyKeyPrefix,

    #[error("Object has no body: {id}")]
    EmptyBody { id: S3ObjectId },

    #[error("{operation} failed: {source}")]
    Internal {
        operation: Operation,
        #[source]
        source: TransportError,
    },
}

pub type S3Result<T> = Result<T, S3Error>;

impl S3Error {
    pub fn internal(operation: Operation, source: TransportError) -> Self {
        S3Error::Internal { operation, source }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            S3Error::BucketExist { .. } => "core.cloud.infra.s3.bucket_exist",
            S3Error::BucketNotExist { .. } => "core.cloud.infra.s3.bucket_not_exist",
            S3Error::ObjectNotExist { .. } => "core.cloud.infra.s3.object_not_exist",
            S3Error::ObjectKeyIsNotFile { .. } => "core.cloud.infra.s3.object_key_is_not_file",
            S3Error::EmptyKeyPrefix => "core.cloud.infra.s3.empty_object_prefix",
            S3Error::EmptyBody { .. } => "core.infra.s3.empty_body",
            S3Error::Internal { .. } => "core.cloud.infra.s3.internal",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            S3Error::ObjectNotExist { .. } | S3Error::BucketNotExist { .. } => {
                StatusCode::NOT_FOUND
            }
            S3Error::ObjectKeyIsNotFile { .. } | S3Error::EmptyKeyPrefix => {
                StatusCode::BAD_REQUEST
            }
            S3Error::BucketExist { .. } | S3Error::EmptyBody { .. } | S3Error::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The underlying transport failure, if the error came off the wire.
    pub fn transport(&self) -> Option<&TransportError> {
        match self {
            S3Error::BucketExist { cause, .. } => Some(cause),
            S3Error::Internal { source, .. } => Some(source),
            _ => None,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, S3Error::Internal { .. })
    }
}

impl From<S3Error> for StatusCode {
    fn from(err: S3Error) -> Self {
        err.status_code()
    }
}
