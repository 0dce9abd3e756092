use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

use crate::domain::errors::TransportError;

/// Convert an AWS SDK failure into the transport error the client layer maps.
///
/// Service and response errors keep the S3 error code and HTTP status; a
/// request that could not be built is a `Request` error; everything else
/// (timeouts, connection failures) is a `Dispatch` error.
pub fn transport_error<E>(err: SdkError<E>) -> TransportError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|r| r.status().as_u16());
    match &err {
        SdkError::ServiceError(_) | SdkError::ResponseError(_) => {
            let (code, message) = match err.as_service_error() {
                Some(service) => (
                    service.code().map(str::to_owned),
                    service.message().map(str::to_owned),
                ),
                None => (None, None),
            };
            TransportError::Service {
                code,
                status,
                message: message.unwrap_or_else(|| DisplayErrorContext(&err).to_string()),
            }
        }
        SdkError::ConstructionFailure(_) => TransportError::Request {
            message: DisplayErrorContext(&err).to_string(),
        },
        _ => TransportError::Dispatch {
            message: DisplayErrorContext(&err).to_string(),
        },
    }
}

/// Builder failures for request shapes (`Delete`, `ObjectIdentifier`, ...)
pub fn build_error(err: aws_sdk_s3::error::BuildError) -> TransportError {
    TransportError::Request {
        message: err.to_string(),
    }
}
