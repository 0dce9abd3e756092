mod s3_errors;
mod transport_errors;
mod validation_errors;

pub use s3_errors::*;
pub use transport_errors::*;
pub use validation_errors::*;
