mod account_id;
mod object_id;

pub use account_id::AccountId;
pub use object_id::S3ObjectId;
