mod s3_backend;

pub use s3_backend::{
    GetObjectRequest, ListObjectVersionsPage, ListObjectVersionsRequest, ListObjectsPage,
    ListObjectsRequest, PutObjectRequest, RawDeleteObject, RawDeleteObjects, RawGetObject,
    RawPutObject, S3Backend, MAX_DELETE_BATCH,
};
