use aws_sdk_s3::primitives::DateTime as SmithyDateTime;
use aws_sdk_s3::types::{
    BucketVersioningStatus as AwsVersioningStatus, DeleteMarkerEntry, Object, ObjectVersion,
};
use chrono::{DateTime, Utc};

use crate::domain::models::{BucketVersioningStatus, ObjectMeta, ObjectVersionMeta, StorageClass};

pub(super) fn to_chrono(value: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos())
}

pub(super) fn to_smithy(value: &DateTime<Utc>) -> SmithyDateTime {
    SmithyDateTime::from_secs_and_nanos(value.timestamp(), value.timestamp_subsec_nanos())
}

fn size(value: Option<i64>) -> u64 {
    value.and_then(|s| u64::try_from(s).ok()).unwrap_or(0)
}

pub(super) fn object_meta(object: &Object) -> Option<ObjectMeta> {
    Some(ObjectMeta {
        key: object.key()?.to_string(),
        last_modified_at: object
            .last_modified()
            .and_then(to_chrono)
            .unwrap_or_default(),
        storage_class: object
            .storage_class()
            .map(|c| StorageClass::from(c.as_str()))
            .unwrap_or_default(),
        size: size(object.size()),
        etag: object.e_tag().map(str::to_owned),
    })
}

pub(super) fn version_meta(version: &ObjectVersion) -> Option<ObjectVersionMeta> {
    Some(ObjectVersionMeta {
        key: version.key()?.to_string(),
        version_id: version.version_id()?.to_string(),
        last_modified_at: version
            .last_modified()
            .and_then(to_chrono)
            .unwrap_or_default(),
        storage_class: version
            .storage_class()
            .map(|c| StorageClass::from(c.as_str())),
        size: size(version.size()),
        is_latest: version.is_latest().unwrap_or(false),
        is_delete_marker: false,
    })
}

pub(super) fn delete_marker_meta(marker: &DeleteMarkerEntry) -> Option<ObjectVersionMeta> {
    Some(ObjectVersionMeta {
        key: marker.key()?.to_string(),
        version_id: marker.version_id()?.to_string(),
        last_modified_at: marker
            .last_modified()
            .and_then(to_chrono)
            .unwrap_or_default(),
        storage_class: None,
        size: 0,
        is_latest: marker.is_latest().unwrap_or(false),
        is_delete_marker: true,
    })
}

pub(super) fn versioning_status(status: Option<&AwsVersioningStatus>) -> BucketVersioningStatus {
    match status {
        Some(AwsVersioningStatus::Enabled) => BucketVersioningStatus::Enabled,
        Some(AwsVersioningStatus::Suspended) => BucketVersioningStatus::Suspended,
        _ => BucketVersioningStatus::Unversioned,
    }
}
