//! Lazy, single-pass cursors over paginated listings.
//!
//! Each `next_page` call issues exactly one request. A failed request is
//! reported once and ends the cursor; an empty page ends it too.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use tracing::debug;

use crate::{
    domain::{
        errors::S3Result,
        models::{ObjectMeta, ObjectToDelete, ObjectVersionMeta},
    },
    services::s3_client::S3,
};

/// A sequence of pages fetched on demand.
#[async_trait]
pub trait PageCursor: Send {
    type Item: Send + 'static;

    /// Fetch the next page; `None` once the listing is exhausted.
    async fn next_page(&mut self) -> Option<S3Result<Vec<Self::Item>>>;

    fn into_stream<'s>(self) -> BoxStream<'s, S3Result<Vec<Self::Item>>>
    where
        Self: Sized + 's,
    {
        futures::stream::unfold(self, |mut cursor| async move {
            cursor.next_page().await.map(|page| (page, cursor))
        })
        .boxed()
    }

    /// Drain every page into one vector; the first error wins.
    async fn collect_all(mut self) -> S3Result<Vec<Self::Item>>
    where
        Self: Sized,
    {
        let mut items = Vec::new();
        while let Some(page) = self.next_page().await {
            items.extend(page?);
        }
        Ok(items)
    }
}

/// Live objects under a prefix, `ListObjectsV2` page by page
pub struct ListObjectsCursor<'a> {
    s3: &'a S3,
    bucket: String,
    prefix: Option<String>,
    page_size: usize,
    continuation_token: Option<String>,
    pages_fetched: usize,
    exhausted: bool,
}

impl<'a> ListObjectsCursor<'a> {
    pub(crate) fn new(s3: &'a S3, bucket: &str, prefix: Option<&str>, page_size: usize) -> Self {
        Self {
            s3,
            bucket: bucket.to_string(),
            prefix: prefix.map(str::to_owned),
            page_size,
            continuation_token: None,
            pages_fetched: 0,
            exhausted: false,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn keys(self) -> ObjectKeys<'a> {
        ObjectKeys { cursor: self }
    }

    pub fn to_delete(self) -> ObjectsToDelete<'a> {
        ObjectsToDelete { cursor: self }
    }

    pub async fn keys_as_vec(self) -> S3Result<Vec<String>> {
        self.keys().collect_all().await
    }
}

#[async_trait]
impl<'a> PageCursor for ListObjectsCursor<'a> {
    type Item = ObjectMeta;

    async fn next_page(&mut self) -> Option<S3Result<Vec<ObjectMeta>>> {
        if self.exhausted {
            return None;
        }

        let page = match self
            .s3
            .list_objects_page(
                &self.bucket,
                self.prefix.as_deref(),
                self.page_size,
                self.continuation_token.take(),
            )
            .await
        {
            Ok(page) => page,
            Err(err) => {
                self.exhausted = true;
                return Some(Err(err));
            }
        };
        self.pages_fetched += 1;

        if page.contents.is_empty() {
            self.exhausted = true;
            return None;
        }

        // a truncated page without a token cannot be continued
        match page.next_continuation_token {
            Some(token) => self.continuation_token = Some(token),
            None => self.exhausted = true,
        }

        debug!(
            bucket = %self.bucket,
            page = self.pages_fetched,
            count = page.contents.len(),
            "listed objects"
        );
        Some(Ok(page.contents))
    }
}

/// Key-only view of a [`ListObjectsCursor`]
pub struct ObjectKeys<'a> {
    cursor: ListObjectsCursor<'a>,
}

#[async_trait]
impl<'a> PageCursor for ObjectKeys<'a> {
    type Item = String;

    async fn next_page(&mut self) -> Option<S3Result<Vec<String>>> {
        let page = self.cursor.next_page().await?;
        Some(page.map(|objects| objects.into_iter().map(|o| o.key).collect()))
    }
}

/// Batch-delete view of a [`ListObjectsCursor`]
pub struct ObjectsToDelete<'a> {
    cursor: ListObjectsCursor<'a>,
}

#[async_trait]
impl<'a> PageCursor for ObjectsToDelete<'a> {
    type Item = ObjectToDelete;

    async fn next_page(&mut self) -> Option<S3Result<Vec<ObjectToDelete>>> {
        let page = self.cursor.next_page().await?;
        Some(page.map(|objects| objects.iter().map(ObjectMeta::to_delete).collect()))
    }
}

/// Object versions (and optionally delete markers) under a prefix,
/// `ListObjectVersions` page by page
pub struct ListObjectVersionsCursor<'a> {
    s3: &'a S3,
    bucket: String,
    prefix: Option<String>,
    page_size: usize,
    key_marker: Option<String>,
    version_id_marker: Option<String>,
    include_delete_markers: bool,
    pages_fetched: usize,
    exhausted: bool,
}

impl<'a> ListObjectVersionsCursor<'a> {
    pub(crate) fn new(s3: &'a S3, bucket: &str, prefix: Option<&str>, page_size: usize) -> Self {
        Self {
            s3,
            bucket: bucket.to_string(),
            prefix: prefix.map(str::to_owned),
            page_size,
            key_marker: None,
            version_id_marker: None,
            include_delete_markers: false,
            pages_fetched: 0,
            exhausted: false,
        }
    }

    /// Select whether pages include delete markers (off by default).
    pub fn versions(mut self, include_delete_markers: bool) -> Self {
        self.include_delete_markers = include_delete_markers;
        self
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Batch-delete view; always includes delete markers.
    pub fn to_delete(self) -> VersionsToDelete<'a> {
        VersionsToDelete {
            cursor: self.versions(true),
            only_key: None,
        }
    }
}

#[async_trait]
impl<'a> PageCursor for ListObjectVersionsCursor<'a> {
    type Item = ObjectVersionMeta;

    async fn next_page(&mut self) -> Option<S3Result<Vec<ObjectVersionMeta>>> {
        if self.exhausted {
            return None;
        }

        let page = match self
            .s3
            .list_object_versions_page(
                &self.bucket,
                self.prefix.as_deref(),
                self.page_size,
                self.key_marker.take(),
                self.version_id_marker.take(),
            )
            .await
        {
            Ok(page) => page,
            Err(err) => {
                self.exhausted = true;
                return Some(Err(err));
            }
        };
        self.pages_fetched += 1;

        if page.versions.is_empty() && page.delete_markers.is_empty() {
            self.exhausted = true;
            return None;
        }

        if page.is_truncated == Some(true) && page.next_key_marker.is_some() {
            self.key_marker = page.next_key_marker;
            self.version_id_marker = page.next_version_id_marker;
        } else {
            self.exhausted = true;
        }

        let mut entries = page.versions;
        if self.include_delete_markers {
            entries.extend(page.delete_markers);
            // keys ascending, newest first within a key
            entries.sort_by(|a, b| {
                a.key
                    .cmp(&b.key)
                    .then_with(|| b.last_modified_at.cmp(&a.last_modified_at))
            });
        }

        debug!(
            bucket = %self.bucket,
            page = self.pages_fetched,
            count = entries.len(),
            "listed object versions"
        );
        Some(Ok(entries))
    }
}

/// Batch-delete view of a [`ListObjectVersionsCursor`]
pub struct VersionsToDelete<'a> {
    cursor: ListObjectVersionsCursor<'a>,
    only_key: Option<String>,
}

impl<'a> VersionsToDelete<'a> {
    /// Keep only entries whose key is exactly `key`. Pages left empty by the
    /// filter are skipped, not yielded.
    pub fn only_key(mut self, key: impl Into<String>) -> Self {
        self.only_key = Some(key.into());
        self
    }
}

#[async_trait]
impl<'a> PageCursor for VersionsToDelete<'a> {
    type Item = ObjectToDelete;

    async fn next_page(&mut self) -> Option<S3Result<Vec<ObjectToDelete>>> {
        loop {
            let versions = match self.cursor.next_page().await? {
                Ok(versions) => versions,
                Err(err) => return Some(Err(err)),
            };

            let entries: Vec<ObjectToDelete> = versions
                .iter()
                .filter(|v| self.only_key.as_deref().map_or(true, |key| v.key == key))
                .map(ObjectVersionMeta::to_delete)
                .collect();

            if !entries.is_empty() || self.only_key.is_none() {
                return Some(Ok(entries));
            }
        }
    }
}
