use tracing::{info, warn};

use crate::{
    domain::{
        errors::S3Result,
        models::{DeleteObjectError, DeleteObjectsOutput, ObjectToDelete},
    },
    services::{listing::PageCursor, s3_client::S3},
};

/// Outcome of one `DeleteObjects` request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteBatch {
    pub requested: usize,
    pub deleted: Vec<ObjectToDelete>,
    pub errors: Vec<DeleteObjectError>,
}

/// Drains a delete view page by page, one batch delete per page.
///
/// Stops at the first empty page or the first failed request. Batches
/// already sent stay deleted; rerunning picks up what is left. Per-key
/// errors inside a successful response are logged and counted but do not
/// stop the drain.
pub struct BulkDelete<'a, P> {
    s3: &'a S3,
    pages: P,
    output: DeleteObjectsOutput,
    finished: bool,
}

impl<'a, P> BulkDelete<'a, P>
where
    P: PageCursor<Item = ObjectToDelete>,
{
    pub fn new(s3: &'a S3, bucket: &str, prefix: Option<&str>, pages: P) -> Self {
        Self {
            s3,
            pages,
            output: DeleteObjectsOutput::new(bucket, prefix.map(str::to_owned)),
            finished: false,
        }
    }

    /// Totals so far
    pub fn output(&self) -> &DeleteObjectsOutput {
        &self.output
    }

    /// Fetch the next page and delete it. `None` once drained.
    pub async fn next_batch(&mut self) -> Option<S3Result<DeleteBatch>> {
        if self.finished {
            return None;
        }

        let objects = match self.pages.next_page().await {
            Some(Ok(objects)) if !objects.is_empty() => objects,
            Some(Err(err)) => {
                self.finished = true;
                return Some(Err(err));
            }
            _ => {
                self.finished = true;
                return None;
            }
        };

        let requested = objects.len();
        let raw = match self.s3.delete_batch(&self.output.bucket, objects).await {
            Ok(raw) => raw,
            Err(err) => {
                self.finished = true;
                return Some(Err(err));
            }
        };

        for error in &raw.errors {
            warn!(
                bucket = %self.output.bucket,
                key = %error.key,
                version_id = ?error.version_id,
                code = ?error.code,
                message = ?error.message,
                "object not deleted"
            );
        }

        self.output.batches += 1;
        self.output.deleted += raw.deleted.len();
        self.output.failed += raw.errors.len();

        Some(Ok(DeleteBatch {
            requested,
            deleted: raw.deleted,
            errors: raw.errors,
        }))
    }

    /// Drain everything, returning the totals or the first failure.
    pub async fn run(mut self) -> S3Result<DeleteObjectsOutput> {
        while let Some(batch) = self.next_batch().await {
            batch?;
        }

        info!(
            bucket = %self.output.bucket,
            prefix = ?self.output.prefix,
            deleted = self.output.deleted,
            failed = self.output.failed,
            batches = self.output.batches,
            "bulk delete finished"
        );
        Ok(self.output)
    }
}
