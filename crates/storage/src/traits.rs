//! Storage traits/interfaces for S3 operations.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::types::{ObjectContent, TransferProgress};

/// Callback trait for progress reporting.
pub trait ProgressCallback: Send + Sync {
    /// Called with progress updates.
    /// Returns false to cancel the operation.
    fn on_progress(&self, progress: &TransferProgress) -> bool;
}

/// A progress callback that wraps a closure.
pub struct FnProgress<F> {
    callback: F,
}

impl<F> ProgressCallback for FnProgress<F>
where
    F: Fn(&TransferProgress) -> bool + Send + Sync,
{
    fn on_progress(&self, progress: &TransferProgress) -> bool {
        (self.callback)(progress)
    }
}

/// Create a progress callback from a closure.
///
/// # Arguments
/// * `f` - Closure that receives progress and returns whether to continue
pub fn progress_fn<F>(f: F) -> FnProgress<F>
where
    F: Fn(&TransferProgress) -> bool + Send + Sync,
{
    FnProgress { callback: f }
}

/// Information about an S3 object from list operations.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    /// S3 object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Last modified timestamp (Unix epoch seconds).
    pub last_modified: Option<i64>,
    /// ETag (usually MD5 hash for non-multipart uploads).
    pub etag: Option<String>,
}

/// Low-level object store operations - implemented by each backend.
///
/// Retry, multipart and transport concerns belong to the implementation.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Upload bytes. Returns the ETag of the stored object.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> Result<String, StorageError>;

    /// Upload from file path (for large files, enables streaming).
    /// Returns the ETag of the stored object.
    async fn put_object_from_file(
        &self,
        bucket: &str,
        key: &str,
        file_path: &str,
        content_type: Option<&str>,
    ) -> Result<String, StorageError>;

    /// Download an object with its ETag.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectContent, StorageError>;

    /// List every object whose key starts with `prefix`, at any depth.
    /// An absent prefix yields an empty list.
    async fn list_objects(
        &self,
        bucket: &str,
        prefix: &str,
    ) -> Result<Vec<ObjectInfo>, StorageError>;

    /// Delete every object whose key starts with `prefix`.
    /// Returns the number of objects deleted.
    async fn delete_prefix(&self, bucket: &str, prefix: &str) -> Result<u64, StorageError>;
}
