//! Error types for storage operations.

use s3_stash_common::KeyError;
use thiserror::Error;

/// Errors reported by a storage backend.
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    /// Object not found in S3.
    #[error("Object not found: s3://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Bucket does not exist. Backends never create buckets implicitly.
    #[error("Bucket not found: {bucket}")]
    BucketNotFound { bucket: String },

    /// Access denied.
    #[error("Access denied to s3://{bucket}/{key}: {message}")]
    AccessDenied {
        bucket: String,
        key: String,
        message: String,
    },

    /// Network error.
    #[error("Network error: {message}")]
    NetworkError { message: String, retryable: bool },

    /// Local I/O error.
    #[error("I/O error for {path}: {message}")]
    IoError { path: String, message: String },

    /// Operation cancelled by user.
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl StorageError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            StorageError::NetworkError { retryable, .. } => *retryable,
            StorageError::NotFound { .. } => false,
            StorageError::BucketNotFound { .. } => false,
            StorageError::AccessDenied { .. } => false,
            StorageError::IoError { .. } => false,
            StorageError::Cancelled => false,
            StorageError::InvalidConfig { .. } => false,
            StorageError::Other { .. } => false,
        }
    }

    /// Check if the error means the object or its bucket is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::NotFound { .. } | StorageError::BucketNotFound { .. }
        )
    }
}

/// Errors surfaced by [`Session`](crate::Session) operations.
///
/// Batch operations are all-or-nothing: an error means no result was
/// produced, even if some backend writes already landed.
#[derive(Error, Debug, Clone)]
pub enum SessionError {
    /// Malformed or missing input, detected before any backend call.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A write in a store batch failed.
    #[error("Failed to store {key}")]
    StorageWrite {
        key: String,
        #[source]
        source: StorageError,
    },

    /// A read failed, including reads of missing objects.
    #[error("Failed to read {key}")]
    StorageRead {
        key: String,
        #[source]
        source: StorageError,
    },

    /// Listing a prefix failed. An empty listing is not an error.
    #[error("Failed to list {prefix}")]
    Listing {
        prefix: String,
        #[source]
        source: StorageError,
    },

    /// Deleting the objects under a prefix failed.
    #[error("Failed to delete objects under {prefix}")]
    Delete {
        prefix: String,
        #[source]
        source: StorageError,
    },
}

impl SessionError {
    /// Create an `InvalidArgument` error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        SessionError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Check if this is an input validation failure.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, SessionError::InvalidArgument { .. })
    }

    /// The backend error behind this failure, if any.
    pub fn storage_error(&self) -> Option<&StorageError> {
        match self {
            SessionError::InvalidArgument { .. } => None,
            SessionError::StorageWrite { source, .. }
            | SessionError::StorageRead { source, .. }
            | SessionError::Listing { source, .. }
            | SessionError::Delete { source, .. } => Some(source),
        }
    }
}

impl From<KeyError> for SessionError {
    fn from(err: KeyError) -> Self {
        SessionError::invalid_argument(err.to_string())
    }
}
