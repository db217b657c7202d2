//! AWS SDK S3 backend for s3-stash.
//!
//! This crate provides a `StorageClient` implementation using the AWS SDK for Rust,
//! and [`connect`] to open a session on it in one step.
//!
//! # Example
//!
//! ```ignore
//! use s3_stash_storage::{Payload, SessionConfig};
//! use s3_stash_storage_crt::connect;
//!
//! let config = SessionConfig::from_env()?;
//! let session = connect(config).await?;
//!
//! let tags = session.store(Payload::from_file("cat.png", "/tmp/cat.png")).await?;
//! let images = session.get_all(None).await?;
//! ```

mod client;
mod error;

pub use client::CrtStorageClient;
pub use error::CrtError;

use s3_stash_storage::{Session, SessionConfig, SessionError};

/// Open a session backed by S3.
///
/// # Arguments
/// * `config` - Bucket, directory and backend settings
///
/// # Errors
/// `InvalidArgument` if the bucket name is missing or the client cannot be
/// configured.
pub async fn connect(config: SessionConfig) -> Result<Session<CrtStorageClient>, SessionError> {
    config.validate()?;
    let client: CrtStorageClient = CrtStorageClient::new(config.settings.clone())
        .await
        .map_err(|e| SessionError::invalid_argument(e.to_string()))?;
    Session::new(config, client)
}
