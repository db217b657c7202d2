//! Batch store and retrieval over an object-storage client.
//!
//! This crate binds a bucket and directory to one [`StorageClient`] and
//! exposes three operations on top of it:
//!
//! - **store** - Write one or more payloads concurrently, returning one tag
//!   per payload in input order, or failing as a whole
//! - **get** - Read a single object by key
//! - **get_all** - List a prefix, keep image objects (gif, jpg, jpeg, png),
//!   and read them concurrently in listing order
//!
//! Transport, retries and multipart uploads belong to the client. The
//! `s3-stash-storage-crt` crate provides the AWS SDK implementation; an
//! in-memory implementation lives here for tests and embedding.
//!
//! # Errors
//!
//! Every operation returns [`SessionError`]. Batch operations never return
//! partial results, and writes that already landed are not rolled back.

mod config;
mod error;
mod memory;
mod retrieve;
mod session;
mod store;
mod traits;
mod types;

pub use config::{
    SessionConfig, ENV_ACCESS_KEY, ENV_BUCKET_DIRECTORY, ENV_BUCKET_NAME, ENV_ENDPOINT_URL,
    ENV_FORCE_PATH_STYLE, ENV_REGION, ENV_SECRET_KEY, ENV_SESSION_TOKEN,
};
pub use error::{SessionError, StorageError};
pub use memory::MemoryStorageClient;
pub use retrieve::ListingDepth;
pub use session::{create_session, Session};
pub use traits::{progress_fn, FnProgress, ObjectInfo, ProgressCallback, StorageClient};
pub use types::{
    AwsCredentials, Namespace, ObjectContent, Payload, PayloadSource, StorageSettings,
    TransferProgress,
};
